//! Terminal escape stripping. Lines are matched and chunked as clean text.

/// Strip ANSI escape sequences, returning UTF-8 text (invalid bytes become
/// U+FFFD).
///
/// Handles CSI (`ESC [ ...`), OSC (`ESC ] ...` ended by BEL or `ESC \`),
/// two-byte escapes, and bare 8-bit CSI (`0x9B`). Carriage returns are
/// dropped. A `0x9B` inside a multi-byte UTF-8 character is text, not CSI.
pub fn strip_ansi(input: &[u8]) -> String {
    let mut out = Vec::with_capacity(input.len());
    let mut i = 0;
    // Continuation bytes still owed by the last UTF-8 lead byte.
    let mut owed = 0u8;

    while i < input.len() {
        let b = input[i];
        if owed > 0 && is_continuation(b) {
            owed -= 1;
            out.push(b);
            i += 1;
            continue;
        }
        owed = 0;
        match b {
            0x1B => {
                i += 1;
                if i >= input.len() {
                    break;
                }
                match input[i] {
                    b'[' => i = skip_csi(input, i + 1),
                    b']' => i = skip_osc(input, i + 1),
                    _ => i += 1,
                }
            }
            0x9B => i = skip_csi(input, i + 1),
            b'\r' => i += 1,
            b => {
                owed = continuations_after(b);
                out.push(b);
                i += 1;
            }
        }
    }

    String::from_utf8(out).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}

fn is_continuation(b: u8) -> bool {
    b & 0xC0 == 0x80
}

/// Number of continuation bytes a UTF-8 lead byte announces.
fn continuations_after(lead: u8) -> u8 {
    match lead {
        0xC0..=0xDF => 1,
        0xE0..=0xEF => 2,
        0xF0..=0xF7 => 3,
        _ => 0,
    }
}

/// Parameter and intermediate bytes, then one final byte.
fn skip_csi(input: &[u8], mut i: usize) -> usize {
    while i < input.len() && (0x20..=0x3F).contains(&input[i]) {
        i += 1;
    }
    if i < input.len() && (0x40..=0x7E).contains(&input[i]) {
        i += 1;
    }
    i
}

/// Everything up to and including BEL or `ESC \`.
fn skip_osc(input: &[u8], mut i: usize) -> usize {
    while i < input.len() {
        if input[i] == 0x07 {
            return i + 1;
        }
        if input[i] == 0x1B && input.get(i + 1) == Some(&b'\\') {
            return i + 2;
        }
        i += 1;
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_unchanged() {
        assert_eq!(strip_ansi("⏺ Bash(ls -lh)".as_bytes()), "⏺ Bash(ls -lh)");
    }

    #[test]
    fn strips_sgr_around_tool_marker() {
        let input = "\x1b[1m\x1b[36m⏺\x1b[0m Bash(ls -lh)".as_bytes();
        assert_eq!(strip_ansi(input), "⏺ Bash(ls -lh)");
    }

    #[test]
    fn strips_osc_title_with_bel_and_st() {
        assert_eq!(strip_ansi(b"\x1b]0;agent\x07Compiling"), "Compiling");
        assert_eq!(strip_ansi(b"\x1b]2;agent\x1b\\Compiling"), "Compiling");
    }

    #[test]
    fn strips_cursor_moves_and_bare_csi() {
        assert_eq!(strip_ansi(b"\x1b[2K\x1b[1Gdone"), "done");
        assert_eq!(strip_ansi(b"\x9b31mred\x9b0m"), "red");
    }

    #[test]
    fn multibyte_characters_containing_0x9b_are_kept() {
        // Û, ě and ✛ all carry 0x9B as a continuation byte.
        for text in ["Vytvořeno: ÛNDER ěmail", "✛ added", "混合 テキスト ☛"] {
            assert_eq!(strip_ansi(text.as_bytes()), text);
        }
        assert_eq!(strip_ansi("\x1b[1mÛ\x1b[0m".as_bytes()), "Û");
    }

    #[test]
    fn bare_csi_after_a_complete_character_is_still_stripped() {
        assert_eq!(strip_ansi("é\u{9b}".as_bytes()), "é\u{9b}");
        let mut input = "é".as_bytes().to_vec();
        input.extend_from_slice(b"\x9b1mx");
        assert_eq!(strip_ansi(&input), "éx");
    }

    #[test]
    fn drops_carriage_returns_and_truncated_escapes() {
        assert_eq!(strip_ansi(b"line\r"), "line");
        assert_eq!(strip_ansi(b"text\x1b"), "text");
        assert_eq!(strip_ansi(b"\x1b]0;never closed"), "");
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        assert_eq!(strip_ansi(b"ok \xff"), "ok \u{FFFD}");
    }
}
