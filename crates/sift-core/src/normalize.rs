//! Text normalization shared by the extractor and the chunk store.

use crate::constants::MAX_CHUNK_TEXT_BYTES;

/// Trim surrounding whitespace and collapse inner whitespace runs to one space.
/// Output longer than [`MAX_CHUNK_TEXT_BYTES`] is cut at a char boundary.
pub fn normalize_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for word in raw.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    if out.len() > MAX_CHUNK_TEXT_BYTES {
        let mut end = MAX_CHUNK_TEXT_BYTES;
        while !out.is_char_boundary(end) {
            end -= 1;
        }
        out.truncate(end);
    }
    out
}

/// blake3 hex digest of already-normalized text.
pub fn content_hash(normalized: &str) -> String {
    blake3::hash(normalized.as_bytes()).to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_whitespace() {
        assert_eq!(normalize_text("  a \t b\n\n c  "), "a b c");
        assert_eq!(normalize_text("   "), "");
    }

    #[test]
    fn hash_is_stable_for_equal_normalized_text() {
        let a = content_hash(&normalize_text("Something   unexpected"));
        let b = content_hash(&normalize_text(" Something unexpected "));
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn truncates_on_char_boundary() {
        let long = "é".repeat(MAX_CHUNK_TEXT_BYTES);
        let out = normalize_text(&long);
        assert!(out.len() <= MAX_CHUNK_TEXT_BYTES);
        assert!(out.chars().all(|c| c == 'é'));
    }
}
