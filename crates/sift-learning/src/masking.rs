//! Masking of clearly-variable substrings.
//!
//! A line becomes a sequence of whitespace-separated tokens, each a run of
//! literal text and masked slots.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Kind of a masked slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKind {
    Number,
    Quoted,
    Path,
    Time,
}

impl SlotKind {
    pub fn placeholder(self) -> &'static str {
        match self {
            Self::Number => "<NUM>",
            Self::Quoted => "<STR>",
            Self::Path => "<PATH>",
            Self::Time => "<TIME>",
        }
    }

    /// Expression matching any value of this kind (no capture group).
    pub fn pattern(self) -> &'static str {
        match self {
            Self::Number => r"\d+(?:\.\d+)*",
            Self::Quoted => r#""[^"]*"|'[^'\s]+'"#,
            Self::Path => r"(?:[A-Za-z]:)?[\w.~-]*(?:/[\w.~-]*)+",
            Self::Time => r"\d{1,2}:\d{2}(?::\d{2})?",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Piece {
    Literal(String),
    Slot(SlotKind),
}

/// One whitespace-separated token after masking.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Token {
    pub pieces: Vec<Piece>,
}

impl Token {
    /// True when the token has no masked slot.
    pub fn is_literal(&self) -> bool {
        self.pieces.iter().all(|p| matches!(p, Piece::Literal(_)))
    }

    fn push_literal(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(Piece::Literal(last)) = self.pieces.last_mut() {
            last.push_str(text);
        } else {
            self.pieces.push(Piece::Literal(text.to_string()));
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for piece in &self.pieces {
            match piece {
                Piece::Literal(s) => f.write_str(s)?,
                Piece::Slot(kind) => f.write_str(kind.placeholder())?,
            }
        }
        Ok(())
    }
}

/// Alternatives are tried left to right: quotes, clock times, paths, numbers.
static VARIABLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        "(?P<quoted>{})|(?P<time>{})|(?P<path>{})|(?P<number>{})",
        SlotKind::Quoted.pattern(),
        SlotKind::Time.pattern(),
        SlotKind::Path.pattern(),
        SlotKind::Number.pattern(),
    ))
    .unwrap()
});

/// Append literal text, closing the current token at each whitespace run.
fn push_text(text: &str, tokens: &mut Vec<Token>, current: &mut Token) {
    let mut parts = text.split(char::is_whitespace).peekable();
    while let Some(part) = parts.next() {
        current.push_literal(part);
        if parts.peek().is_some() && !current.pieces.is_empty() {
            tokens.push(std::mem::take(current));
        }
    }
}

/// Mask a normalized line into tokens.
pub fn mask_line(line: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut current = Token::default();
    let mut cursor = 0;

    for caps in VARIABLE_RE.captures_iter(line) {
        let Some(m) = caps.get(0) else { continue };
        push_text(&line[cursor..m.start()], &mut tokens, &mut current);
        let kind = if caps.name("quoted").is_some() {
            SlotKind::Quoted
        } else if caps.name("time").is_some() {
            SlotKind::Time
        } else if caps.name("path").is_some() {
            SlotKind::Path
        } else {
            SlotKind::Number
        };
        current.pieces.push(Piece::Slot(kind));
        cursor = m.end();
    }
    push_text(&line[cursor..], &mut tokens, &mut current);
    if !current.pieces.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// The masked line as text, e.g. `Downloaded crate serde v<NUM>`.
pub fn skeleton(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(Token::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}
