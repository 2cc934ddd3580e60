//! From a cluster template to a catalog entry: expression, name, category,
//! and routing hints.

use sift_core::pattern::PatternCategory;

use crate::clustering::TemplateToken;
use crate::masking::Piece;

/// Expression for a wildcard position.
const WILDCARD: &str = r"(\S+)";
const TOKEN_SEPARATOR: &str = r"\s+";

/// Anchored expression with one positional capture group per variable part.
pub fn derive_regex(template: &[TemplateToken]) -> String {
    let body: Vec<String> = template
        .iter()
        .map(|t| match t {
            TemplateToken::Wildcard => WILDCARD.to_string(),
            TemplateToken::Fixed(token) => token
                .pieces
                .iter()
                .map(|p| match p {
                    Piece::Literal(text) => regex::escape(text),
                    Piece::Slot(kind) => format!("({})", kind.pattern()),
                })
                .collect(),
        })
        .collect();
    format!("^{}$", body.join(TOKEN_SEPARATOR))
}

/// Human-readable text of the template, wildcards shown as `*`.
pub fn template_text(template: &[TemplateToken]) -> String {
    template
        .iter()
        .map(|t| match t {
            TemplateToken::Wildcard => "*".to_string(),
            TemplateToken::Fixed(token) => token.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// `learned_<first significant word>_<8 hex of the expression hash>`.
/// Equal expressions always get equal names.
pub fn learned_name(template: &[TemplateToken], regex: &str) -> String {
    let word = template
        .iter()
        .find_map(|t| match t {
            TemplateToken::Fixed(token) if token.is_literal() => {
                let cleaned: String = token
                    .to_string()
                    .chars()
                    .filter(|c| c.is_ascii_alphanumeric())
                    .map(|c| c.to_ascii_lowercase())
                    .take(24)
                    .collect();
                cleaned
                    .chars()
                    .any(|c| c.is_ascii_alphabetic())
                    .then_some(cleaned)
            }
            _ => None,
        })
        .unwrap_or_else(|| "pattern".to_string());
    let hash = blake3::hash(regex.as_bytes()).to_hex().to_string();
    format!("learned_{word}_{}", &hash[..8])
}

/// Keyword heuristics over the template text.
pub fn categorize(text: &str) -> PatternCategory {
    let lower = text.to_lowercase();
    let has = |needles: &[&str]| needles.iter().any(|n| lower.contains(n));

    if has(&["do you want", "proceed?", "(y/n)", "[y/n]", "allow "]) {
        PatternCategory::ConfirmationPrompt
    } else if has(&["error", "failed", "failure", "panic", "exception"]) {
        PatternCategory::Error
    } else if has(&["⏺", "bash(", "edit(", "bash ", "edit "]) {
        PatternCategory::ToolUse
    } else if has(&["thinking", "processing"]) {
        PatternCategory::StateChange
    } else if has(&["✓", "completed"]) {
        PatternCategory::StateInfo
    } else {
        PatternCategory::Other
    }
}

/// Default `(action, target_worker)` for a category.
pub fn default_routing(category: PatternCategory) -> (&'static str, &'static str) {
    match category {
        PatternCategory::Error => ("log_error", "error_handler"),
        PatternCategory::ToolUse => ("dispatch_tool", "tool_executor"),
        PatternCategory::StateChange => ("update_state", "state_tracker"),
        PatternCategory::ConfirmationPrompt => ("escalate", "session_supervisor"),
        PatternCategory::StateInfo | PatternCategory::Other => ("log", "general_logger"),
    }
}
