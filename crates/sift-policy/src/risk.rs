//! Default risk levels for tool operations named in a prompt.

use sift_core::event::Captures;
use sift_core::pattern::{Pattern, RiskLevel};

/// Capture group names inspected for an operation name, in order.
pub const OPERATION_CAPTURES: [&str; 2] = ["tool", "operation"];

const LOW: &[&str] = &["read", "grep", "glob", "list", "ls", "search", "view"];
const MEDIUM: &[&str] = &["edit", "patch", "multiedit", "accept_edits", "update"];
const HIGH: &[&str] = &["bash", "write", "execute", "exec", "delete", "remove", "run"];

/// Map an operation name to its default risk. Case-insensitive; `None` for
/// names the table does not know.
pub fn classify_operation(name: &str) -> Option<RiskLevel> {
    let name = name.trim().to_ascii_lowercase();
    if HIGH.contains(&name.as_str()) {
        Some(RiskLevel::High)
    } else if MEDIUM.contains(&name.as_str()) {
        Some(RiskLevel::Medium)
    } else if LOW.contains(&name.as_str()) {
        Some(RiskLevel::Low)
    } else {
        None
    }
}

/// Risk an event starts with before the decision runs.
///
/// The pattern's `risk_level` metadata wins. Otherwise the first capture in
/// [`OPERATION_CAPTURES`] with a known operation decides. Otherwise `Low`.
pub fn initial_risk(pattern: &Pattern, captures: &Captures) -> RiskLevel {
    if let Some(level) = pattern.metadata.risk_level {
        return level;
    }
    OPERATION_CAPTURES
        .iter()
        .filter_map(|key| captures.get(*key))
        .find_map(|value| classify_operation(value))
        .unwrap_or_default()
}
