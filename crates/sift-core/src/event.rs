use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::pattern::{PatternCategory, PatternId, RiskLevel};

/// Capture groups of a match. Named groups are keyed by name, unnamed ones
/// by their 1-based position ("1", "2", ...).
pub type Captures = BTreeMap<String, String>;

/// Why the auto-confirm decision came out the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    /// The event is neither a confirmation prompt nor marked actionable.
    NotApplicable,
    Approved,
    Untested,
    NotMarkedSafe,
    BelowThreshold,
}

impl DecisionReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotApplicable => "not_applicable",
            Self::Approved => "approved",
            Self::Untested => "untested",
            Self::NotMarkedSafe => "not_marked_safe",
            Self::BelowThreshold => "below_threshold",
        }
    }
}

impl fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event metadata. `auto_confirm` and `risk_level` are always present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventMetadata {
    pub auto_confirm: bool,
    pub risk_level: RiskLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision: Option<DecisionReason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_worker: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Structured output of a successful match. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionEvent {
    pub id: String,
    pub session_id: String,
    /// Category of the matched pattern.
    pub event_type: PatternCategory,
    pub pattern_id: PatternId,
    pub pattern_name: String,
    pub captures: Captures,
    pub metadata: EventMetadata,
    /// The normalized line that matched.
    pub line: String,
    pub timestamp: DateTime<Utc>,
}

impl ExtractionEvent {
    /// Equality ignoring the generated id and the timestamp.
    pub fn same_content(&self, other: &Self) -> bool {
        self.session_id == other.session_id
            && self.event_type == other.event_type
            && self.pattern_id == other.pattern_id
            && self.pattern_name == other.pattern_name
            && self.captures == other.captures
            && self.metadata == other.metadata
            && self.line == other.line
    }
}

/// Generate a fresh event id.
pub fn new_event_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
