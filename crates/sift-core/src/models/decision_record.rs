use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event::DecisionReason;
use crate::pattern::{PatternId, RiskLevel};

/// An auto-confirm decision as served to the session supervisor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub event_id: String,
    pub session_id: String,
    pub pattern_id: PatternId,
    pub pattern_name: String,
    pub line: String,
    pub auto_confirm: bool,
    pub risk_level: RiskLevel,
    pub reason: DecisionReason,
    pub timestamp: DateTime<Utc>,
}
