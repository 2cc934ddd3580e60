use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::pattern::PatternId;

/// One row of match history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub pattern_id: PatternId,
    pub pattern_name: String,
    pub session_id: String,
    pub matched_text: String,
    pub timestamp: DateTime<Utc>,
}
