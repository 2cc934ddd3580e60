use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::pattern::{PatternCategory, PatternId};

/// One pattern proposed (or re-used) by a learning run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposedPattern {
    pub pattern_id: PatternId,
    pub name: String,
    pub regex: String,
    pub category: PatternCategory,
    pub confidence: f64,
    pub group_size: usize,
    pub literal_ratio: f64,
    /// A few member lines, for review.
    pub examples: Vec<String>,
    /// True when an identical learned pattern already existed and the group
    /// was linked to it instead of registering a new one.
    pub reused_existing: bool,
}

/// Summary of one `analyze_unknowns` run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub chunks_read: usize,
    pub groups_found: usize,
    pub groups_qualified: usize,
    /// Chunks marked analyzed and linked to a pattern.
    pub chunks_resolved: usize,
    /// Chunks left unanalyzed for a later run.
    pub chunks_deferred: usize,
    pub persistence_failures: usize,
    pub proposed: Vec<ProposedPattern>,
}

impl LearningReport {
    pub fn empty(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            finished_at: started_at,
            duration_ms: 0,
            chunks_read: 0,
            groups_found: 0,
            groups_qualified: 0,
            chunks_resolved: 0,
            chunks_deferred: 0,
            persistence_failures: 0,
            proposed: Vec::new(),
        }
    }

    /// Patterns registered by this run (excludes re-used ones).
    pub fn newly_proposed(&self) -> impl Iterator<Item = &ProposedPattern> {
        self.proposed.iter().filter(|p| !p.reused_existing)
    }
}
