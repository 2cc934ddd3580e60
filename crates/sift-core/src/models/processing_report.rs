use serde::{Deserialize, Serialize};

use super::CatalogStats;

/// Session-scoped counters of one extractor run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessingReport {
    pub session_id: String,
    pub lines_read: u64,
    pub lines_matched: u64,
    /// `lines_matched / lines_read`, 0 when nothing was read.
    pub match_rate: f64,
    pub events_emitted: u64,
    /// Unmatched lines written to the chunk store.
    pub chunks_recorded: u64,
    /// Distinct chunks this session created (first sightings).
    pub chunks_created: u64,
    pub chunk_write_failures: u64,
    pub skipped_patterns: Vec<String>,
    pub auto_confirmed: u64,
    pub escalated: u64,
    /// Catalog-wide aggregates at the time the report was taken.
    pub catalog: CatalogStats,
}

impl ProcessingReport {
    pub fn compute_match_rate(lines_matched: u64, lines_read: u64) -> f64 {
        if lines_read == 0 {
            0.0
        } else {
            lines_matched as f64 / lines_read as f64
        }
    }
}
