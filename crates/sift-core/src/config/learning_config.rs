use serde::{Deserialize, Serialize};

use super::defaults;

/// Learning worker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningConfig {
    /// Gates the scheduled learning runs.
    pub enable_training: bool,
    pub interval_secs: u64,
    /// Chunks pulled per scheduled run.
    pub batch_limit: usize,
    /// Smallest group that can produce a proposal.
    pub min_group_size: usize,
    /// Smallest share of plain literal tokens in a cluster template.
    pub min_literal_ratio: f64,
    /// Attempts per pattern/chunk write before deferring to the next run.
    pub max_write_attempts: u32,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            enable_training: defaults::DEFAULT_ENABLE_TRAINING,
            interval_secs: defaults::DEFAULT_LEARNING_INTERVAL_SECS,
            batch_limit: defaults::DEFAULT_LEARNING_BATCH_LIMIT,
            min_group_size: defaults::DEFAULT_MIN_GROUP_SIZE,
            min_literal_ratio: defaults::DEFAULT_MIN_LITERAL_RATIO,
            max_write_attempts: defaults::DEFAULT_MAX_WRITE_ATTEMPTS,
        }
    }
}
