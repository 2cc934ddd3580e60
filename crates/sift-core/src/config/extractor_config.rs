use serde::{Deserialize, Serialize};

use super::defaults;

/// Per-session stream extractor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Strip terminal escape sequences before matching.
    pub strip_ansi: bool,
    /// The chunk-in-progress is flushed early once it holds this many lines.
    pub max_pending_lines: usize,
    /// Size of the per-session event ring buffer.
    pub event_history: usize,
    /// Size of the per-session auto-confirm decision ring buffer.
    pub decision_history: usize,
    /// Capacity of the per-session event broadcast channel.
    pub broadcast_capacity: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            strip_ansi: defaults::DEFAULT_STRIP_ANSI,
            max_pending_lines: defaults::DEFAULT_MAX_PENDING_LINES,
            event_history: defaults::DEFAULT_EVENT_HISTORY,
            decision_history: defaults::DEFAULT_DECISION_HISTORY,
            broadcast_capacity: defaults::DEFAULT_BROADCAST_CAPACITY,
        }
    }
}
