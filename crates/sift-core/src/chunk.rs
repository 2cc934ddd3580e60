use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::pattern::PatternId;

/// Row id of a chunk. The logical identity is `(session_id, content_hash)`.
pub type ChunkId = i64;

/// A normalized line of output no pattern explained at the time it was seen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub session_id: String,
    /// blake3 hex digest of `text`.
    pub content_hash: String,
    /// Normalized text.
    pub text: String,
    /// The unmatched line that preceded this one in the same fragment.
    pub context_before: Option<String>,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub occurrence_count: u64,
    pub analyzed: bool,
    pub proposed_pattern: Option<PatternId>,
}
