use chrono::{DateTime, Utc};

use crate::chunk::{Chunk, ChunkId};
use crate::errors::SiftResult;
use crate::models::ChunkCounts;
use crate::pattern::PatternId;

/// Durable, deduplicated store of unmatched lines.
///
/// The dedup key is `(session_id, content_hash(normalize_text(text)))`.
/// Nothing here deletes chunks.
pub trait IChunkStorage: Send + Sync {
    /// Create the chunk or bump its occurrence count and `last_seen`.
    /// A fresh chunk comes back with `occurrence_count == 1`.
    fn record_unmatched(
        &self,
        session_id: &str,
        text: &str,
        context_before: Option<&str>,
        at: DateTime<Utc>,
    ) -> SiftResult<Chunk>;

    /// Oldest first (`first_seen`, then id).
    fn list_unanalyzed(&self, limit: usize) -> SiftResult<Vec<Chunk>>;

    /// Unanalyzed chunks with `id > after`, in id order.
    fn list_unanalyzed_after(&self, after: ChunkId, limit: usize) -> SiftResult<Vec<Chunk>>;

    /// Fails with `ChunkNotFound` for an unknown id.
    fn mark_analyzed(&self, id: ChunkId, proposed_pattern: Option<PatternId>) -> SiftResult<()>;

    /// Marks a whole group in one transaction. Unknown ids are ignored;
    /// returns the number of rows updated.
    fn mark_analyzed_batch(
        &self,
        ids: &[ChunkId],
        proposed_pattern: Option<PatternId>,
    ) -> SiftResult<usize>;

    fn get_chunk(&self, id: ChunkId) -> SiftResult<Option<Chunk>>;
    fn list_chunks_for_session(&self, session_id: &str) -> SiftResult<Vec<Chunk>>;
    fn chunk_counts(&self) -> SiftResult<ChunkCounts>;
}
