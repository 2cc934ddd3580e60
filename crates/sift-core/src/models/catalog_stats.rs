use serde::{Deserialize, Serialize};

/// Aggregate counters over the catalog and the chunk store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogStats {
    pub total_patterns: u64,
    pub tested_patterns: u64,
    pub total_matches: u64,
    pub unknown_chunks: u64,
    pub analyzed_chunks: u64,
    pub unanalyzed_chunks: u64,
}

/// Chunk store counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkCounts {
    pub total: u64,
    pub analyzed: u64,
    pub unanalyzed: u64,
}
