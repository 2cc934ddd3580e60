//! StorageEngine: owns the ConnectionPool, runs migrations at open, and
//! implements IPatternStorage + IChunkStorage.

use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::info;

use sift_core::chunk::{Chunk, ChunkId};
use sift_core::config::StorageConfig;
use sift_core::errors::SiftResult;
use sift_core::models::{ChunkCounts, MatchRecord};
use sift_core::pattern::{Pattern, PatternId};
use sift_core::traits::{IChunkStorage, IPatternStorage};

use crate::migrations;
use crate::pool::ConnectionPool;
use crate::queries::{chunk_ops, match_ops, pattern_ops};

/// The storage engine shared by the catalog, every extractor, and the
/// learning worker.
pub struct StorageEngine {
    pool: ConnectionPool,
}

impl StorageEngine {
    /// Open (or create) a file-backed database.
    pub fn open(path: &Path, read_pool_size: usize) -> SiftResult<Self> {
        let pool = ConnectionPool::open(path, read_pool_size)?;
        let engine = Self { pool };
        engine.initialize()?;
        info!(path = %path.display(), "storage opened");
        Ok(engine)
    }

    /// Open a private in-memory database. Reads go through the writer.
    pub fn open_in_memory() -> SiftResult<Self> {
        let pool = ConnectionPool::open_in_memory()?;
        let engine = Self { pool };
        engine.initialize()?;
        Ok(engine)
    }

    pub fn from_config(config: &StorageConfig) -> SiftResult<Self> {
        if config.is_in_memory() {
            Self::open_in_memory()
        } else {
            Self::open(Path::new(&config.db_path), config.read_pool_size)
        }
    }

    fn initialize(&self) -> SiftResult<()> {
        self.pool.writer.with_conn_sync(|conn| {
            migrations::run_migrations(conn)?;
            Ok(())
        })
    }

    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    /// Per-session match history count.
    pub fn count_matches_for_session(&self, session_id: &str) -> SiftResult<u64> {
        self.with_reader(|conn| match_ops::count_matches_for_session(conn, session_id))
    }

    /// Read on the pool when there is one, otherwise on the writer.
    fn with_reader<F, T>(&self, f: F) -> SiftResult<T>
    where
        F: FnOnce(&rusqlite::Connection) -> SiftResult<T>,
    {
        match &self.pool.readers {
            Some(readers) => readers.with_conn(f),
            None => self.pool.writer.with_conn_sync(f),
        }
    }

    fn with_writer<F, T>(&self, f: F) -> SiftResult<T>
    where
        F: FnOnce(&rusqlite::Connection) -> SiftResult<T>,
    {
        self.pool.writer.with_conn_sync(f)
    }
}

impl IPatternStorage for StorageEngine {
    fn insert_pattern(&self, pattern: &Pattern) -> SiftResult<PatternId> {
        self.with_writer(|conn| pattern_ops::insert_pattern(conn, pattern))
    }

    fn get_pattern(&self, id: PatternId) -> SiftResult<Option<Pattern>> {
        self.with_reader(|conn| pattern_ops::get_pattern(conn, id))
    }

    fn get_pattern_by_name(&self, name: &str) -> SiftResult<Option<Pattern>> {
        self.with_reader(|conn| pattern_ops::get_pattern_by_name(conn, name))
    }

    fn list_patterns(&self) -> SiftResult<Vec<Pattern>> {
        self.with_reader(pattern_ops::list_patterns)
    }

    fn delete_pattern(&self, name: &str) -> SiftResult<bool> {
        self.with_writer(|conn| pattern_ops::delete_pattern(conn, name))
    }

    fn upsert_patterns(&self, patterns: &[Pattern]) -> SiftResult<Vec<PatternId>> {
        self.with_writer(|conn| pattern_ops::upsert_patterns(conn, patterns))
    }

    fn mark_pattern_tested(&self, id: PatternId, success_rate: f64) -> SiftResult<bool> {
        self.with_writer(|conn| pattern_ops::mark_tested(conn, id, success_rate))
    }

    fn record_matches(&self, records: &[MatchRecord]) -> SiftResult<usize> {
        self.with_writer(|conn| match_ops::record_matches(conn, records))
    }

    fn count_matches(&self) -> SiftResult<u64> {
        self.with_reader(match_ops::count_matches)
    }

    fn pattern_counts(&self) -> SiftResult<(u64, u64)> {
        self.with_reader(pattern_ops::pattern_counts)
    }
}

impl IChunkStorage for StorageEngine {
    fn record_unmatched(
        &self,
        session_id: &str,
        text: &str,
        context_before: Option<&str>,
        at: DateTime<Utc>,
    ) -> SiftResult<Chunk> {
        self.with_writer(|conn| {
            chunk_ops::record_unmatched(conn, session_id, text, context_before, at)
        })
    }

    fn list_unanalyzed(&self, limit: usize) -> SiftResult<Vec<Chunk>> {
        self.with_reader(|conn| chunk_ops::list_unanalyzed(conn, limit))
    }

    fn list_unanalyzed_after(&self, after: ChunkId, limit: usize) -> SiftResult<Vec<Chunk>> {
        self.with_reader(|conn| chunk_ops::list_unanalyzed_after(conn, after, limit))
    }

    fn mark_analyzed(&self, id: ChunkId, proposed_pattern: Option<PatternId>) -> SiftResult<()> {
        self.with_writer(|conn| chunk_ops::mark_analyzed(conn, id, proposed_pattern))
    }

    fn mark_analyzed_batch(
        &self,
        ids: &[ChunkId],
        proposed_pattern: Option<PatternId>,
    ) -> SiftResult<usize> {
        self.with_writer(|conn| chunk_ops::mark_analyzed_batch(conn, ids, proposed_pattern))
    }

    fn get_chunk(&self, id: ChunkId) -> SiftResult<Option<Chunk>> {
        self.with_reader(|conn| chunk_ops::get_chunk(conn, id))
    }

    fn list_chunks_for_session(&self, session_id: &str) -> SiftResult<Vec<Chunk>> {
        self.with_reader(|conn| chunk_ops::list_for_session(conn, session_id))
    }

    fn chunk_counts(&self) -> SiftResult<ChunkCounts> {
        self.with_reader(chunk_ops::chunk_counts)
    }
}
