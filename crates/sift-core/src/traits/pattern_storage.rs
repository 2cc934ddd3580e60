use crate::errors::SiftResult;
use crate::models::MatchRecord;
use crate::pattern::{Pattern, PatternId};

/// Durable pattern catalog + match history.
pub trait IPatternStorage: Send + Sync {
    // --- CRUD ---
    /// Insert a new pattern, returning its row id. Fails on a duplicate name.
    fn insert_pattern(&self, pattern: &Pattern) -> SiftResult<PatternId>;
    fn get_pattern(&self, id: PatternId) -> SiftResult<Option<Pattern>>;
    fn get_pattern_by_name(&self, name: &str) -> SiftResult<Option<Pattern>>;
    /// All patterns ordered by id.
    fn list_patterns(&self) -> SiftResult<Vec<Pattern>>;
    /// Returns false when no pattern has that name.
    fn delete_pattern(&self, name: &str) -> SiftResult<bool>;

    // --- Bulk ---
    /// Insert-or-update by name in a single transaction. Match counters and
    /// creation time of existing rows are kept.
    fn upsert_patterns(&self, patterns: &[Pattern]) -> SiftResult<Vec<PatternId>>;

    // --- Trust ---
    /// Returns false when no pattern has that id.
    fn mark_pattern_tested(&self, id: PatternId, success_rate: f64) -> SiftResult<bool>;

    // --- Match history ---
    /// Append match rows and advance `match_count` / `last_matched`.
    /// Rows for patterns that no longer exist are skipped.
    fn record_matches(&self, records: &[MatchRecord]) -> SiftResult<usize>;
    fn count_matches(&self) -> SiftResult<u64>;

    // --- Aggregation ---
    /// `(total, tested)`.
    fn pattern_counts(&self) -> SiftResult<(u64, u64)>;
}
