//! # sift-storage
//!
//! SQLite persistence for sift: one serialized write connection, a pool of
//! read connections, versioned migrations, and raw queries for the pattern
//! catalog, the chunk store, and match history.

pub mod batch;
pub mod engine;
pub mod migrations;
pub mod pool;
pub mod queries;

pub use batch::{MatchWriter, MatchWriterStats};
pub use engine::StorageEngine;

use sift_core::errors::{SiftError, StorageError};

/// Wrap a driver error message as a storage error.
pub fn to_storage_err(message: String) -> SiftError {
    SiftError::StorageError(StorageError::SqliteError { message })
}

/// Timestamp format used in every TEXT time column. Fixed width, so text
/// ordering equals time ordering.
pub(crate) fn format_ts(ts: &chrono::DateTime<chrono::Utc>) -> String {
    ts.to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

pub(crate) fn parse_ts(s: &str) -> sift_core::SiftResult<chrono::DateTime<chrono::Utc>> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .map_err(|e| to_storage_err(format!("parse datetime '{s}': {e}")))
}
