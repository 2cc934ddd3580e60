//! Versioned schema migrations. Each version runs once, in order, inside its
//! own transaction, and is recorded in `schema_version`.

mod v001_patterns;
mod v002_unknown_chunks;
mod v003_pattern_matches;

use rusqlite::{params, Connection};
use tracing::info;

use sift_core::errors::{SiftError, SiftResult, StorageError};

use crate::to_storage_err;

type MigrationFn = fn(&Connection) -> SiftResult<()>;

const MIGRATIONS: [(u32, &str, MigrationFn); 3] = [
    (1, "patterns", v001_patterns::migrate),
    (2, "unknown_chunks", v002_unknown_chunks::migrate),
    (3, "pattern_matches", v003_pattern_matches::migrate),
];

/// Latest schema version.
pub const LATEST_VERSION: u32 = 3;

/// Bring the database up to [`LATEST_VERSION`].
pub fn run_migrations(conn: &Connection) -> SiftResult<u32> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version    INTEGER PRIMARY KEY,
            name       TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;

    let current = current_version(conn)?;
    for (version, name, migrate) in MIGRATIONS {
        if version <= current {
            continue;
        }
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| to_storage_err(e.to_string()))?;
        let applied = migrate(&tx).and_then(|()| {
            tx.execute(
                "INSERT INTO schema_version (version, name) VALUES (?1, ?2)",
                params![version, name],
            )
            .map_err(|e| to_storage_err(e.to_string()))
        });
        match applied {
            Ok(_) => tx.commit().map_err(|e| to_storage_err(e.to_string()))?,
            Err(e) => {
                let _ = tx.rollback();
                return Err(SiftError::StorageError(StorageError::MigrationFailed {
                    version,
                    reason: e.to_string(),
                }));
            }
        }
        info!(version, name, "applied migration");
    }
    Ok(LATEST_VERSION)
}

/// Highest applied version, 0 for a fresh database.
pub fn current_version(conn: &Connection) -> SiftResult<u32> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .map_err(|e| to_storage_err(e.to_string()))
}
