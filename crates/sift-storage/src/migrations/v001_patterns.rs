//! v001: patterns.

use rusqlite::Connection;

use sift_core::errors::SiftResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> SiftResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS patterns (
            id                INTEGER PRIMARY KEY AUTOINCREMENT,
            name              TEXT NOT NULL UNIQUE,
            regex             TEXT NOT NULL,
            category          TEXT NOT NULL,
            confidence        REAL NOT NULL DEFAULT 0.5
                              CHECK (confidence >= 0.0 AND confidence <= 1.0),
            action            TEXT,
            target_worker     TEXT,
            tested            INTEGER NOT NULL DEFAULT 0,
            test_success_rate REAL NOT NULL DEFAULT 0.0
                              CHECK (test_success_rate >= 0.0 AND test_success_rate <= 1.0),
            proposed_by       TEXT NOT NULL DEFAULT 'manual',
            metadata          TEXT NOT NULL DEFAULT '{}',
            match_count       INTEGER NOT NULL DEFAULT 0,
            created_at        TEXT NOT NULL,
            last_matched      TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_patterns_category ON patterns(category);
        CREATE INDEX IF NOT EXISTS idx_patterns_tested ON patterns(tested);
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
