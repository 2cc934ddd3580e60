//! v003: pattern_matches (match history).

use rusqlite::Connection;

use sift_core::errors::SiftResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> SiftResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS pattern_matches (
            id           INTEGER PRIMARY KEY AUTOINCREMENT,
            pattern_id   INTEGER NOT NULL REFERENCES patterns(id) ON DELETE CASCADE,
            pattern_name TEXT NOT NULL,
            session_id   TEXT NOT NULL,
            matched_text TEXT NOT NULL,
            timestamp    TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_matches_pattern ON pattern_matches(pattern_id);
        CREATE INDEX IF NOT EXISTS idx_matches_session ON pattern_matches(session_id, timestamp);
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
