//! v002: unknown_chunks. One row per (session, normalized text).

use rusqlite::Connection;

use sift_core::errors::SiftResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> SiftResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS unknown_chunks (
            id               INTEGER PRIMARY KEY AUTOINCREMENT,
            session_id       TEXT NOT NULL,
            content_hash     TEXT NOT NULL,
            text             TEXT NOT NULL,
            context_before   TEXT,
            first_seen       TEXT NOT NULL,
            last_seen        TEXT NOT NULL,
            occurrence_count INTEGER NOT NULL DEFAULT 1,
            analyzed         INTEGER NOT NULL DEFAULT 0,
            proposed_pattern INTEGER REFERENCES patterns(id) ON DELETE SET NULL,
            UNIQUE (session_id, content_hash)
        );

        CREATE INDEX IF NOT EXISTS idx_chunks_unanalyzed
            ON unknown_chunks(analyzed, first_seen, id);
        CREATE INDEX IF NOT EXISTS idx_chunks_pattern ON unknown_chunks(proposed_pattern);
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
