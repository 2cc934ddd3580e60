//! Match history rows and per-pattern counters.

use rusqlite::{params, Connection};

use sift_core::errors::SiftResult;
use sift_core::models::MatchRecord;

use crate::{format_ts, to_storage_err};

/// Append match rows and advance `match_count` / `last_matched` in one
/// transaction. Records whose pattern was removed meanwhile are skipped.
pub fn record_matches(conn: &Connection, records: &[MatchRecord]) -> SiftResult<usize> {
    if records.is_empty() {
        return Ok(0);
    }
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| to_storage_err(format!("record_matches begin: {e}")))?;

    let mut written = 0;
    {
        let mut bump = tx
            .prepare_cached(
                "UPDATE patterns
                 SET match_count = match_count + 1,
                     last_matched = MAX(COALESCE(last_matched, ''), ?2)
                 WHERE id = ?1",
            )
            .map_err(|e| to_storage_err(e.to_string()))?;
        let mut insert = tx
            .prepare_cached(
                "INSERT INTO pattern_matches
                    (pattern_id, pattern_name, session_id, matched_text, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .map_err(|e| to_storage_err(e.to_string()))?;

        for record in records {
            let ts = format_ts(&record.timestamp);
            let changed = bump
                .execute(params![record.pattern_id, ts])
                .map_err(|e| to_storage_err(e.to_string()))?;
            if changed == 0 {
                continue;
            }
            insert
                .execute(params![
                    record.pattern_id,
                    record.pattern_name,
                    record.session_id,
                    record.matched_text,
                    ts,
                ])
                .map_err(|e| to_storage_err(e.to_string()))?;
            written += 1;
        }
    }

    tx.commit()
        .map_err(|e| to_storage_err(format!("record_matches commit: {e}")))?;
    Ok(written)
}

pub fn count_matches(conn: &Connection) -> SiftResult<u64> {
    conn.query_row("SELECT COUNT(*) FROM pattern_matches", [], |row| {
        row.get::<_, i64>(0)
    })
    .map(|n| n as u64)
    .map_err(|e| to_storage_err(e.to_string()))
}

pub fn count_matches_for_session(conn: &Connection, session_id: &str) -> SiftResult<u64> {
    conn.query_row(
        "SELECT COUNT(*) FROM pattern_matches WHERE session_id = ?1",
        params![session_id],
        |row| row.get::<_, i64>(0),
    )
    .map(|n| n as u64)
    .map_err(|e| to_storage_err(e.to_string()))
}
