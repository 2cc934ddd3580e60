//! Record, list, and mark operations for unknown_chunks.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use sift_core::chunk::{Chunk, ChunkId};
use sift_core::errors::{SiftError, SiftResult};
use sift_core::models::ChunkCounts;
use sift_core::normalize::{content_hash, normalize_text};
use sift_core::pattern::PatternId;

use crate::{format_ts, parse_ts, to_storage_err};

const CHUNK_COLUMNS: &str = "id, session_id, content_hash, text, context_before, first_seen,
     last_seen, occurrence_count, analyzed, proposed_pattern";

/// Create the chunk for `(session_id, normalized text)` or bump its count.
/// The first recorded context is kept.
pub fn record_unmatched(
    conn: &Connection,
    session_id: &str,
    text: &str,
    context_before: Option<&str>,
    at: DateTime<Utc>,
) -> SiftResult<Chunk> {
    let normalized = normalize_text(text);
    let hash = content_hash(&normalized);
    let context = context_before
        .map(normalize_text)
        .filter(|c| !c.is_empty());
    let ts = format_ts(&at);

    conn.execute(
        "INSERT INTO unknown_chunks (
            session_id, content_hash, text, context_before, first_seen, last_seen
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?5)
        ON CONFLICT(session_id, content_hash) DO UPDATE SET
            occurrence_count = occurrence_count + 1,
            last_seen = MAX(last_seen, excluded.last_seen),
            context_before = COALESCE(context_before, excluded.context_before)",
        params![session_id, hash, normalized, context, ts],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;

    let sql = format!(
        "SELECT {CHUNK_COLUMNS} FROM unknown_chunks WHERE session_id = ?1 AND content_hash = ?2"
    );
    conn.query_row(&sql, params![session_id, hash], |row| Ok(row_to_chunk(row)))
        .map_err(|e| to_storage_err(e.to_string()))?
}

/// Unanalyzed chunks, oldest first.
pub fn list_unanalyzed(conn: &Connection, limit: usize) -> SiftResult<Vec<Chunk>> {
    let sql = format!(
        "SELECT {CHUNK_COLUMNS} FROM unknown_chunks
         WHERE analyzed = 0
         ORDER BY first_seen ASC, id ASC
         LIMIT ?1"
    );
    query_chunks(conn, &sql, params![limit as i64])
}

/// Unanalyzed chunks past `after`, in id order.
pub fn list_unanalyzed_after(
    conn: &Connection,
    after: ChunkId,
    limit: usize,
) -> SiftResult<Vec<Chunk>> {
    let sql = format!(
        "SELECT {CHUNK_COLUMNS} FROM unknown_chunks
         WHERE analyzed = 0 AND id > ?1
         ORDER BY id ASC
         LIMIT ?2"
    );
    query_chunks(conn, &sql, params![after, limit as i64])
}

pub fn list_for_session(conn: &Connection, session_id: &str) -> SiftResult<Vec<Chunk>> {
    let sql = format!(
        "SELECT {CHUNK_COLUMNS} FROM unknown_chunks WHERE session_id = ?1 ORDER BY id ASC"
    );
    query_chunks(conn, &sql, params![session_id])
}

pub fn get_chunk(conn: &Connection, id: ChunkId) -> SiftResult<Option<Chunk>> {
    let sql = format!("SELECT {CHUNK_COLUMNS} FROM unknown_chunks WHERE id = ?1");
    conn.query_row(&sql, params![id], |row| Ok(row_to_chunk(row)))
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?
        .transpose()
}

pub fn mark_analyzed(
    conn: &Connection,
    id: ChunkId,
    proposed_pattern: Option<PatternId>,
) -> SiftResult<()> {
    let changed = conn
        .execute(
            "UPDATE unknown_chunks SET analyzed = 1, proposed_pattern = ?2 WHERE id = ?1",
            params![id, proposed_pattern],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    if changed == 0 {
        return Err(SiftError::ChunkNotFound { id });
    }
    Ok(())
}

/// Mark a group in one transaction. Unknown ids are skipped.
pub fn mark_analyzed_batch(
    conn: &Connection,
    ids: &[ChunkId],
    proposed_pattern: Option<PatternId>,
) -> SiftResult<usize> {
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| to_storage_err(format!("mark_analyzed_batch begin: {e}")))?;

    let mut updated = 0;
    {
        let mut stmt = tx
            .prepare_cached(
                "UPDATE unknown_chunks SET analyzed = 1, proposed_pattern = ?2 WHERE id = ?1",
            )
            .map_err(|e| to_storage_err(e.to_string()))?;
        for id in ids {
            updated += stmt
                .execute(params![id, proposed_pattern])
                .map_err(|e| to_storage_err(e.to_string()))?;
        }
    }

    tx.commit()
        .map_err(|e| to_storage_err(format!("mark_analyzed_batch commit: {e}")))?;
    Ok(updated)
}

pub fn chunk_counts(conn: &Connection) -> SiftResult<ChunkCounts> {
    conn.query_row(
        "SELECT COUNT(*), COALESCE(SUM(analyzed), 0) FROM unknown_chunks",
        [],
        |row| {
            let total = row.get::<_, i64>(0)? as u64;
            let analyzed = row.get::<_, i64>(1)? as u64;
            Ok(ChunkCounts {
                total,
                analyzed,
                unanalyzed: total - analyzed,
            })
        },
    )
    .map_err(|e| to_storage_err(e.to_string()))
}

fn query_chunks(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> SiftResult<Vec<Chunk>> {
    let mut stmt = conn.prepare(sql).map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map(params, |row| Ok(row_to_chunk(row)))
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut chunks = Vec::new();
    for row in rows {
        chunks.push(row.map_err(|e| to_storage_err(e.to_string()))??);
    }
    Ok(chunks)
}

fn row_to_chunk(row: &rusqlite::Row<'_>) -> SiftResult<Chunk> {
    let first_seen: String = row.get(5).map_err(|e| to_storage_err(e.to_string()))?;
    let last_seen: String = row.get(6).map_err(|e| to_storage_err(e.to_string()))?;
    Ok(Chunk {
        id: row.get(0).map_err(|e| to_storage_err(e.to_string()))?,
        session_id: row.get(1).map_err(|e| to_storage_err(e.to_string()))?,
        content_hash: row.get(2).map_err(|e| to_storage_err(e.to_string()))?,
        text: row.get(3).map_err(|e| to_storage_err(e.to_string()))?,
        context_before: row.get(4).map_err(|e| to_storage_err(e.to_string()))?,
        first_seen: parse_ts(&first_seen)?,
        last_seen: parse_ts(&last_seen)?,
        occurrence_count: row
            .get::<_, i64>(7)
            .map_err(|e| to_storage_err(e.to_string()))?
            .max(0) as u64,
        analyzed: row
            .get::<_, i64>(8)
            .map_err(|e| to_storage_err(e.to_string()))?
            != 0,
        proposed_pattern: row.get(9).map_err(|e| to_storage_err(e.to_string()))?,
    })
}
