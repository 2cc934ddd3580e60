//! Insert, upsert, get, delete, and trust updates for patterns.

use rusqlite::{params, Connection, OptionalExtension};

use sift_core::errors::{SiftError, SiftResult};
use sift_core::pattern::{
    Confidence, Pattern, PatternCategory, PatternId, PatternMetadata, ProposedBy,
};

use crate::{format_ts, parse_ts, to_storage_err};

const PATTERN_COLUMNS: &str = "id, name, regex, category, confidence, action, target_worker,
     tested, test_success_rate, proposed_by, metadata, match_count, created_at, last_matched";

/// Insert a new pattern. A duplicate name is reported as an invalid pattern.
pub fn insert_pattern(conn: &Connection, pattern: &Pattern) -> SiftResult<PatternId> {
    let metadata_json = serde_json::to_string(&pattern.metadata)?;
    let result = conn.execute(
        "INSERT INTO patterns (
            name, regex, category, confidence, action, target_worker, tested,
            test_success_rate, proposed_by, metadata, match_count, created_at, last_matched
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            pattern.name,
            pattern.regex,
            pattern.category.as_str(),
            pattern.confidence.value(),
            pattern.action,
            pattern.target_worker,
            pattern.tested as i32,
            pattern.test_success_rate,
            pattern.proposed_by.as_str(),
            metadata_json,
            pattern.match_count as i64,
            format_ts(&pattern.created_at),
            pattern.last_matched.as_ref().map(format_ts),
        ],
    );
    match result {
        Ok(_) => Ok(conn.last_insert_rowid()),
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Err(SiftError::invalid_pattern(
                &pattern.name,
                "a pattern with this name already exists",
            ))
        }
        Err(e) => Err(to_storage_err(e.to_string())),
    }
}

/// Insert or update by name. Keeps `id`, `match_count`, `created_at`, and
/// `last_matched` of an existing row.
pub fn upsert_pattern(conn: &Connection, pattern: &Pattern) -> SiftResult<PatternId> {
    let metadata_json = serde_json::to_string(&pattern.metadata)?;
    conn.execute(
        "INSERT INTO patterns (
            name, regex, category, confidence, action, target_worker, tested,
            test_success_rate, proposed_by, metadata, match_count, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 0, ?11)
        ON CONFLICT(name) DO UPDATE SET
            regex = excluded.regex,
            category = excluded.category,
            confidence = excluded.confidence,
            action = excluded.action,
            target_worker = excluded.target_worker,
            tested = excluded.tested,
            test_success_rate = excluded.test_success_rate,
            proposed_by = excluded.proposed_by,
            metadata = excluded.metadata",
        params![
            pattern.name,
            pattern.regex,
            pattern.category.as_str(),
            pattern.confidence.value(),
            pattern.action,
            pattern.target_worker,
            pattern.tested as i32,
            pattern.test_success_rate,
            pattern.proposed_by.as_str(),
            metadata_json,
            format_ts(&pattern.created_at),
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;

    conn.query_row(
        "SELECT id FROM patterns WHERE name = ?1",
        params![pattern.name],
        |row| row.get(0),
    )
    .map_err(|e| to_storage_err(e.to_string()))
}

/// Upsert a batch in one transaction: all rows or none.
pub fn upsert_patterns(conn: &Connection, patterns: &[Pattern]) -> SiftResult<Vec<PatternId>> {
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| to_storage_err(format!("upsert_patterns begin: {e}")))?;

    let mut ids = Vec::with_capacity(patterns.len());
    for pattern in patterns {
        match upsert_pattern(&tx, pattern) {
            Ok(id) => ids.push(id),
            Err(e) => {
                let _ = tx.rollback();
                return Err(e);
            }
        }
    }
    tx.commit()
        .map_err(|e| to_storage_err(format!("upsert_patterns commit: {e}")))?;
    Ok(ids)
}

pub fn get_pattern(conn: &Connection, id: PatternId) -> SiftResult<Option<Pattern>> {
    let sql = format!("SELECT {PATTERN_COLUMNS} FROM patterns WHERE id = ?1");
    conn.query_row(&sql, params![id], |row| Ok(row_to_pattern(row)))
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?
        .transpose()
}

pub fn get_pattern_by_name(conn: &Connection, name: &str) -> SiftResult<Option<Pattern>> {
    let sql = format!("SELECT {PATTERN_COLUMNS} FROM patterns WHERE name = ?1");
    conn.query_row(&sql, params![name], |row| Ok(row_to_pattern(row)))
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?
        .transpose()
}

/// All patterns, ordered by id.
pub fn list_patterns(conn: &Connection) -> SiftResult<Vec<Pattern>> {
    let sql = format!("SELECT {PATTERN_COLUMNS} FROM patterns ORDER BY id");
    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map([], |row| Ok(row_to_pattern(row)))
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut patterns = Vec::new();
    for row in rows {
        patterns.push(row.map_err(|e| to_storage_err(e.to_string()))??);
    }
    Ok(patterns)
}

pub fn delete_pattern(conn: &Connection, name: &str) -> SiftResult<bool> {
    let changed = conn
        .execute("DELETE FROM patterns WHERE name = ?1", params![name])
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(changed > 0)
}

pub fn mark_tested(conn: &Connection, id: PatternId, success_rate: f64) -> SiftResult<bool> {
    let changed = conn
        .execute(
            "UPDATE patterns SET tested = 1, test_success_rate = ?2 WHERE id = ?1",
            params![id, success_rate],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(changed > 0)
}

/// `(total, tested)`.
pub fn pattern_counts(conn: &Connection) -> SiftResult<(u64, u64)> {
    conn.query_row(
        "SELECT COUNT(*), COALESCE(SUM(tested), 0) FROM patterns",
        [],
        |row| Ok((row.get::<_, i64>(0)? as u64, row.get::<_, i64>(1)? as u64)),
    )
    .map_err(|e| to_storage_err(e.to_string()))
}

/// Parse a row selected with `PATTERN_COLUMNS`.
pub(crate) fn row_to_pattern(row: &rusqlite::Row<'_>) -> SiftResult<Pattern> {
    let category_str: String = row.get(3).map_err(|e| to_storage_err(e.to_string()))?;
    let proposed_by_str: String = row.get(9).map_err(|e| to_storage_err(e.to_string()))?;
    let metadata_json: String = row.get(10).map_err(|e| to_storage_err(e.to_string()))?;
    let created_at: String = row.get(12).map_err(|e| to_storage_err(e.to_string()))?;
    let last_matched: Option<String> = row.get(13).map_err(|e| to_storage_err(e.to_string()))?;

    let category = PatternCategory::parse_str(&category_str)
        .ok_or_else(|| to_storage_err(format!("unknown pattern category '{category_str}'")))?;
    let proposed_by = ProposedBy::parse_str(&proposed_by_str)
        .ok_or_else(|| to_storage_err(format!("unknown proposed_by '{proposed_by_str}'")))?;
    let metadata: PatternMetadata = serde_json::from_str(&metadata_json)?;

    Ok(Pattern {
        id: row.get(0).map_err(|e| to_storage_err(e.to_string()))?,
        name: row.get(1).map_err(|e| to_storage_err(e.to_string()))?,
        regex: row.get(2).map_err(|e| to_storage_err(e.to_string()))?,
        category,
        confidence: Confidence::new(row.get(4).map_err(|e| to_storage_err(e.to_string()))?),
        action: row.get(5).map_err(|e| to_storage_err(e.to_string()))?,
        target_worker: row.get(6).map_err(|e| to_storage_err(e.to_string()))?,
        tested: row
            .get::<_, i64>(7)
            .map_err(|e| to_storage_err(e.to_string()))?
            != 0,
        test_success_rate: row.get(8).map_err(|e| to_storage_err(e.to_string()))?,
        proposed_by,
        metadata,
        match_count: row
            .get::<_, i64>(11)
            .map_err(|e| to_storage_err(e.to_string()))?
            .max(0) as u64,
        created_at: parse_ts(&created_at)?,
        last_matched: last_matched.as_deref().map(parse_ts).transpose()?,
    })
}
