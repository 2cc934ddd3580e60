use rusqlite::Connection;
use sift_storage::migrations::{current_version, run_migrations, LATEST_VERSION};
use sift_storage::pool::pragmas::verify_wal_mode;
use sift_storage::StorageEngine;

#[test]
fn migrations_are_idempotent() {
    let conn = Connection::open_in_memory().unwrap();
    assert_eq!(run_migrations(&conn).unwrap(), LATEST_VERSION);
    assert_eq!(run_migrations(&conn).unwrap(), LATEST_VERSION);
    assert_eq!(current_version(&conn).unwrap(), LATEST_VERSION);

    let applied: i64 = conn
        .query_row("SELECT COUNT(*) FROM schema_version", [], |r| r.get(0))
        .unwrap();
    assert_eq!(applied, LATEST_VERSION as i64);
}

#[test]
fn file_database_runs_in_wal_mode() {
    let dir = tempfile::tempdir().unwrap();
    let engine = StorageEngine::open(&dir.path().join("wal.db"), 1).unwrap();
    let wal = engine
        .pool()
        .writer
        .with_conn_sync(verify_wal_mode)
        .unwrap();
    assert!(wal);
}
