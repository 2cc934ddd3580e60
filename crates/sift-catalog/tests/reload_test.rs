//! Catalog file reload and export.

use std::sync::Arc;

use sift_catalog::PatternStore;
use sift_core::{PatternCategory, PatternDefinition, ProposedBy};
use sift_storage::StorageEngine;

fn store() -> PatternStore {
    let engine = Arc::new(StorageEngine::open_in_memory().unwrap());
    PatternStore::open_without_history(engine).unwrap()
}

#[test]
fn reload_publishes_the_fixture_catalog() {
    let store = store();
    let report = store.reload(&test_fixtures::catalog_path()).unwrap();
    assert_eq!(report.applied, test_fixtures::catalog_definitions().len());
    assert_eq!(report.total, report.applied);

    let snapshot = store.snapshot();
    assert_eq!(snapshot.version(), report.version);
    let bash = snapshot.get("bash_command").unwrap();
    assert_eq!(bash.pattern.metadata.safe, Some(false));
    assert_eq!(bash.pattern.action.as_deref(), Some("dispatch_tool"));
}

#[test]
fn reload_upserts_by_name_and_keeps_absent_patterns() {
    let dir = tempfile::tempdir().unwrap();
    let store = store();
    let mut learned = PatternDefinition::new("learned_x", "^x \\d+$", PatternCategory::Other);
    learned.proposed_by = ProposedBy::Learned;
    store.register(learned).unwrap();

    let path = dir.path().join("catalog.toml");
    std::fs::write(
        &path,
        r#"
[[patterns]]
name = "error_exit_code"
regex = 'Error: Exit code (\d+)'
category = "error"
confidence = 0.99
tested = true
test_success_rate = 1.0
"#,
    )
    .unwrap();
    store.reload(&path).unwrap();
    let first_id = store.get("error_exit_code").unwrap().id;

    std::fs::write(
        &path,
        r#"
[[patterns]]
name = "error_exit_code"
regex = 'Error: Exit code (\d+)!?'
category = "error"
confidence = 0.97
"#,
    )
    .unwrap();
    store.reload(&path).unwrap();

    let updated = store.get("error_exit_code").unwrap();
    assert_eq!(updated.id, first_id);
    assert_eq!(updated.regex, r"Error: Exit code (\d+)!?");
    assert_eq!(updated.confidence.value(), 0.97);
    assert!(!updated.tested);
    assert!(store.get("learned_x").is_ok());
}

#[test]
fn invalid_file_changes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let store = store();
    store.register(test_fixtures::bash_command()).unwrap();
    let before = store.snapshot();

    let path = dir.path().join("bad.toml");
    std::fs::write(
        &path,
        r#"
[[patterns]]
name = "fine"
regex = "fine"
category = "other"

[[patterns]]
name = "broken"
regex = "(oops"
category = "other"
"#,
    )
    .unwrap();

    assert!(store.reload(&path).is_err());
    let after = store.snapshot();
    assert_eq!(after.version(), before.version());
    assert!(store.get("fine").is_err());
    assert_eq!(store.list().len(), 1);

    assert!(store.reload(&dir.path().join("missing.toml")).is_err());
}

#[test]
fn export_then_reload_into_fresh_store_reproduces_catalog() {
    let dir = tempfile::tempdir().unwrap();
    let source = store();
    source.reload(&test_fixtures::catalog_path()).unwrap();
    let path = dir.path().join("exported.toml");
    let written = source.export(&path).unwrap();
    assert_eq!(written, source.list().len());

    let target = store();
    target.reload(&path).unwrap();
    for p in source.list() {
        let q = target.get(&p.name).unwrap();
        assert_eq!(q.regex, p.regex);
        assert_eq!(q.category, p.category);
        assert_eq!(q.tested, p.tested);
        assert_eq!(q.metadata, p.metadata);
        assert_eq!(q.confidence, p.confidence);
    }
}

#[test]
fn concurrent_readers_see_whole_snapshots_during_reloads() {
    let store = Arc::new(store());
    store.reload(&test_fixtures::catalog_path()).unwrap();
    let expected = store.snapshot().len();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let store = store.clone();
            std::thread::spawn(move || {
                for _ in 0..200 {
                    let snap = store.snapshot();
                    assert_eq!(snap.len(), expected);
                    assert!(snap.get("bash_command").is_some());
                }
            })
        })
        .collect();

    for _ in 0..20 {
        store.reload(&test_fixtures::catalog_path()).unwrap();
    }
    for r in readers {
        r.join().unwrap();
    }
}
