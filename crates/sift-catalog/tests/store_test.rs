//! PatternStore contract: register, get, list, mark_tested, remove, stats.

use std::sync::Arc;

use chrono::Utc;
use sift_catalog::PatternStore;
use sift_core::traits::IChunkStorage;
use sift_core::{PatternCategory, PatternDefinition, ProposedBy, SiftError};
use sift_storage::StorageEngine;

fn store() -> (Arc<StorageEngine>, PatternStore) {
    let engine = Arc::new(StorageEngine::open_in_memory().unwrap());
    let store = PatternStore::open(engine.clone()).unwrap();
    (engine, store)
}

// ── register ──

#[test]
fn register_then_get() {
    let (_, store) = store();
    let id = store.register(test_fixtures::bash_command()).unwrap();
    let p = store.get("bash_command").unwrap();
    assert_eq!(p.id, id);
    assert_eq!(p.category, PatternCategory::ToolUse);
    assert!(p.tested);
    assert_eq!(p.proposed_by, ProposedBy::Manual);
    assert_eq!(store.get_by_id(id).unwrap().name, "bash_command");
}

#[test]
fn register_rejects_bad_regex_duplicates_and_ranges() {
    let (_, store) = store();
    store.register(test_fixtures::bash_command()).unwrap();

    let dup = store.register(test_fixtures::bash_command()).unwrap_err();
    assert!(matches!(dup, SiftError::InvalidPattern { .. }));

    let bad_regex = PatternDefinition::new("broken", "(", PatternCategory::Other);
    assert!(matches!(
        store.register(bad_regex).unwrap_err(),
        SiftError::InvalidPattern { .. }
    ));

    let bad_conf =
        PatternDefinition::new("hot", "x", PatternCategory::Other).with_confidence(1.5);
    assert!(store.register(bad_conf).is_err());

    let bad_rate = PatternDefinition::new("rate", "x", PatternCategory::Other).tested(2.0);
    assert!(store.register(bad_rate).is_err());

    assert_eq!(store.list().len(), 1);
}

#[test]
fn get_missing_is_not_found() {
    let (_, store) = store();
    let err = store.get("nope").unwrap_err();
    assert!(err.is_not_found());
    assert!(store.get_by_id(77).unwrap_err().is_not_found());
}

// ── listing ──

#[test]
fn list_by_category_filters_and_keeps_match_order() {
    let (_, store) = store();
    store.load_definitions(&test_fixtures::catalog_definitions()).unwrap();

    let prompts = store.list_by_category(PatternCategory::ConfirmationPrompt);
    let names: Vec<_> = prompts.iter().map(|p| p.name.as_str()).collect();
    // tested first (by confidence desc), untested last
    assert_eq!(names, vec!["confirm_read", "confirm_edit", "proceed_prompt"]);

    assert!(store.list_by_category(PatternCategory::Other).is_empty());
}

// ── trust ──

#[test]
fn mark_tested_promotes_and_validates_rate() {
    let (_, store) = store();
    let id = store
        .register(PatternDefinition::new("p", "x", PatternCategory::Error))
        .unwrap();
    assert!(!store.get("p").unwrap().tested);

    store.mark_tested(id, 0.93).unwrap();
    let p = store.get("p").unwrap();
    assert!(p.tested);
    assert_eq!(p.test_success_rate, 0.93);

    assert!(matches!(
        store.mark_tested(id, 1.2).unwrap_err(),
        SiftError::InvalidPattern { .. }
    ));
    assert!(store.mark_tested(id + 10, 0.5).unwrap_err().is_not_found());
}

// ── remove ──

#[test]
fn remove_then_not_found() {
    let (_, store) = store();
    store.register(test_fixtures::error_exit_code()).unwrap();
    store.remove("error_exit_code").unwrap();
    assert!(store.get("error_exit_code").is_err());
    assert!(matches!(
        store.remove("error_exit_code").unwrap_err(),
        SiftError::PatternNotFound { .. }
    ));
}

// ── snapshots ──

#[test]
fn held_snapshot_is_unaffected_by_later_writes() {
    let (_, store) = store();
    store.register(test_fixtures::bash_command()).unwrap();
    let before = store.snapshot();

    store.register(test_fixtures::error_exit_code()).unwrap();
    store.remove("bash_command").unwrap();

    assert_eq!(before.len(), 1);
    assert!(before.get("bash_command").is_some());
    let after = store.snapshot();
    assert!(after.version() > before.version());
    assert!(after.get("bash_command").is_none());
    assert!(after.get("error_exit_code").is_some());
}

// ── stats ──

#[test]
fn stats_combine_catalog_matches_and_chunks() {
    let (engine, store) = store();
    store.register(test_fixtures::bash_command()).unwrap();
    store
        .register(PatternDefinition::new("u", "u", PatternCategory::Other))
        .unwrap();

    let bash = store.get("bash_command").unwrap();
    store.record_match(&bash, "s", "⏺ Bash(ls)");
    store.record_match(&bash, "s", "⏺ Bash(pwd)");

    let now = Utc::now();
    let a = engine.record_unmatched("s", "a", None, now).unwrap();
    engine.record_unmatched("s", "b", None, now).unwrap();
    engine.mark_analyzed(a.id, None).unwrap();

    let stats = store.stats().unwrap();
    assert_eq!(stats.total_patterns, 2);
    assert_eq!(stats.tested_patterns, 1);
    assert_eq!(stats.total_matches, 2);
    assert_eq!(stats.unknown_chunks, 2);
    assert_eq!(stats.analyzed_chunks, 1);
    assert_eq!(stats.unanalyzed_chunks, 1);

    assert_eq!(store.get("bash_command").unwrap().match_count, 2);
}

#[test]
fn match_history_reaches_storage_and_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sift.db");
    {
        let engine = Arc::new(StorageEngine::open(&path, 2).unwrap());
        let store = PatternStore::open(engine).unwrap();
        store.register(test_fixtures::error_exit_code()).unwrap();
        let p = store.get("error_exit_code").unwrap();
        for _ in 0..3 {
            store.record_match(&p, "s", "Error: Exit code 1");
        }
        store.flush_match_history().unwrap();
    }
    let engine = Arc::new(StorageEngine::open(&path, 2).unwrap());
    let store = PatternStore::open(engine).unwrap();
    assert_eq!(store.stats().unwrap().total_matches, 3);
    assert_eq!(store.get("error_exit_code").unwrap().match_count, 3);
}
