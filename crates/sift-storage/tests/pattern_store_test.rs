//! Pattern table and match history through StorageEngine.

use std::sync::Arc;

use chrono::Utc;
use sift_core::models::MatchRecord;
use sift_core::traits::{IChunkStorage, IPatternStorage};
use sift_core::{
    Confidence, Pattern, PatternCategory, PatternDefinition, PatternMetadata, RiskLevel, SiftError,
};
use sift_storage::{MatchWriter, StorageEngine};

fn pattern(name: &str, regex: &str, category: PatternCategory) -> Pattern {
    Pattern::from_definition(&PatternDefinition::new(name, regex, category))
}

fn record(pattern: &Pattern, session: &str, text: &str) -> MatchRecord {
    MatchRecord {
        pattern_id: pattern.id,
        pattern_name: pattern.name.clone(),
        session_id: session.to_string(),
        matched_text: text.to_string(),
        timestamp: Utc::now(),
    }
}

// ── CRUD ──

#[test]
fn insert_and_get_roundtrip() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let mut p = pattern("bash_command", r"⏺ Bash\((.+)\)", PatternCategory::ToolUse);
    p.metadata = PatternMetadata {
        safe: Some(false),
        risk_level: Some(RiskLevel::High),
        ..Default::default()
    };
    p.action = Some("dispatch_tool".into());
    let id = engine.insert_pattern(&p).unwrap();
    assert!(id > 0);

    let loaded = engine.get_pattern_by_name("bash_command").unwrap().unwrap();
    assert_eq!(loaded.id, id);
    assert_eq!(loaded.regex, p.regex);
    assert_eq!(loaded.category, PatternCategory::ToolUse);
    assert_eq!(loaded.metadata, p.metadata);
    assert_eq!(loaded.action.as_deref(), Some("dispatch_tool"));
    assert!(!loaded.tested);

    assert_eq!(engine.get_pattern(id).unwrap().unwrap().name, "bash_command");
    assert!(engine.get_pattern(id + 100).unwrap().is_none());
}

#[test]
fn duplicate_name_is_invalid_pattern() {
    let engine = StorageEngine::open_in_memory().unwrap();
    engine
        .insert_pattern(&pattern("dup", "a", PatternCategory::Other))
        .unwrap();
    let err = engine
        .insert_pattern(&pattern("dup", "b", PatternCategory::Other))
        .unwrap_err();
    assert!(matches!(err, SiftError::InvalidPattern { .. }), "{err}");
}

#[test]
fn delete_reports_absence() {
    let engine = StorageEngine::open_in_memory().unwrap();
    engine
        .insert_pattern(&pattern("gone", "x", PatternCategory::Other))
        .unwrap();
    assert!(engine.delete_pattern("gone").unwrap());
    assert!(!engine.delete_pattern("gone").unwrap());
    assert!(engine.get_pattern_by_name("gone").unwrap().is_none());
}

#[test]
fn mark_tested_updates_counts() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let id = engine
        .insert_pattern(&pattern("p", "x", PatternCategory::Error))
        .unwrap();
    assert_eq!(engine.pattern_counts().unwrap(), (1, 0));
    assert!(engine.mark_pattern_tested(id, 0.95).unwrap());
    assert_eq!(engine.pattern_counts().unwrap(), (1, 1));
    let p = engine.get_pattern(id).unwrap().unwrap();
    assert!(p.tested);
    assert_eq!(p.test_success_rate, 0.95);
    assert!(!engine.mark_pattern_tested(id + 1, 0.5).unwrap());
}

// ── Upsert ──

#[test]
fn upsert_updates_in_place_and_keeps_counters() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let mut p = pattern("p", "old", PatternCategory::Other);
    p.id = engine.insert_pattern(&p).unwrap();
    engine.record_matches(&[record(&p, "s", "old")]).unwrap();

    let mut changed = pattern("p", "new", PatternCategory::Error);
    changed.confidence = Confidence::new(0.8);
    let fresh = pattern("q", "q", PatternCategory::Other);
    let ids = engine.upsert_patterns(&[changed, fresh]).unwrap();
    assert_eq!(ids[0], p.id);

    let loaded = engine.get_pattern(p.id).unwrap().unwrap();
    assert_eq!(loaded.regex, "new");
    assert_eq!(loaded.category, PatternCategory::Error);
    assert_eq!(loaded.match_count, 1);
    assert_eq!(engine.list_patterns().unwrap().len(), 2);
}

// ── Match history ──

#[test]
fn record_matches_bumps_counters_and_skips_removed_patterns() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let mut a = pattern("a", "a", PatternCategory::Other);
    a.id = engine.insert_pattern(&a).unwrap();
    let mut ghost = pattern("ghost", "g", PatternCategory::Other);
    ghost.id = 9_999;

    let written = engine
        .record_matches(&[
            record(&a, "s1", "a"),
            record(&a, "s2", "a"),
            record(&ghost, "s1", "g"),
        ])
        .unwrap();
    assert_eq!(written, 2);
    assert_eq!(engine.count_matches().unwrap(), 2);
    assert_eq!(engine.count_matches_for_session("s1").unwrap(), 1);

    let loaded = engine.get_pattern(a.id).unwrap().unwrap();
    assert_eq!(loaded.match_count, 2);
    assert!(loaded.last_matched.is_some());
}

#[test]
fn deleting_a_pattern_unlinks_its_chunks() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let id = engine
        .insert_pattern(&pattern("learned", "x", PatternCategory::Other))
        .unwrap();
    let chunk = engine
        .record_unmatched("s", "some line", None, Utc::now())
        .unwrap();
    engine.mark_analyzed(chunk.id, Some(id)).unwrap();
    engine.delete_pattern("learned").unwrap();

    let chunk = engine.get_chunk(chunk.id).unwrap().unwrap();
    assert!(chunk.analyzed);
    assert_eq!(chunk.proposed_pattern, None);
}

#[test]
fn match_writer_persists_in_background() {
    let engine = Arc::new(StorageEngine::open_in_memory().unwrap());
    let mut p = pattern("p", "x", PatternCategory::Other);
    p.id = engine.insert_pattern(&p).unwrap();

    let writer = MatchWriter::new(engine.clone());
    for i in 0..10 {
        assert!(writer.record(record(&p, "s", &format!("line {i}"))));
    }
    writer.flush().unwrap();
    assert_eq!(engine.count_matches().unwrap(), 10);

    writer.record(record(&p, "s", "last"));
    let stats = writer.shutdown().unwrap();
    assert_eq!(stats.written, 11);
    assert_eq!(stats.dropped, 0);
    assert_eq!(stats.failed_batches, 0);
    assert_eq!(engine.get_pattern(p.id).unwrap().unwrap().match_count, 11);
}
