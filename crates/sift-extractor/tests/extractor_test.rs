//! StreamExtractor behavior over the fixture catalog and session logs.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use proptest::prelude::*;

use sift_catalog::PatternStore;
use sift_core::chunk::{Chunk, ChunkId};
use sift_core::errors::{SiftError, SiftResult, StorageError};
use sift_core::models::{ChunkCounts, LabeledSample};
use sift_core::traits::{IChunkStorage, IPatternStorage};
use sift_core::{DecisionReason, Pattern, PatternCategory, PatternDefinition, PatternId, RiskLevel};
use sift_extractor::{ExtractorOptions, StreamExtractor};
use sift_storage::StorageEngine;

fn empty_store() -> (Arc<StorageEngine>, Arc<PatternStore>) {
    let engine = Arc::new(StorageEngine::open_in_memory().unwrap());
    let store = Arc::new(PatternStore::open(engine.clone()).unwrap());
    (engine, store)
}

fn fixture_store() -> (Arc<StorageEngine>, Arc<PatternStore>) {
    let (engine, store) = empty_store();
    store.reload(&test_fixtures::catalog_path()).unwrap();
    (engine, store)
}

fn extractor(session: &str, store: &Arc<PatternStore>) -> StreamExtractor {
    StreamExtractor::new(session, store.clone(), ExtractorOptions::default())
}

// ── Scenarios ──

#[test]
fn scenario_a_bash_command() {
    let (_, store) = empty_store();
    let id = store.register(test_fixtures::bash_command()).unwrap();
    let mut ex = extractor("demo_agent", &store);

    let events = ex.process_line("⏺ Bash(ls -lh)").unwrap();
    assert_eq!(events.len(), 1);
    let e = &events[0];
    assert_eq!(e.event_type, PatternCategory::ToolUse);
    assert_eq!(e.pattern_id, id);
    assert_eq!(e.captures.len(), 1);
    assert_eq!(e.captures["1"], "ls -lh");
    assert!(!e.metadata.auto_confirm);
    assert_eq!(e.metadata.risk_level, RiskLevel::Low);
}

#[test]
fn scenario_b_error_exit_code() {
    let (_, store) = empty_store();
    store.register(test_fixtures::error_exit_code()).unwrap();
    let mut ex = extractor("demo_agent", &store);

    let events = ex.process_line("Error: Exit code 1").unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, PatternCategory::Error);
    assert_eq!(events[0].captures["1"], "1");
    assert_eq!(store.get("error_exit_code").unwrap().match_count, 1);
}

#[test]
fn scenario_c_unmatched_lines_dedupe_into_one_chunk() {
    let (engine, store) = empty_store();
    let mut ex = extractor("demo_agent", &store);
    for _ in 0..3 {
        assert!(ex.process_line("Something unexpected happened here").unwrap().is_empty());
    }
    let report = ex.close();

    let chunks = engine.list_chunks_for_session("demo_agent").unwrap();
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].occurrence_count, 3);
    assert!(!chunks[0].analyzed);
    assert_eq!(report.catalog.unknown_chunks, 1);
    assert_eq!(report.catalog.unanalyzed_chunks, 1);
    assert_eq!(report.chunks_recorded, 3);
    assert_eq!(report.chunks_created, 1);
    assert_eq!(report.lines_matched, 0);
}

// ── Matching order ──

#[test]
fn tested_match_beats_higher_confidence_untested() {
    let (_, store) = empty_store();
    store
        .register(PatternDefinition::new("loose", r"Exit code", PatternCategory::Other).with_confidence(1.0))
        .unwrap();
    let strict = store
        .register(
            PatternDefinition::new("strict", r"Exit code (\d+)", PatternCategory::Error)
                .with_confidence(0.2)
                .tested(0.9),
        )
        .unwrap();
    let mut ex = extractor("s", &store);
    let events = ex.process_line("Error: Exit code 2").unwrap();
    assert_eq!(events[0].pattern_id, strict);
}

#[test]
fn untested_pattern_is_a_fallback() {
    let (_, store) = fixture_store();
    let mut ex = extractor("s", &store);
    let events = ex.process_line("✓ Build completed").unwrap();
    assert_eq!(events[0].pattern_name, "task_completed");
    assert_eq!(events[0].event_type, PatternCategory::StateInfo);
}

#[test]
fn equal_confidence_ties_break_by_name() {
    let (_, store) = empty_store();
    store
        .register(PatternDefinition::new("beta", "same", PatternCategory::Other))
        .unwrap();
    store
        .register(PatternDefinition::new("alpha", "same", PatternCategory::Other))
        .unwrap();
    let mut ex = extractor("s", &store);
    assert_eq!(ex.process_line("same").unwrap()[0].pattern_name, "alpha");
}

// ── Chunk-in-progress ──

#[test]
fn match_flushes_open_chunk_with_context() {
    let (engine, store) = fixture_store();
    let mut ex = extractor("s", &store);
    ex.process_line("first mystery").unwrap();
    ex.process_line("second mystery").unwrap();
    assert_eq!(ex.pending_lines(), 2);
    assert!(engine.list_chunks_for_session("s").unwrap().is_empty());

    ex.process_line("Error: Exit code 3").unwrap();
    assert_eq!(ex.pending_lines(), 0);
    let chunks = engine.list_chunks_for_session("s").unwrap();
    assert_eq!(chunks.len(), 2);
    let second = chunks.iter().find(|c| c.text == "second mystery").unwrap();
    assert_eq!(second.context_before.as_deref(), Some("first mystery"));
}

#[test]
fn close_flushes_and_rejects_further_lines() {
    let (engine, store) = fixture_store();
    let mut ex = extractor("s", &store);
    ex.process_line("dangling output").unwrap();
    let report = ex.close();
    assert_eq!(report.chunks_recorded, 1);
    assert_eq!(engine.list_chunks_for_session("s").unwrap().len(), 1);

    assert!(matches!(
        ex.process_line("more").unwrap_err(),
        SiftError::ExtractorClosed { .. }
    ));
    // Second close is a no-op.
    assert_eq!(ex.close().chunks_recorded, 1);
}

#[test]
fn pending_buffer_flushes_at_its_bound() {
    let (engine, store) = empty_store();
    let options = ExtractorOptions {
        max_pending_lines: 2,
        ..Default::default()
    };
    let mut ex = StreamExtractor::new("s", store, options);
    for i in 0..5 {
        ex.process_line(&format!("noise {i}")).unwrap();
    }
    assert_eq!(ex.pending_lines(), 1);
    assert_eq!(engine.list_chunks_for_session("s").unwrap().len(), 4);
}

#[test]
fn dropping_an_open_extractor_still_flushes() {
    let (engine, store) = empty_store();
    {
        let mut ex = extractor("s", &store);
        ex.process_line("left behind").unwrap();
    }
    assert_eq!(engine.list_chunks_for_session("s").unwrap().len(), 1);
}

// ── Text cleanup ──

#[test]
fn escapes_are_stripped_but_matched_text_keeps_its_spacing() {
    let (engine, store) = fixture_store();
    let mut ex = extractor("s", &store);
    let events = ex
        .process_line("\x1b[1m⏺ Bash(echo \"a  b\")\x1b[0m\r")
        .unwrap();
    assert_eq!(events[0].captures["1"], "echo \"a  b\"");
    assert_eq!(events[0].line, "⏺ Bash(echo \"a  b\")");

    ex.process_line("\x1b]0;title\x07  Compiling sift  ").unwrap();
    ex.close();
    let chunks = engine.list_chunks_for_session("s").unwrap();
    assert_eq!(chunks[0].text, "Compiling sift");
}

#[test]
fn whitespace_sensitive_pattern_matches_what_it_was_evaluated_on() {
    let (_, store) = empty_store();
    let def = PatternDefinition::new("columns", r"^col1  col2$", PatternCategory::StateInfo);
    let id = store.register(def).unwrap();
    let report = store
        .evaluate("columns", &[LabeledSample::positive("col1  col2")])
        .unwrap();
    assert_eq!(report.success_rate, 1.0);

    let mut ex = extractor("s", &store);
    let events = ex.process_line("col1  col2").unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].pattern_id, id);
    assert!(ex.process_line("col1 col2").unwrap().is_empty());
}

#[test]
fn lines_longer_than_a_chunk_still_match() {
    let (_, store) = empty_store();
    let id = store.register(test_fixtures::bash_command()).unwrap();
    let mut ex = extractor("s", &store);

    let payload = "x".repeat(5000);
    let events = ex.process_line(&format!("⏺ Bash(echo {payload})")).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].pattern_id, id);
    assert_eq!(events[0].captures["1"], format!("echo {payload}"));
}

#[test]
fn non_ascii_text_survives_escape_stripping() {
    let (_, store) = empty_store();
    let def = PatternDefinition::new("created", r"^Vytvořeno: (.+)$", PatternCategory::StateInfo)
        .tested(1.0);
    store.register(def).unwrap();
    let mut ex = extractor("s", &store);

    let events = ex.process_line("Vytvořeno: ÛNDER ěmail").unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].captures["1"], "ÛNDER ěmail");
}

#[test]
fn blank_lines_are_ignored() {
    let (engine, store) = empty_store();
    let mut ex = extractor("s", &store);
    ex.process_line("").unwrap();
    ex.process_line("   \t").unwrap();
    ex.process_line("\x1b[0m").unwrap();
    let report = ex.close();
    assert_eq!(report.lines_read, 0);
    assert!(engine.list_chunks_for_session("s").unwrap().is_empty());
}

// ── Full fixture session ──

#[test]
fn demo_session_produces_expected_events() {
    let (engine, store) = fixture_store();
    let mut ex = extractor("demo_agent", &store);
    let mut events = Vec::new();
    for line in test_fixtures::session_lines("demo_agent") {
        events.extend(ex.process_line(&line).unwrap());
    }
    let report = ex.close();

    let names: Vec<&str> = events.iter().map(|e| e.pattern_name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "bash_command",
            "tool_call",
            "thinking",
            "error_exit_code",
            "confirm_read",
            "confirm_edit",
            "proceed_prompt",
            "task_completed",
        ]
    );

    let read_prompt = &events[4];
    assert!(read_prompt.metadata.auto_confirm);
    assert_eq!(read_prompt.metadata.decision, Some(DecisionReason::Approved));
    assert_eq!(read_prompt.captures["target"], "docs/notes.md");

    let edit_prompt = &events[5];
    assert!(!edit_prompt.metadata.auto_confirm);
    assert_eq!(edit_prompt.metadata.risk_level, RiskLevel::Medium);
    assert_eq!(edit_prompt.metadata.decision, Some(DecisionReason::NotMarkedSafe));

    let proceed = &events[6];
    assert!(!proceed.metadata.auto_confirm);
    assert_eq!(proceed.metadata.decision, Some(DecisionReason::Untested));

    assert_eq!(events[1].captures["tool"], "Read");

    assert_eq!(report.lines_read, 13);
    assert_eq!(report.lines_matched, 8);
    assert_eq!(report.events_emitted, 8);
    assert_eq!(report.auto_confirmed, 1);
    assert_eq!(report.escalated, 2);
    // total 48K, ls line, the duplicated mystery line, Compiling
    assert_eq!(report.chunks_recorded, 5);
    assert_eq!(report.chunks_created, 4);
    assert_eq!(engine.list_chunks_for_session("demo_agent").unwrap().len(), 4);
    assert_eq!(report.catalog.total_matches, 8);
}

#[test]
fn processing_is_deterministic() {
    let run = || {
        let (_, store) = fixture_store();
        let mut ex = extractor("demo_agent", &store);
        let mut events = Vec::new();
        for line in test_fixtures::session_lines("demo_agent") {
            events.extend(ex.process_line(&line).unwrap());
        }
        (events, ex.close())
    };
    let (first_events, first_report) = run();
    let (second_events, second_report) = run();

    assert_eq!(first_events.len(), second_events.len());
    for (a, b) in first_events.iter().zip(&second_events) {
        assert!(a.same_content(b), "{a:?} != {b:?}");
    }
    assert_eq!(first_report, second_report);
}

// ── Catalog changes while running ──

#[test]
fn new_patterns_apply_from_the_next_line() {
    let (_, store) = empty_store();
    let mut ex = extractor("s", &store);
    assert!(ex.process_line("Deploy finished").unwrap().is_empty());
    let before = ex.catalog_version();

    store
        .register(PatternDefinition::new("deploy", r"^Deploy (\w+)$", PatternCategory::StateInfo))
        .unwrap();
    let events = ex.process_line("Deploy finished").unwrap();
    assert_eq!(events[0].pattern_name, "deploy");
    assert!(ex.catalog_version() > before);
}

// ── Degradation ──

#[test]
fn broken_pattern_is_skipped_for_the_rest_of_the_session() {
    let engine = Arc::new(StorageEngine::open_in_memory().unwrap());
    let broken = Pattern::from_definition(
        &PatternDefinition::new("broken", "(unclosed", PatternCategory::Error)
            .with_confidence(1.0)
            .tested(1.0),
    );
    engine.insert_pattern(&broken).unwrap();
    let store = Arc::new(PatternStore::open(engine).unwrap());
    store.register(test_fixtures::error_exit_code()).unwrap();

    let mut ex = extractor("s", &store);
    for _ in 0..3 {
        let events = ex.process_line("Error: Exit code 9").unwrap();
        assert_eq!(events[0].pattern_name, "error_exit_code");
    }
    assert_eq!(ex.stats().skipped_patterns, vec!["broken".to_string()]);
}

struct FailingChunks;

fn down<T>() -> SiftResult<T> {
    Err(StorageError::SqliteError {
        message: "disk I/O error".to_string(),
    }
    .into())
}

impl IChunkStorage for FailingChunks {
    fn record_unmatched(
        &self,
        _session_id: &str,
        _text: &str,
        _context_before: Option<&str>,
        _at: DateTime<Utc>,
    ) -> SiftResult<Chunk> {
        down()
    }
    fn list_unanalyzed(&self, _limit: usize) -> SiftResult<Vec<Chunk>> {
        down()
    }
    fn list_unanalyzed_after(&self, _after: ChunkId, _limit: usize) -> SiftResult<Vec<Chunk>> {
        down()
    }
    fn mark_analyzed(&self, _id: ChunkId, _p: Option<PatternId>) -> SiftResult<()> {
        down()
    }
    fn mark_analyzed_batch(&self, _ids: &[ChunkId], _p: Option<PatternId>) -> SiftResult<usize> {
        down()
    }
    fn get_chunk(&self, _id: ChunkId) -> SiftResult<Option<Chunk>> {
        down()
    }
    fn list_chunks_for_session(&self, _session_id: &str) -> SiftResult<Vec<Chunk>> {
        down()
    }
    fn chunk_counts(&self) -> SiftResult<ChunkCounts> {
        down()
    }
}

#[test]
fn chunk_store_failures_do_not_stall_the_session() {
    let engine = Arc::new(StorageEngine::open_in_memory().unwrap());
    let patterns: Arc<dyn IPatternStorage> = engine;
    let store = Arc::new(PatternStore::with_backends(patterns, Arc::new(FailingChunks), false).unwrap());
    store.register(test_fixtures::error_exit_code()).unwrap();

    let mut ex = extractor("s", &store);
    ex.process_line("unknown one").unwrap();
    ex.process_line("unknown two").unwrap();
    let events = ex.process_line("Error: Exit code 4").unwrap();
    assert_eq!(events.len(), 1);
    let report = ex.close();
    assert_eq!(report.lines_read, 3);
    assert_eq!(report.chunk_write_failures, 2);
    assert_eq!(report.chunks_recorded, 0);
    assert_eq!(report.lines_matched, 1);
}

// ── Properties ──

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_tested_pattern_recognizes_its_evaluated_line(cmd in "[a-z][a-z0-9 ./-]{0,30}") {
        let (_, store) = fixture_store();
        let line = format!("⏺ Bash({cmd})");
        let report = store
            .evaluate("bash_command", &[LabeledSample::positive(line.clone())])
            .unwrap();
        prop_assume!(report.success_rate == 1.0);

        let id = store.get("bash_command").unwrap().id;
        let mut ex = extractor("s", &store);
        let events = ex.process_line(&line).unwrap();
        prop_assert_eq!(events.len(), 1);
        prop_assert_eq!(events[0].pattern_id, id);
    }

    #[test]
    fn prop_evaluated_line_matches_through_the_extractor(
        words in proptest::collection::vec("[a-z]{1,6}", 1..5),
        gap in 1usize..4,
        pad in prop::sample::select(vec![0usize, 10, 5000]),
    ) {
        let (_, store) = empty_store();
        let line = format!("{}{}", words.join(&" ".repeat(gap)), "z".repeat(pad));
        let regex = format!("^{line}$");
        let def = PatternDefinition::new("exact", regex, PatternCategory::Other);
        let id = store.register(def).unwrap();
        let report = store
            .evaluate("exact", &[LabeledSample::positive(line.clone())])
            .unwrap();
        prop_assert_eq!(report.success_rate, 1.0);

        let mut ex = extractor("s", &store);
        let events = ex.process_line(&line).unwrap();
        prop_assert_eq!(events.len(), 1);
        prop_assert_eq!(events[0].pattern_id, id);
    }

    #[test]
    fn prop_repeated_unmatched_line_is_one_chunk(n in 1usize..30) {
        let (engine, store) = empty_store();
        let mut ex = extractor("s", &store);
        for _ in 0..n {
            ex.process_line("the same mystery line").unwrap();
        }
        ex.close();
        let chunks = engine.list_chunks_for_session("s").unwrap();
        prop_assert_eq!(chunks.len(), 1);
        prop_assert_eq!(chunks[0].occurrence_count, n as u64);
    }
}
