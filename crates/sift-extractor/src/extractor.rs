//! StreamExtractor: forward-only classification of one session's output.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use sift_catalog::{CatalogSnapshot, CompiledPattern, PatternStore};
use sift_core::config::SiftConfig;
use sift_core::errors::{SiftError, SiftResult};
use sift_core::event::{new_event_id, DecisionReason, ExtractionEvent};
use sift_core::models::{CatalogStats, DecisionRecord, ProcessingReport};
use sift_core::normalize::normalize_text;
use sift_core::pattern::PatternId;
use sift_core::traits::IChunkStorage;
use sift_observability::events;
use sift_policy::{initial_metadata, AutoConfirmPolicy};

use crate::ansi::strip_ansi;
use crate::pending::PendingChunk;

/// Knobs of one extractor.
#[derive(Debug, Clone)]
pub struct ExtractorOptions {
    pub strip_ansi: bool,
    /// The chunk-in-progress is flushed once it holds this many lines.
    pub max_pending_lines: usize,
    pub policy: AutoConfirmPolicy,
}

impl Default for ExtractorOptions {
    fn default() -> Self {
        Self::from_config(&SiftConfig::default())
    }
}

impl ExtractorOptions {
    pub fn from_config(config: &SiftConfig) -> Self {
        Self {
            strip_ansi: config.extractor.strip_ansi,
            max_pending_lines: config.extractor.max_pending_lines.max(1),
            policy: AutoConfirmPolicy::from_config(&config.auto_confirm),
        }
    }
}

#[derive(Debug, Default, Clone)]
struct Counters {
    lines_read: u64,
    lines_matched: u64,
    events_emitted: u64,
    chunks_recorded: u64,
    chunks_created: u64,
    chunk_write_failures: u64,
    auto_confirmed: u64,
    escalated: u64,
}

/// Classifies the lines of one session.
///
/// A session has exactly one extractor, fed by one caller.
pub struct StreamExtractor {
    session_id: String,
    catalog: Arc<PatternStore>,
    chunks: Arc<dyn IChunkStorage>,
    options: ExtractorOptions,
    snapshot: Arc<CatalogSnapshot>,
    pending: PendingChunk,
    skipped: HashSet<PatternId>,
    skipped_names: Vec<String>,
    counters: Counters,
    last_decision: Option<DecisionRecord>,
    closed: bool,
}

impl StreamExtractor {
    pub fn new(
        session_id: impl Into<String>,
        catalog: Arc<PatternStore>,
        options: ExtractorOptions,
    ) -> Self {
        let snapshot = catalog.snapshot();
        let chunks = catalog.chunk_storage().clone();
        Self {
            session_id: session_id.into(),
            catalog,
            chunks,
            options,
            snapshot,
            pending: PendingChunk::default(),
            skipped: HashSet::new(),
            skipped_names: Vec::new(),
            counters: Counters::default(),
            last_decision: None,
            closed: false,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Version of the catalog snapshot used for the most recent line.
    pub fn catalog_version(&self) -> u64 {
        self.snapshot.version()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Lines currently held in the chunk-in-progress.
    pub fn pending_lines(&self) -> usize {
        self.pending.len()
    }

    /// Classify one line. Yields at most one event. Blank lines are ignored.
    ///
    /// Patterns run against the line with escapes removed and nothing else
    /// rewritten; whitespace is only collapsed in the chunk text of an
    /// unmatched line.
    ///
    /// Only fails once the extractor is closed; storage trouble and broken
    /// patterns degrade the run instead of failing it.
    pub fn process_line(&mut self, raw: &str) -> SiftResult<Vec<ExtractionEvent>> {
        if self.options.strip_ansi {
            let cleaned = strip_ansi(raw.as_bytes());
            self.process_clean(&cleaned)
        } else {
            self.process_clean(raw)
        }
    }

    /// Like [`process_line`](Self::process_line) for raw terminal bytes.
    pub fn process_bytes(&mut self, raw: &[u8]) -> SiftResult<Vec<ExtractionEvent>> {
        if self.options.strip_ansi {
            let cleaned = strip_ansi(raw);
            self.process_clean(&cleaned)
        } else {
            let text = String::from_utf8_lossy(raw);
            self.process_clean(&text)
        }
    }

    fn process_clean(&mut self, text: &str) -> SiftResult<Vec<ExtractionEvent>> {
        if self.closed {
            return Err(SiftError::ExtractorClosed {
                session_id: self.session_id.clone(),
            });
        }
        // Patterns see the line as evaluated: only the terminator is removed.
        let line = text.trim_end_matches(['\n', '\r']);
        if line.trim().is_empty() {
            return Ok(Vec::new());
        }
        self.counters.lines_read += 1;

        // Picks up reloads between lines, never within one.
        self.snapshot = self.catalog.snapshot();
        let snapshot = self.snapshot.clone();

        let Some((compiled, captures)) = self.find_match(&snapshot, line) else {
            self.pending.push(normalize_text(line));
            if self.pending.len() >= self.options.max_pending_lines {
                self.flush_pending();
            }
            return Ok(Vec::new());
        };

        self.flush_pending();
        let pattern = &compiled.pattern;
        self.counters.lines_matched += 1;
        self.catalog.record_match(pattern, &self.session_id, line);

        let mut event = ExtractionEvent {
            id: new_event_id(),
            session_id: self.session_id.clone(),
            event_type: pattern.category,
            pattern_id: pattern.id,
            pattern_name: pattern.name.clone(),
            metadata: initial_metadata(pattern, &captures),
            captures,
            line: line.to_string(),
            timestamp: Utc::now(),
        };
        event.metadata = self.options.policy.decide(&event, pattern);
        self.note_decision(&event);
        self.counters.events_emitted += 1;
        Ok(vec![event])
    }

    /// Tested layer first, then untested; the snapshot is already in that order.
    fn find_match<'s>(
        &mut self,
        snapshot: &'s CatalogSnapshot,
        line: &str,
    ) -> Option<(&'s CompiledPattern, sift_core::event::Captures)> {
        for compiled in snapshot.patterns() {
            if self.skipped.contains(&compiled.pattern.id) {
                continue;
            }
            match compiled.captures(line) {
                Ok(Some(captures)) => return Some((compiled.as_ref(), captures)),
                Ok(None) => {}
                Err(e) => {
                    events::pattern_skipped(
                        &self.session_id,
                        e.pattern_id,
                        &e.pattern_name,
                        &e.reason,
                    );
                    self.skipped.insert(compiled.pattern.id);
                    self.skipped_names.push(compiled.pattern.name.clone());
                }
            }
        }
        None
    }

    fn note_decision(&mut self, event: &ExtractionEvent) {
        let Some(reason) = event.metadata.decision else {
            return;
        };
        if reason == DecisionReason::NotApplicable {
            return;
        }
        if event.metadata.auto_confirm {
            self.counters.auto_confirmed += 1;
        } else {
            self.counters.escalated += 1;
        }
        events::auto_confirm_decided(
            &self.session_id,
            &event.pattern_name,
            event.metadata.auto_confirm,
            event.metadata.risk_level.as_str(),
            reason.as_str(),
        );
        self.last_decision = Some(DecisionRecord {
            event_id: event.id.clone(),
            session_id: event.session_id.clone(),
            pattern_id: event.pattern_id,
            pattern_name: event.pattern_name.clone(),
            line: event.line.clone(),
            auto_confirm: event.metadata.auto_confirm,
            risk_level: event.metadata.risk_level,
            reason,
            timestamp: event.timestamp,
        });
    }

    /// Decision attached to the most recent prompt event, taken once.
    pub fn take_decision(&mut self) -> Option<DecisionRecord> {
        self.last_decision.take()
    }

    /// Write the chunk-in-progress to the chunk store. Failed writes are
    /// logged and counted; the lines are not retried.
    fn flush_pending(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let now = Utc::now();
        let lines = self.pending.drain();
        let total = lines.len();
        let mut failures = 0;
        for (line, context) in lines {
            match self
                .chunks
                .record_unmatched(&self.session_id, &line, context.as_deref(), now)
            {
                Ok(chunk) => {
                    self.counters.chunks_recorded += 1;
                    if chunk.occurrence_count == 1 {
                        self.counters.chunks_created += 1;
                    }
                }
                Err(e) => {
                    failures += 1;
                    self.counters.chunk_write_failures += 1;
                    events::persistence_degraded("extractor", "record_unmatched", &e.to_string());
                }
            }
        }
        events::chunk_flushed(&self.session_id, total, failures);
    }

    /// Flush the chunk-in-progress and stop accepting lines. Safe to call twice.
    pub fn close(&mut self) -> ProcessingReport {
        if !self.closed {
            self.flush_pending();
            if let Err(e) = self.catalog.flush_match_history() {
                warn!(session_id = %self.session_id, error = %e, "match history flush failed on close");
            }
            self.closed = true;
            debug!(session_id = %self.session_id, lines = self.counters.lines_read, "extractor closed");
        }
        self.stats()
    }

    /// Session counters with catalog-wide aggregates.
    pub fn stats(&self) -> ProcessingReport {
        let catalog = match self.catalog.stats() {
            Ok(stats) => stats,
            Err(e) => {
                warn!(session_id = %self.session_id, error = %e, "catalog stats unavailable");
                CatalogStats::default()
            }
        };
        self.report(catalog)
    }

    /// Session counters only; `catalog` is left zeroed.
    pub fn session_counters(&self) -> ProcessingReport {
        self.report(CatalogStats::default())
    }

    fn report(&self, catalog: CatalogStats) -> ProcessingReport {
        let c = &self.counters;
        ProcessingReport {
            session_id: self.session_id.clone(),
            lines_read: c.lines_read,
            lines_matched: c.lines_matched,
            match_rate: ProcessingReport::compute_match_rate(c.lines_matched, c.lines_read),
            events_emitted: c.events_emitted,
            chunks_recorded: c.chunks_recorded,
            chunks_created: c.chunks_created,
            chunk_write_failures: c.chunk_write_failures,
            skipped_patterns: self.skipped_names.clone(),
            auto_confirmed: c.auto_confirmed,
            escalated: c.escalated,
            catalog,
        }
    }
}

impl Drop for StreamExtractor {
    fn drop(&mut self) {
        if !self.closed && !self.pending.is_empty() {
            self.flush_pending();
        }
    }
}
