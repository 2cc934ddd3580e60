//! PatternStore: serialized writes, snapshot reads.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use chrono::Utc;
use dashmap::DashMap;
use serde::Serialize;
use tracing::{debug, warn};

use sift_core::errors::{SiftError, SiftResult};
use sift_core::models::{CatalogStats, EvaluationReport, LabeledSample, MatchRecord};
use sift_core::pattern::{Pattern, PatternCategory, PatternDefinition, PatternId};
use sift_core::traits::{IChunkStorage, IPatternStorage};
use sift_observability::events;
use sift_storage::MatchWriter;

use crate::evaluation;
use crate::snapshot::CatalogSnapshot;
use crate::toml_catalog::TomlCatalogLoader;
use crate::validation::{check_unit_range, validate_batch, validate_definition};

/// Outcome of applying a catalog file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReloadReport {
    pub version: u64,
    /// Definitions applied from the file.
    pub applied: usize,
    /// Patterns in the published snapshot.
    pub total: usize,
}

/// The catalog. Cheap to share behind an `Arc`.
pub struct PatternStore {
    patterns: Arc<dyn IPatternStorage>,
    chunks: Arc<dyn IChunkStorage>,
    snapshot: RwLock<Arc<CatalogSnapshot>>,
    /// Serializes register / mark_tested / remove / reload.
    write_lock: Mutex<()>,
    version: AtomicU64,
    match_counts: DashMap<PatternId, u64>,
    total_matches: AtomicU64,
    match_writer: Option<MatchWriter>,
}

impl PatternStore {
    /// Open the catalog over a storage backend and publish the first snapshot.
    /// Match history is written in the background.
    pub fn open<S>(storage: Arc<S>) -> SiftResult<Self>
    where
        S: IPatternStorage + IChunkStorage + 'static,
    {
        let writer = MatchWriter::new(storage.clone());
        Self::build(storage.clone(), storage, Some(writer))
    }

    /// Same as [`open`](Self::open) without match history rows. Counters
    /// still advance in memory.
    pub fn open_without_history<S>(storage: Arc<S>) -> SiftResult<Self>
    where
        S: IPatternStorage + IChunkStorage + 'static,
    {
        Self::build(storage.clone(), storage, None)
    }

    /// Open with separate pattern and chunk backends.
    pub fn with_backends(
        patterns: Arc<dyn IPatternStorage>,
        chunks: Arc<dyn IChunkStorage>,
        record_history: bool,
    ) -> SiftResult<Self> {
        let writer = record_history.then(|| MatchWriter::new(patterns.clone()));
        Self::build(patterns, chunks, writer)
    }

    fn build(
        patterns: Arc<dyn IPatternStorage>,
        chunks: Arc<dyn IChunkStorage>,
        match_writer: Option<MatchWriter>,
    ) -> SiftResult<Self> {
        let total_matches = patterns.count_matches()?;
        let store = Self {
            patterns,
            chunks,
            snapshot: RwLock::new(Arc::new(CatalogSnapshot::empty())),
            write_lock: Mutex::new(()),
            version: AtomicU64::new(0),
            match_counts: DashMap::new(),
            total_matches: AtomicU64::new(total_matches),
            match_writer,
        };
        let snapshot = store.publish()?;
        for compiled in snapshot.patterns() {
            store
                .match_counts
                .insert(compiled.pattern.id, compiled.pattern.match_count);
        }
        Ok(store)
    }

    // --- Reads ---

    /// The current snapshot. Holders keep a consistent view across later writes.
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        self.snapshot
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn get(&self, name: &str) -> SiftResult<Pattern> {
        self.snapshot()
            .get(name)
            .map(|c| self.with_live_count(c.pattern.clone()))
            .ok_or_else(|| SiftError::PatternNotFound {
                name: name.to_string(),
            })
    }

    pub fn get_by_id(&self, id: PatternId) -> SiftResult<Pattern> {
        self.snapshot()
            .get_by_id(id)
            .map(|c| self.with_live_count(c.pattern.clone()))
            .ok_or(SiftError::PatternIdNotFound { id })
    }

    /// Patterns of one category, in match order.
    pub fn list_by_category(&self, category: PatternCategory) -> Vec<Pattern> {
        self.snapshot()
            .by_category(category)
            .map(|p| self.with_live_count(p.clone()))
            .collect()
    }

    /// Every pattern, in match order.
    pub fn list(&self) -> Vec<Pattern> {
        self.snapshot()
            .patterns()
            .iter()
            .map(|c| self.with_live_count(c.pattern.clone()))
            .collect()
    }

    /// Aggregate counters. Match totals come from the in-memory counters, so
    /// they are current even while history rows are still queued.
    pub fn stats(&self) -> SiftResult<CatalogStats> {
        let snapshot = self.snapshot();
        let chunks = self.chunks.chunk_counts()?;
        Ok(CatalogStats {
            total_patterns: snapshot.len() as u64,
            tested_patterns: snapshot.tested_count() as u64,
            total_matches: self.total_matches.load(Ordering::Relaxed),
            unknown_chunks: chunks.total,
            analyzed_chunks: chunks.analyzed,
            unanalyzed_chunks: chunks.unanalyzed,
        })
    }

    pub fn match_count(&self, id: PatternId) -> u64 {
        self.match_counts.get(&id).map_or(0, |c| *c)
    }

    // --- Writes ---

    /// Validate and add a pattern. Fails with `InvalidPattern` on a bad
    /// expression, a taken name, or an out-of-range number.
    pub fn register(&self, def: PatternDefinition) -> SiftResult<PatternId> {
        validate_definition(&def)?;
        let _guard = self.lock_writes()?;
        if self.snapshot().get(&def.name).is_some() {
            return Err(SiftError::invalid_pattern(
                &def.name,
                "a pattern with this name already exists",
            ));
        }

        let pattern = Pattern::from_definition(&def);
        let id = self.patterns.insert_pattern(&pattern)?;
        self.match_counts.insert(id, 0);
        self.publish()?;
        events::pattern_registered(
            id,
            &pattern.name,
            pattern.category.as_str(),
            pattern.proposed_by.as_str(),
        );
        Ok(id)
    }

    /// Record an evaluation result and promote the pattern to tested.
    pub fn mark_tested(&self, id: PatternId, success_rate: f64) -> SiftResult<()> {
        let _guard = self.lock_writes()?;
        let name = self
            .snapshot()
            .get_by_id(id)
            .map(|c| c.pattern.name.clone())
            .ok_or(SiftError::PatternIdNotFound { id })?;
        check_unit_range(&name, "test_success_rate", success_rate)?;

        if !self.patterns.mark_pattern_tested(id, success_rate)? {
            return Err(SiftError::PatternIdNotFound { id });
        }
        self.publish()?;
        events::pattern_tested(id, &name, success_rate);
        Ok(())
    }

    pub fn remove(&self, name: &str) -> SiftResult<()> {
        let _guard = self.lock_writes()?;
        let id = self.snapshot().get(name).map(|c| c.pattern.id);
        if !self.patterns.delete_pattern(name)? {
            return Err(SiftError::PatternNotFound {
                name: name.to_string(),
            });
        }
        if let Some(id) = id {
            self.match_counts.remove(&id);
        }
        self.publish()?;
        events::pattern_removed(name);
        Ok(())
    }

    /// Load a catalog file and publish it atomically. The whole file is
    /// validated first; nothing changes if any entry is invalid. Entries are
    /// upserted by name; patterns absent from the file are kept.
    pub fn reload(&self, path: &Path) -> SiftResult<ReloadReport> {
        let span = sift_observability::reload_span!(path.display());
        let _entered = span.enter();
        let defs = TomlCatalogLoader::load_from_file(path)?;
        self.apply_definitions(&path.display().to_string(), &defs)
    }

    /// Apply definitions with reload semantics (used for the startup seed).
    pub fn load_definitions(&self, defs: &[PatternDefinition]) -> SiftResult<ReloadReport> {
        validate_batch(defs)?;
        let enabled: Vec<PatternDefinition> = defs
            .iter()
            .filter(|d| d.is_enabled())
            .cloned()
            .collect();
        self.apply_definitions("<definitions>", &enabled)
    }

    fn apply_definitions(
        &self,
        source: &str,
        defs: &[PatternDefinition],
    ) -> SiftResult<ReloadReport> {
        let patterns: Vec<Pattern> = defs.iter().map(Pattern::from_definition).collect();
        let _guard = self.lock_writes()?;
        let ids = self.patterns.upsert_patterns(&patterns)?;
        for id in &ids {
            self.match_counts.entry(*id).or_insert(0);
        }
        let snapshot = self.publish()?;
        events::catalog_reloaded(source, snapshot.version(), snapshot.len());
        Ok(ReloadReport {
            version: snapshot.version(),
            applied: ids.len(),
            total: snapshot.len(),
        })
    }

    /// Write the current snapshot as a TOML catalog file.
    pub fn export(&self, path: &Path) -> SiftResult<usize> {
        let snapshot = self.snapshot();
        let mut defs: Vec<PatternDefinition> = snapshot
            .patterns()
            .iter()
            .map(|c| c.pattern.to_definition())
            .collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        TomlCatalogLoader::write_to_file(path, &defs)?;
        debug!(path = %path.display(), patterns = defs.len(), "catalog exported");
        Ok(defs.len())
    }

    /// Score a pattern against labeled lines and record the result through
    /// [`mark_tested`](Self::mark_tested).
    pub fn evaluate(&self, name: &str, samples: &[LabeledSample]) -> SiftResult<EvaluationReport> {
        if samples.is_empty() {
            return Err(SiftError::invalid_pattern(
                name,
                "evaluation needs at least one labeled sample",
            ));
        }
        let snapshot = self.snapshot();
        let compiled = snapshot.get(name).ok_or_else(|| SiftError::PatternNotFound {
            name: name.to_string(),
        })?;
        let report = evaluation::score(compiled, samples);
        self.mark_tested(compiled.pattern.id, report.success_rate)?;
        Ok(report)
    }

    // --- Match accounting ---

    /// Count a match. Never blocks and never fails: the history row is queued
    /// and dropped with a warning if the writer cannot take it.
    pub fn record_match(&self, pattern: &Pattern, session_id: &str, matched_text: &str) {
        *self.match_counts.entry(pattern.id).or_insert(0) += 1;
        self.total_matches.fetch_add(1, Ordering::Relaxed);
        if let Some(writer) = &self.match_writer {
            writer.record(MatchRecord {
                pattern_id: pattern.id,
                pattern_name: pattern.name.clone(),
                session_id: session_id.to_string(),
                matched_text: matched_text.to_string(),
                timestamp: Utc::now(),
            });
        }
    }

    /// Wait until queued history rows are written.
    pub fn flush_match_history(&self) -> SiftResult<()> {
        match &self.match_writer {
            Some(writer) => writer.flush(),
            None => Ok(()),
        }
    }

    pub fn chunk_storage(&self) -> &Arc<dyn IChunkStorage> {
        &self.chunks
    }

    pub fn pattern_storage(&self) -> &Arc<dyn IPatternStorage> {
        &self.patterns
    }

    // --- Internals ---

    fn lock_writes(&self) -> SiftResult<MutexGuard<'_, ()>> {
        self.write_lock.lock().map_err(|_| {
            SiftError::ConfigError("pattern store write lock poisoned".to_string())
        })
    }

    /// Rebuild from storage and swap. Callers hold the write lock.
    fn publish(&self) -> SiftResult<Arc<CatalogSnapshot>> {
        let patterns = self.patterns.list_patterns()?;
        let version = self.version.fetch_add(1, Ordering::SeqCst) + 1;
        let snapshot = Arc::new(CatalogSnapshot::build(version, patterns));
        for broken in snapshot.patterns().iter().filter(|c| !c.is_valid()) {
            warn!(
                pattern = %broken.pattern.name,
                error = broken.compile_error().unwrap_or_default(),
                "stored pattern does not compile; it will be skipped"
            );
        }
        let mut slot = self
            .snapshot
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = snapshot.clone();
        Ok(snapshot)
    }

    fn with_live_count(&self, mut pattern: Pattern) -> Pattern {
        pattern.match_count = self.match_count(pattern.id);
        pattern
    }
}
