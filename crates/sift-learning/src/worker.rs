//! LearningWorker: one `analyze_unknowns` run end to end.
//!
//! read chunks → mask → cluster → qualify → derive + self-check → dedup →
//! register → link chunks.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use regex::Regex;
use tracing::{debug, info};

use sift_catalog::compiled::compile_regex;
use sift_catalog::PatternStore;
use sift_core::chunk::{Chunk, ChunkId};
use sift_core::config::LearningConfig;
use sift_core::constants::MAX_LEARNING_BATCH;
use sift_core::errors::{SiftError, SiftResult};
use sift_core::models::{LearningReport, ProposedPattern};
use sift_core::pattern::{Pattern, PatternCategory, PatternDefinition, PatternId, ProposedBy};
use sift_observability::events;

use crate::calibration::learned_confidence;
use crate::clustering::{cluster, Cluster};
use crate::derivation::{categorize, default_routing, derive_regex, learned_name, template_text};
use crate::masking::mask_line;

/// Share of positions a line must share with a cluster template to join it.
pub const MIN_SIMILARITY: f64 = 0.5;

/// Example lines kept per proposal.
const MAX_EXAMPLES: usize = 3;

#[derive(Debug, Clone)]
pub struct LearningOptions {
    pub min_group_size: usize,
    pub min_literal_ratio: f64,
    pub min_similarity: f64,
    pub max_write_attempts: u32,
}

impl Default for LearningOptions {
    fn default() -> Self {
        Self::from_config(&LearningConfig::default())
    }
}

impl LearningOptions {
    pub fn from_config(config: &LearningConfig) -> Self {
        Self {
            min_group_size: config.min_group_size.max(1),
            min_literal_ratio: config.min_literal_ratio,
            min_similarity: MIN_SIMILARITY,
            max_write_attempts: config.max_write_attempts.max(1),
        }
    }
}

/// How a qualifying cluster ended up.
enum Resolution {
    Linked(ProposedPattern),
    /// Left unanalyzed; a later run will see it again.
    Deferred,
}

/// Proposes patterns from unexplained output. Safe to run concurrently with
/// live extraction and to re-run on the same data.
///
/// Batches rotate through the unanalyzed chunks by id, so chunks that never
/// qualify cannot keep newer ones out of every batch. The position is held
/// in memory and starts over with each worker.
pub struct LearningWorker {
    catalog: Arc<PatternStore>,
    options: LearningOptions,
    /// Last chunk id the previous batch reached.
    resume_after: AtomicI64,
}

impl LearningWorker {
    pub fn new(catalog: Arc<PatternStore>, options: LearningOptions) -> Self {
        Self {
            catalog,
            options,
            resume_after: AtomicI64::new(0),
        }
    }

    pub fn from_config(catalog: Arc<PatternStore>, config: &LearningConfig) -> Self {
        Self::new(catalog, LearningOptions::from_config(config))
    }

    pub fn options(&self) -> &LearningOptions {
        &self.options
    }

    /// Analyze up to `limit` unanalyzed chunks, continuing after the last
    /// batch and wrapping around to the oldest.
    ///
    /// Fails only when the chunk store cannot be read. Write failures after
    /// bounded retries are counted in the report and the affected chunks stay
    /// unanalyzed.
    pub fn analyze_unknowns(&self, limit: usize) -> SiftResult<LearningReport> {
        let span = sift_observability::learning_span!(limit);
        let _entered = span.enter();
        let started_at = Utc::now();
        let mut report = LearningReport::empty(started_at);

        let limit = limit.min(MAX_LEARNING_BATCH);
        if limit == 0 {
            return Ok(report);
        }
        let chunks = self.next_batch(limit)?;
        report.chunks_read = chunks.len();

        let masked: Vec<_> = chunks.iter().map(|c| mask_line(&c.text)).collect();
        let clusters = cluster(&masked, self.options.min_similarity);
        report.groups_found = clusters.len();

        for c in &clusters {
            if !self.qualifies(c) {
                continue;
            }
            report.groups_qualified += 1;
            match self.resolve(c, &chunks, &mut report) {
                Resolution::Linked(proposed) => {
                    report.chunks_resolved += proposed.group_size;
                    report.proposed.push(proposed);
                }
                Resolution::Deferred => {}
            }
        }

        report.chunks_deferred = report.chunks_read - report.chunks_resolved;
        let finished_at = Utc::now();
        report.finished_at = finished_at;
        report.duration_ms = (finished_at - started_at).num_milliseconds().max(0) as u64;
        events::learning_completed(
            report.chunks_read,
            report.newly_proposed().count(),
            report.chunks_resolved,
            report.duration_ms,
        );
        Ok(report)
    }

    fn next_batch(&self, limit: usize) -> SiftResult<Vec<Chunk>> {
        let storage = self.catalog.chunk_storage();
        let after = self.resume_after.load(Ordering::Relaxed);
        let mut chunks = self.with_retries("list_unanalyzed", || {
            storage.list_unanalyzed_after(after, limit)
        })?;
        if chunks.len() < limit && after > 0 {
            let remaining = limit - chunks.len();
            let wrapped = self.with_retries("list_unanalyzed", || {
                storage.list_unanalyzed_after(0, remaining)
            })?;
            chunks.extend(wrapped.into_iter().filter(|c| c.id <= after));
        }
        let reached = chunks.last().map_or(0, |c| c.id);
        self.resume_after.store(reached, Ordering::Relaxed);
        debug!(after, reached, read = chunks.len(), "learning batch selected");
        Ok(chunks)
    }

    fn qualifies(&self, c: &Cluster) -> bool {
        c.size() >= self.options.min_group_size
            && c.literal_ratio() >= self.options.min_literal_ratio
    }

    fn resolve(&self, c: &Cluster, chunks: &[Chunk], report: &mut LearningReport) -> Resolution {
        let members: Vec<&Chunk> = c.members.iter().map(|&i| &chunks[i]).collect();
        let ids: Vec<ChunkId> = members.iter().map(|m| m.id).collect();
        let examples: Vec<String> = members
            .iter()
            .take(MAX_EXAMPLES)
            .map(|m| m.text.clone())
            .collect();
        let literal_ratio = c.literal_ratio();

        // A pattern registered since these chunks were recorded may already cover them.
        if let Some(existing) = self.existing_cover(&members) {
            return self.link(existing, &ids, literal_ratio, examples, true, report);
        }

        let regex_source = derive_regex(&c.template);
        let Ok(regex) = compile_regex(&regex_source) else {
            debug!(regex = %regex_source, "derived expression does not compile");
            return Resolution::Deferred;
        };
        if let Some(reason) = self_check(&regex, c, chunks) {
            debug!(
                template = %template_text(&c.template),
                reason,
                "candidate rejected"
            );
            return Resolution::Deferred;
        }

        let name = learned_name(&c.template, &regex_source);
        if let Ok(existing) = self.catalog.get(&name) {
            return self.link(
                CoverInfo::from_pattern(&existing),
                &ids,
                literal_ratio,
                examples,
                true,
                report,
            );
        }

        let category = categorize(&template_text(&c.template));
        let (action, target_worker) = default_routing(category);
        let confidence = learned_confidence(c.size(), literal_ratio);
        let mut def = PatternDefinition::new(name.clone(), regex_source.clone(), category)
            .with_confidence(confidence);
        def.action = Some(action.to_string());
        def.target_worker = Some(target_worker.to_string());
        def.proposed_by = ProposedBy::Learned;

        let registered = self.with_retries("register", || self.catalog.register(def.clone()));
        let (id, reused) = match registered {
            Ok(id) => (id, false),
            // Another run registered the same name first.
            Err(e @ SiftError::InvalidPattern { .. }) => match self.catalog.get(&name) {
                Ok(p) => (p.id, true),
                Err(_) => {
                    debug!(pattern = %name, error = %e, "learned pattern rejected");
                    return Resolution::Deferred;
                }
            },
            Err(e) => {
                note_failure("register", &e, report);
                return Resolution::Deferred;
            }
        };

        let cover = CoverInfo {
            id,
            name,
            regex: regex_source,
            category,
            confidence,
        };
        self.link(cover, &ids, literal_ratio, examples, reused, report)
    }

    /// First catalog pattern, in match order, that matches every member.
    fn existing_cover(&self, members: &[&Chunk]) -> Option<CoverInfo> {
        let snapshot = self.catalog.snapshot();
        snapshot
            .patterns()
            .iter()
            .find(|compiled| members.iter().all(|m| compiled.is_match(&m.text)))
            .map(|compiled| CoverInfo::from_pattern(&compiled.pattern))
    }

    fn link(
        &self,
        cover: CoverInfo,
        ids: &[ChunkId],
        literal_ratio: f64,
        examples: Vec<String>,
        reused_existing: bool,
        report: &mut LearningReport,
    ) -> Resolution {
        let linked = self.with_retries("mark_analyzed_batch", || {
            self.catalog
                .chunk_storage()
                .mark_analyzed_batch(ids, Some(cover.id))
        });
        if let Err(e) = linked {
            note_failure("mark_analyzed_batch", &e, report);
            return Resolution::Deferred;
        }
        if reused_existing {
            debug!(pattern = %cover.name, chunks = ids.len(), "chunks linked to existing pattern");
        } else {
            info!(
                pattern = %cover.name,
                regex = %cover.regex,
                confidence = cover.confidence,
                chunks = ids.len(),
                "learned pattern proposed"
            );
        }
        Resolution::Linked(ProposedPattern {
            pattern_id: cover.id,
            name: cover.name,
            regex: cover.regex,
            category: cover.category,
            confidence: cover.confidence,
            group_size: ids.len(),
            literal_ratio,
            examples,
            reused_existing,
        })
    }

    /// Retry storage failures up to `max_write_attempts`; other errors return at once.
    fn with_retries<T>(
        &self,
        operation: &str,
        mut f: impl FnMut() -> SiftResult<T>,
    ) -> SiftResult<T> {
        let attempts = self.options.max_write_attempts.max(1);
        let mut attempt = 1;
        loop {
            match f() {
                Ok(value) => return Ok(value),
                Err(e) if e.is_persistence() && attempt < attempts => {
                    debug!(operation, attempt, error = %e, "storage operation failed; retrying");
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn note_failure(operation: &str, error: &SiftError, report: &mut LearningReport) {
    report.persistence_failures += 1;
    events::persistence_degraded("learning", operation, &error.to_string());
}

/// The pattern a cluster gets linked to.
struct CoverInfo {
    id: PatternId,
    name: String,
    regex: String,
    category: PatternCategory,
    confidence: f64,
}

impl CoverInfo {
    fn from_pattern(p: &Pattern) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            regex: p.regex.clone(),
            category: p.category,
            confidence: p.confidence.value(),
        }
    }
}

/// `None` when the expression matches every member and no chunk outside
/// the cluster; otherwise the reason it fails.
fn self_check(regex: &Regex, c: &Cluster, chunks: &[Chunk]) -> Option<&'static str> {
    let mut is_member = vec![false; chunks.len()];
    for &i in &c.members {
        is_member[i] = true;
    }
    for (i, chunk) in chunks.iter().enumerate() {
        let matched = regex.is_match(&chunk.text);
        if is_member[i] && !matched {
            return Some("does not match every member");
        }
        if !is_member[i] && matched {
            return Some("matches chunks outside the group");
        }
    }
    None
}
