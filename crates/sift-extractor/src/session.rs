//! Async session worker: tails a reader, feeds the extractor, publishes events.
//!
//! The worker suspends on the read. Shutdown is cooperative: a stop request
//! is only observed between lines, so the current line is always finished
//! and the chunk-in-progress flushed before the worker exits.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{warn, Instrument};

use sift_catalog::PatternStore;
use sift_core::config::SiftConfig;
use sift_core::event::ExtractionEvent;
use sift_core::models::{DecisionRecord, ProcessingReport};
use sift_core::pattern::PatternCategory;
use sift_observability::events;

use crate::extractor::{ExtractorOptions, StreamExtractor};
use crate::history::History;

/// Per-session knobs beyond the extractor's own.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub extractor: ExtractorOptions,
    pub event_history: usize,
    pub decision_history: usize,
    pub broadcast_capacity: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::from_config(&SiftConfig::default())
    }
}

impl SessionOptions {
    pub fn from_config(config: &SiftConfig) -> Self {
        Self {
            extractor: ExtractorOptions::from_config(config),
            event_history: config.extractor.event_history,
            decision_history: config.extractor.decision_history,
            broadcast_capacity: config.extractor.broadcast_capacity.max(1),
        }
    }
}

/// State shared between the worker and its handle.
struct Shared {
    events: Mutex<History<ExtractionEvent>>,
    decisions: Mutex<History<DecisionRecord>>,
    counters: Mutex<ProcessingReport>,
    running: Mutex<bool>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Handle to a running (or finished) session worker.
pub struct SessionHandle {
    id: String,
    started_at: DateTime<Utc>,
    catalog: Arc<PatternStore>,
    shared: Arc<Shared>,
    broadcast: broadcast::Sender<ExtractionEvent>,
    shutdown: watch::Sender<bool>,
    task: Mutex<Option<JoinHandle<ProcessingReport>>>,
}

/// Start a worker for `session_id` reading lines from `reader`.
/// Must be called inside a tokio runtime.
pub fn spawn_session<R>(
    session_id: impl Into<String>,
    reader: R,
    catalog: Arc<PatternStore>,
    options: SessionOptions,
) -> SessionHandle
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    let id = session_id.into();
    let shared = Arc::new(Shared {
        events: Mutex::new(History::new(options.event_history)),
        decisions: Mutex::new(History::new(options.decision_history)),
        counters: Mutex::new(ProcessingReport {
            session_id: id.clone(),
            ..Default::default()
        }),
        running: Mutex::new(true),
    });
    let (broadcast_tx, _) = broadcast::channel(options.broadcast_capacity);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let extractor = StreamExtractor::new(id.clone(), catalog.clone(), options.extractor);
    let span = sift_observability::session_span!(id);
    let task = tokio::spawn(
        run_worker(
            extractor,
            reader,
            shared.clone(),
            broadcast_tx.clone(),
            shutdown_rx,
        )
        .instrument(span),
    );
    events::session_lifecycle(&id, "started");

    SessionHandle {
        id,
        started_at: Utc::now(),
        catalog,
        shared,
        broadcast: broadcast_tx,
        shutdown: shutdown_tx,
        task: Mutex::new(Some(task)),
    }
}

async fn run_worker<R>(
    mut extractor: StreamExtractor,
    mut reader: R,
    shared: Arc<Shared>,
    broadcast: broadcast::Sender<ExtractionEvent>,
    mut shutdown: watch::Receiver<bool>,
) -> ProcessingReport
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    loop {
        if *shutdown.borrow() {
            break;
        }
        let read = tokio::select! {
            biased;
            _ = shutdown.changed() => None,
            read = reader.read_until(b'\n', &mut buf) => Some(read),
        };
        match read {
            None | Some(Ok(0)) => break,
            Some(Ok(_)) => {
                strip_newline(&mut buf);
                handle_line(&mut extractor, &buf, &shared, &broadcast);
                buf.clear();
            }
            Some(Err(e)) => {
                warn!(session_id = %extractor.session_id(), error = %e, "session read failed; stopping");
                break;
            }
        }
    }

    // A final line without a newline is still output.
    if !buf.is_empty() {
        strip_newline(&mut buf);
        handle_line(&mut extractor, &buf, &shared, &broadcast);
    }

    let report = extractor.close();
    *lock(&shared.counters) = report.clone();
    *lock(&shared.running) = false;
    events::session_lifecycle(extractor.session_id(), "stopped");
    report
}

fn strip_newline(buf: &mut Vec<u8>) {
    if buf.last() == Some(&b'\n') {
        buf.pop();
    }
}

fn handle_line(
    extractor: &mut StreamExtractor,
    raw: &[u8],
    shared: &Shared,
    broadcast: &broadcast::Sender<ExtractionEvent>,
) {
    let emitted = match extractor.process_bytes(raw) {
        Ok(emitted) => emitted,
        Err(e) => {
            warn!(session_id = %extractor.session_id(), error = %e, "line dropped");
            return;
        }
    };
    if let Some(decision) = extractor.take_decision() {
        lock(&shared.decisions).push(decision);
    }
    if !emitted.is_empty() {
        let mut history = lock(&shared.events);
        for event in &emitted {
            history.push(event.clone());
        }
    }
    for event in emitted {
        // No subscribers is fine.
        let _ = broadcast.send(event);
    }
    *lock(&shared.counters) = extractor.session_counters();
}

impl SessionHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn is_running(&self) -> bool {
        *lock(&self.shared.running)
    }

    /// Up to `limit` most recent events, optionally of one category, oldest first.
    pub fn recent_events(
        &self,
        limit: usize,
        event_type: Option<PatternCategory>,
    ) -> Vec<ExtractionEvent> {
        lock(&self.shared.events)
            .recent_matching(limit, |e| event_type.map_or(true, |t| e.event_type == t))
    }

    /// Up to `limit` most recent auto-confirm decisions, oldest first.
    pub fn recent_decisions(&self, limit: usize) -> Vec<DecisionRecord> {
        lock(&self.shared.decisions).recent(limit)
    }

    /// Live events from now on. Slow receivers see `Lagged` and skip ahead.
    pub fn subscribe(&self) -> broadcast::Receiver<ExtractionEvent> {
        self.broadcast.subscribe()
    }

    /// Session counters merged with current catalog aggregates.
    pub fn stats(&self) -> ProcessingReport {
        let mut report = lock(&self.shared.counters).clone();
        match self.catalog.stats() {
            Ok(stats) => report.catalog = stats,
            Err(e) => warn!(session_id = %self.id, error = %e, "catalog stats unavailable"),
        }
        report
    }

    /// Ask the worker to stop after the current line and wait for it.
    pub async fn stop(&self) -> ProcessingReport {
        let _ = self.shutdown.send(true);
        self.wait().await
    }

    /// Wait for the worker to finish on its own (end of input).
    pub async fn wait(&self) -> ProcessingReport {
        let task = lock(&self.task).take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!(session_id = %self.id, error = %e, "session worker panicked");
                *lock(&self.shared.running) = false;
            }
        }
        self.stats()
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
    }
}
