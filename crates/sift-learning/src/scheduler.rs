//! Periodic learning runs on the tokio runtime.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use sift_core::config::LearningConfig;

use crate::worker::LearningWorker;

/// Runs `analyze_unknowns` every period until stopped. A failed run is logged
/// and the next tick tries again.
pub struct LearningScheduler {
    task: JoinHandle<()>,
    shutdown: watch::Sender<bool>,
    runs: Arc<AtomicU64>,
}

impl LearningScheduler {
    /// `None` when training is disabled in `config`.
    pub fn start(worker: Arc<LearningWorker>, config: &LearningConfig) -> Option<Self> {
        if !config.enable_training {
            info!("learning scheduler disabled");
            return None;
        }
        let period = Duration::from_secs(config.interval_secs.max(1));
        Some(Self::spawn(worker, period, config.batch_limit))
    }

    /// First run fires one `period` after the call.
    pub fn spawn(worker: Arc<LearningWorker>, period: Duration, batch_limit: usize) -> Self {
        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let runs = Arc::new(AtomicU64::new(0));
        let counter = runs.clone();

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.changed() => break,
                    _ = ticker.tick() => {}
                }
                let worker = worker.clone();
                let result =
                    tokio::task::spawn_blocking(move || worker.analyze_unknowns(batch_limit)).await;
                counter.fetch_add(1, Ordering::Relaxed);
                match result {
                    Ok(Ok(report)) => debug!(
                        chunks_read = report.chunks_read,
                        resolved = report.chunks_resolved,
                        "scheduled learning run finished"
                    ),
                    Ok(Err(e)) => warn!(error = %e, "scheduled learning run failed"),
                    Err(e) => warn!(error = %e, "scheduled learning run panicked"),
                }
            }
            debug!("learning scheduler stopped");
        });

        info!(period_secs = period.as_secs_f64(), batch_limit, "learning scheduler started");
        Self {
            task,
            shutdown,
            runs,
        }
    }

    /// Completed runs, successful or not.
    pub fn runs(&self) -> u64 {
        self.runs.load(Ordering::Relaxed)
    }

    /// Stop after the run in progress, if any.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            warn!(error = %e, "learning scheduler task failed");
        }
    }
}
