//! Daemon wiring: storage, catalog, sessions, learning scheduler, HTTP.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use anyhow::Context;
use tokio::io::BufReader;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, warn};

use sift_catalog::PatternStore;
use sift_core::config::SiftConfig;
use sift_extractor::{spawn_session, SessionHandle, SessionOptions};
use sift_learning::{LearningScheduler, LearningWorker};
use sift_storage::StorageEngine;

use crate::http::{self, AppState};
use crate::registry::SessionRegistry;

/// `name=path`: a session id and the file (or FIFO) its output is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSource {
    pub id: String,
    pub path: PathBuf,
}

impl FromStr for SessionSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (id, path) = s
            .split_once('=')
            .ok_or_else(|| format!("expected NAME=PATH, got {s:?}"))?;
        let id = id.trim();
        let path = path.trim();
        if id.is_empty() || path.is_empty() {
            return Err(format!("expected NAME=PATH, got {s:?}"));
        }
        Ok(Self {
            id: id.to_string(),
            path: PathBuf::from(path),
        })
    }
}

pub struct Daemon {
    config: SiftConfig,
    catalog: Arc<PatternStore>,
    registry: Arc<SessionRegistry>,
    scheduler: Option<LearningScheduler>,
}

impl Daemon {
    /// Open storage and the catalog, then apply the config's seed patterns.
    pub fn open(config: SiftConfig) -> anyhow::Result<Self> {
        let engine = Arc::new(
            StorageEngine::from_config(&config.storage)
                .with_context(|| format!("opening storage at {}", config.storage.db_path))?,
        );
        let catalog = Arc::new(PatternStore::open(engine).context("opening pattern store")?);
        if !config.patterns.is_empty() {
            let report = catalog
                .load_definitions(&config.patterns)
                .context("loading seed patterns from config")?;
            info!(applied = report.applied, total = report.total, "seed patterns loaded");
        }
        Ok(Self {
            config,
            catalog,
            registry: Arc::new(SessionRegistry::new()),
            scheduler: None,
        })
    }

    pub fn config(&self) -> &SiftConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Arc<PatternStore> {
        &self.catalog
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Apply a catalog file on top of the current catalog.
    pub fn load_catalog(&self, path: &Path) -> anyhow::Result<()> {
        let report = self
            .catalog
            .reload(path)
            .with_context(|| format!("loading catalog {}", path.display()))?;
        info!(path = %path.display(), applied = report.applied, "catalog loaded");
        Ok(())
    }

    /// Start a session reading `source.path` to end of input.
    pub async fn attach(&self, source: &SessionSource) -> anyhow::Result<Arc<SessionHandle>> {
        let file = tokio::fs::File::open(&source.path)
            .await
            .with_context(|| format!("opening session output {}", source.path.display()))?;
        let handle = spawn_session(
            source.id.clone(),
            BufReader::new(file),
            self.catalog.clone(),
            SessionOptions::from_config(&self.config),
        );
        Ok(self.registry.insert(handle)?)
    }

    /// Start the periodic learning runs if the config enables them.
    pub fn start_learning(&mut self) {
        if self.scheduler.is_some() {
            return;
        }
        let worker = Arc::new(LearningWorker::from_config(
            self.catalog.clone(),
            &self.config.learning,
        ));
        self.scheduler = LearningScheduler::start(worker, &self.config.learning);
    }

    pub fn app_state(&self) -> Arc<AppState> {
        Arc::new(AppState {
            registry: self.registry.clone(),
            catalog: self.catalog.clone(),
            default_events_limit: self.config.server.default_events_limit,
        })
    }

    /// Serve HTTP until `shutdown` turns true, then stop everything.
    pub async fn run(self, shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
        let listen = self.config.server.listen.clone();
        let listener = TcpListener::bind(listen.as_str())
            .await
            .with_context(|| format!("binding {listen}"))?;
        let served = http::serve(listener, self.app_state(), shutdown).await;
        self.shutdown().await;
        served.context("HTTP server error")
    }

    /// Stop learning, stop sessions, flush match history.
    pub async fn shutdown(self) {
        if let Some(scheduler) = self.scheduler {
            scheduler.stop().await;
        }
        self.registry.stop_all().await;
        if let Err(e) = self.catalog.flush_match_history() {
            warn!(error = %e, "match history flush failed at shutdown");
        }
        info!("daemon stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_source_parses_name_and_path() {
        let source: SessionSource = "agent-1=/tmp/agent-1.log".parse().unwrap();
        assert_eq!(source.id, "agent-1");
        assert_eq!(source.path, PathBuf::from("/tmp/agent-1.log"));

        assert!("no-separator".parse::<SessionSource>().is_err());
        assert!("=/tmp/x".parse::<SessionSource>().is_err());
        assert!("name=".parse::<SessionSource>().is_err());
    }

    #[test]
    fn seed_patterns_come_from_config() {
        let config = SiftConfig {
            storage: sift_core::config::StorageConfig {
                db_path: ":memory:".to_string(),
                ..Default::default()
            },
            patterns: test_fixtures::catalog_definitions(),
            ..Default::default()
        };
        let daemon = Daemon::open(config).unwrap();
        assert_eq!(daemon.catalog().list().len(), 8);
    }
}
