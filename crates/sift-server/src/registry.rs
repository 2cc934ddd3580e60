//! Live sessions by id.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tracing::{debug, info};

use sift_core::errors::{SiftError, SiftResult};
use sift_extractor::SessionHandle;

/// One row of `GET /agents`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentSummary {
    pub id: String,
    pub running: bool,
    pub started_at: DateTime<Utc>,
    pub lines_read: u64,
    pub events_emitted: u64,
    pub match_rate: f64,
}

/// Concurrent map of session handles. Finished sessions stay registered so
/// their history can still be read.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<String, Arc<SessionHandle>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a started session. Ids are unique.
    pub fn insert(&self, handle: SessionHandle) -> SiftResult<Arc<SessionHandle>> {
        let id = handle.id().to_string();
        match self.sessions.entry(id) {
            dashmap::mapref::entry::Entry::Occupied(e) => Err(SiftError::ConfigError(format!(
                "session already registered: {}",
                e.key()
            ))),
            dashmap::mapref::entry::Entry::Vacant(e) => {
                let handle = Arc::new(handle);
                info!(session_id = %e.key(), "session registered");
                e.insert(handle.clone());
                Ok(handle)
            }
        }
    }

    pub fn get(&self, id: &str) -> SiftResult<Arc<SessionHandle>> {
        self.sessions
            .get(id)
            .map(|h| h.value().clone())
            .ok_or_else(|| SiftError::SessionNotFound { id: id.to_string() })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sessions.contains_key(id)
    }

    pub fn remove(&self, id: &str) -> Option<Arc<SessionHandle>> {
        let removed = self.sessions.remove(id).map(|(_, h)| h);
        if removed.is_some() {
            debug!(session_id = %id, "session unregistered");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Summaries sorted by id.
    pub fn list(&self) -> Vec<AgentSummary> {
        let mut agents: Vec<AgentSummary> = self
            .sessions
            .iter()
            .map(|entry| {
                let handle = entry.value();
                let stats = handle.stats();
                AgentSummary {
                    id: handle.id().to_string(),
                    running: handle.is_running(),
                    started_at: handle.started_at(),
                    lines_read: stats.lines_read,
                    events_emitted: stats.events_emitted,
                    match_rate: stats.match_rate,
                }
            })
            .collect();
        agents.sort_by(|a, b| a.id.cmp(&b.id));
        agents
    }

    /// Stop every session and wait for its worker to flush.
    pub async fn stop_all(&self) {
        let handles: Vec<Arc<SessionHandle>> =
            self.sessions.iter().map(|e| e.value().clone()).collect();
        for handle in handles {
            let report = handle.stop().await;
            debug!(session_id = %handle.id(), lines = report.lines_read, "session stopped");
        }
    }
}
