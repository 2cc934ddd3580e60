//! HTTP surface over the session registry and the shared catalog.
//!
//! Every session-scoped route takes `?agent=<id>`. Catalog writes also take
//! it and fail with 404 for an unknown agent, even though the catalog they
//! change is shared.

use std::path::Path;
use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;

use sift_catalog::{PatternStore, ReloadReport};
use sift_core::models::{EvaluationReport, LabeledSample, ProcessingReport};
use sift_core::pattern::{PatternCategory, PatternDefinition};
use sift_extractor::SessionHandle;

use crate::error::ApiError;
use crate::registry::SessionRegistry;

/// Shared state for HTTP handlers.
pub struct AppState {
    pub registry: Arc<SessionRegistry>,
    pub catalog: Arc<PatternStore>,
    /// `GET /events` and `GET /auto-confirm` limit when the query has none.
    pub default_events_limit: usize,
}

impl AppState {
    fn session(&self, agent: Option<&str>) -> Result<Arc<SessionHandle>, ApiError> {
        let agent = agent
            .filter(|a| !a.is_empty())
            .ok_or_else(|| ApiError::bad_request("missing query parameter: agent"))?;
        Ok(self.registry.get(agent)?)
    }
}

type ApiResult<T> = Result<T, ApiError>;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/agents", get(agents_handler))
        .route("/events", get(events_handler))
        .route("/stats", get(stats_handler))
        .route("/patterns", get(patterns_handler))
        .route("/patterns/add", post(add_pattern_handler))
        .route("/patterns/remove", post(remove_pattern_handler))
        .route("/patterns/evaluate", post(evaluate_pattern_handler))
        .route("/config/reload", post(reload_handler))
        .route("/auto-confirm", get(auto_confirm_handler))
        .with_state(state)
}

/// Serve on `listener` until `shutdown` turns true.
pub async fn serve(
    listener: TcpListener,
    state: Arc<AppState>,
    mut shutdown: watch::Receiver<bool>,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(addr = %addr, "starting HTTP server");
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            let _ = shutdown.wait_for(|&v| v).await;
        })
        .await
}

// ── Query and body extraction ──

#[derive(Debug, Deserialize)]
struct AgentParams {
    agent: Option<String>,
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct EventParams {
    agent: Option<String>,
    limit: Option<usize>,
    #[serde(rename = "type")]
    event_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PatternParams {
    agent: Option<String>,
    pattern: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReloadParams {
    agent: Option<String>,
    config: Option<String>,
}

fn query<T>(q: Result<Query<T>, QueryRejection>) -> ApiResult<T> {
    q.map(|Query(params)| params)
        .map_err(|e| ApiError::bad_request(e.body_text()))
}

fn body<T>(b: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    b.map(|Json(value)| value)
        .map_err(|e| ApiError::bad_request(e.body_text()))
}

fn required<'a>(value: &'a Option<String>, name: &str) -> ApiResult<&'a str> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::bad_request(format!("missing query parameter: {name}")))
}

// ── Handlers ──

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    let snapshot = state.catalog.snapshot();
    Json(json!({
        "status": "ok",
        "catalog_version": snapshot.version(),
        "patterns": snapshot.len(),
        "sessions": state.registry.len(),
    }))
}

async fn agents_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({ "agents": state.registry.list() }))
}

async fn events_handler(
    State(state): State<Arc<AppState>>,
    params: Result<Query<EventParams>, QueryRejection>,
) -> ApiResult<Json<Value>> {
    let params = query(params)?;
    let session = state.session(params.agent.as_deref())?;
    let event_type = match params.event_type.as_deref() {
        None | Some("") => None,
        Some(t) => Some(
            PatternCategory::parse_str(t)
                .ok_or_else(|| ApiError::bad_request(format!("unknown event type: {t}")))?,
        ),
    };
    let limit = params.limit.unwrap_or(state.default_events_limit);
    let events = session.recent_events(limit, event_type);
    Ok(Json(json!({
        "agent": session.id(),
        "count": events.len(),
        "events": events,
    })))
}

async fn stats_handler(
    State(state): State<Arc<AppState>>,
    params: Result<Query<AgentParams>, QueryRejection>,
) -> ApiResult<Json<ProcessingReport>> {
    let params = query(params)?;
    let session = state.session(params.agent.as_deref())?;
    Ok(Json(session.stats()))
}

async fn patterns_handler(
    State(state): State<Arc<AppState>>,
    params: Result<Query<AgentParams>, QueryRejection>,
) -> ApiResult<Json<Value>> {
    let params = query(params)?;
    let session = state.session(params.agent.as_deref())?;
    let snapshot = state.catalog.snapshot();
    let patterns: Vec<_> = snapshot
        .patterns()
        .iter()
        .map(|compiled| {
            let mut pattern = compiled.pattern.clone();
            pattern.match_count = state.catalog.match_count(pattern.id);
            pattern
        })
        .collect();
    Ok(Json(json!({
        "agent": session.id(),
        "version": snapshot.version(),
        "patterns": patterns,
    })))
}

async fn add_pattern_handler(
    State(state): State<Arc<AppState>>,
    params: Result<Query<AgentParams>, QueryRejection>,
    def: Result<Json<PatternDefinition>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let params = query(params)?;
    state.session(params.agent.as_deref())?;
    let def = body(def)?;
    let name = def.name.clone();
    let id = state.catalog.register(def)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "id": id, "name": name, "version": state.catalog.snapshot().version() })),
    ))
}

async fn remove_pattern_handler(
    State(state): State<Arc<AppState>>,
    params: Result<Query<PatternParams>, QueryRejection>,
) -> ApiResult<Json<Value>> {
    let params = query(params)?;
    state.session(params.agent.as_deref())?;
    let name = required(&params.pattern, "pattern")?;
    state.catalog.remove(name)?;
    Ok(Json(json!({ "removed": name, "version": state.catalog.snapshot().version() })))
}

async fn evaluate_pattern_handler(
    State(state): State<Arc<AppState>>,
    params: Result<Query<PatternParams>, QueryRejection>,
    samples: Result<Json<Vec<LabeledSample>>, JsonRejection>,
) -> ApiResult<Json<EvaluationReport>> {
    let params = query(params)?;
    state.session(params.agent.as_deref())?;
    let name = required(&params.pattern, "pattern")?;
    let samples = body(samples)?;
    Ok(Json(state.catalog.evaluate(name, &samples)?))
}

async fn reload_handler(
    State(state): State<Arc<AppState>>,
    params: Result<Query<ReloadParams>, QueryRejection>,
) -> ApiResult<Json<ReloadReport>> {
    let params = query(params)?;
    state.session(params.agent.as_deref())?;
    let path = required(&params.config, "config")?;
    Ok(Json(state.catalog.reload(Path::new(path))?))
}

async fn auto_confirm_handler(
    State(state): State<Arc<AppState>>,
    params: Result<Query<AgentParams>, QueryRejection>,
) -> ApiResult<Json<Value>> {
    let params = query(params)?;
    let session = state.session(params.agent.as_deref())?;
    let limit = params.limit.unwrap_or(state.default_events_limit);
    let decisions = session.recent_decisions(limit);
    Ok(Json(json!({
        "agent": session.id(),
        "count": decisions.len(),
        "decisions": decisions,
    })))
}
