//! Structured log events for key operations.
//!
//! Each function emits one `tracing` event with an `event` field naming it.

/// A pattern entered the catalog.
pub fn pattern_registered(pattern_id: i64, name: &str, category: &str, proposed_by: &str) {
    tracing::info!(
        event = "pattern_registered",
        pattern_id = pattern_id,
        pattern = %name,
        category = %category,
        proposed_by = %proposed_by,
        "pattern registered"
    );
}

/// A pattern left the catalog.
pub fn pattern_removed(name: &str) {
    tracing::info!(event = "pattern_removed", pattern = %name, "pattern removed");
}

/// A pattern's trust state changed.
pub fn pattern_tested(pattern_id: i64, name: &str, success_rate: f64) {
    tracing::info!(
        event = "pattern_tested",
        pattern_id = pattern_id,
        pattern = %name,
        success_rate = success_rate,
        "pattern marked tested"
    );
}

/// A new catalog snapshot was published.
pub fn catalog_reloaded(source: &str, version: u64, patterns: usize) {
    tracing::info!(
        event = "catalog_reloaded",
        source = %source,
        version = version,
        patterns = patterns,
        "catalog snapshot published"
    );
}

/// A chunk-in-progress was written to the chunk store.
pub fn chunk_flushed(session_id: &str, lines: usize, failures: usize) {
    tracing::debug!(
        event = "chunk_flushed",
        session_id = %session_id,
        lines = lines,
        failures = failures,
        "chunk-in-progress flushed"
    );
}

/// A pattern failed during evaluation and is skipped for the rest of the session.
pub fn pattern_skipped(session_id: &str, pattern_id: i64, name: &str, reason: &str) {
    tracing::warn!(
        event = "pattern_skipped",
        session_id = %session_id,
        pattern_id = pattern_id,
        pattern = %name,
        reason = %reason,
        "pattern skipped for the rest of the session"
    );
}

/// A learning run finished.
pub fn learning_completed(chunks_read: usize, proposed: usize, resolved: usize, duration_ms: u64) {
    tracing::info!(
        event = "learning_completed",
        chunks_read = chunks_read,
        proposed = proposed,
        resolved = resolved,
        duration_ms = duration_ms,
        "learning run completed"
    );
}

/// The auto-confirm policy produced a decision.
pub fn auto_confirm_decided(
    session_id: &str,
    pattern: &str,
    auto_confirm: bool,
    risk_level: &str,
    reason: &str,
) {
    tracing::info!(
        event = "auto_confirm_decided",
        session_id = %session_id,
        pattern = %pattern,
        auto_confirm = auto_confirm,
        risk_level = %risk_level,
        reason = %reason,
        "auto-confirm decided"
    );
}

/// A write failed and the caller carried on without it.
pub fn persistence_degraded(component: &str, operation: &str, error: &str) {
    tracing::warn!(
        event = "persistence_degraded",
        component = %component,
        operation = %operation,
        error = %error,
        "persistence degraded"
    );
}

/// A session worker started or stopped.
pub fn session_lifecycle(session_id: &str, state: &str) {
    tracing::info!(
        event = "session_lifecycle",
        session_id = %session_id,
        state = %state,
        "session {state}"
    );
}
