//! Span definitions per operation: session extraction, learning runs, catalog reloads.

/// Span covering one session worker.
#[macro_export]
macro_rules! session_span {
    ($session_id:expr) => {
        tracing::info_span!("sift.session", session_id = %$session_id)
    };
}

/// Span covering one learning run.
#[macro_export]
macro_rules! learning_span {
    ($limit:expr) => {
        tracing::info_span!("sift.learning", limit = $limit)
    };
}

/// Span covering one catalog reload.
#[macro_export]
macro_rules! reload_span {
    ($path:expr) => {
        tracing::info_span!("sift.reload", path = %$path)
    };
}

/// Span names as constants for programmatic use.
pub mod names {
    pub const SESSION: &str = "sift.session";
    pub const LEARNING: &str = "sift.learning";
    pub const RELOAD: &str = "sift.reload";
}
