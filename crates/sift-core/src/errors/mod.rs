//! Error taxonomy. Each subsystem has its own enum; all of them fold into
//! [`SiftError`] so `?` works across crate boundaries.

mod match_error;
mod storage_error;

pub use match_error::MatchEvaluationError;
pub use storage_error::StorageError;

/// Result alias used throughout the workspace.
pub type SiftResult<T> = Result<T, SiftError>;

/// Top-level error for every sift operation.
#[derive(Debug, thiserror::Error)]
pub enum SiftError {
    #[error("invalid pattern '{name}': {reason}")]
    InvalidPattern { name: String, reason: String },

    #[error("pattern not found: {name}")]
    PatternNotFound { name: String },

    #[error("pattern id not found: {id}")]
    PatternIdNotFound { id: i64 },

    #[error("chunk not found: {id}")]
    ChunkNotFound { id: i64 },

    #[error("session not found: {id}")]
    SessionNotFound { id: String },

    #[error("match evaluation error: {0}")]
    MatchEvaluation(#[from] MatchEvaluationError),

    #[error("storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("config error: {0}")]
    ConfigError(String),

    #[error("extractor closed for session {session_id}")]
    ExtractorClosed { session_id: String },
}

impl SiftError {
    /// Shorthand for building an [`SiftError::InvalidPattern`].
    pub fn invalid_pattern(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPattern {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// True for the lookup-miss family of errors.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::PatternNotFound { .. }
                | Self::PatternIdNotFound { .. }
                | Self::ChunkNotFound { .. }
                | Self::SessionNotFound { .. }
        )
    }

    /// True for persistence failures, which callers on the live path
    /// log and survive rather than propagate.
    pub fn is_persistence(&self) -> bool {
        matches!(self, Self::StorageError(_))
    }
}
