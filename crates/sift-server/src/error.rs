//! HTTP error mapping. Every failure body is `{ "error": "<message>" }`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::warn;

use sift_core::errors::SiftError;

#[derive(Debug)]
pub enum ApiError {
    Sift(SiftError),
    /// Missing or malformed request input.
    BadRequest(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Sift(e) if e.is_not_found() => StatusCode::NOT_FOUND,
            Self::Sift(e) if e.is_persistence() => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Sift(SiftError::ExtractorClosed { .. }) => StatusCode::CONFLICT,
            Self::Sift(
                SiftError::InvalidPattern { .. }
                | SiftError::ConfigError(_)
                | SiftError::MatchEvaluation(_)
                | SiftError::SerializationError(_),
            ) => StatusCode::BAD_REQUEST,
            Self::Sift(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<SiftError> for ApiError {
    fn from(e: SiftError) -> Self {
        Self::Sift(e)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sift(e) => write!(f, "{e}"),
            Self::BadRequest(message) => f.write_str(message),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(status = status.as_u16(), error = %self, "request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use sift_core::errors::StorageError;

    use super::*;

    #[test]
    fn status_codes_follow_error_kind() {
        let not_found = ApiError::from(SiftError::PatternNotFound { name: "x".into() });
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let session = ApiError::from(SiftError::SessionNotFound { id: "a".into() });
        assert_eq!(session.status(), StatusCode::NOT_FOUND);

        let invalid = ApiError::from(SiftError::invalid_pattern("x", "bad regex"));
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

        let config = ApiError::from(SiftError::ConfigError("missing file".into()));
        assert_eq!(config.status(), StatusCode::BAD_REQUEST);

        let storage = ApiError::from(SiftError::from(StorageError::SqliteError {
            message: "disk full".into(),
        }));
        assert_eq!(storage.status(), StatusCode::INTERNAL_SERVER_ERROR);

        assert_eq!(ApiError::bad_request("no agent").status(), StatusCode::BAD_REQUEST);
    }
}
