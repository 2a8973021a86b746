//! API error types.

use atlas_store::StoreError;
use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Error returned by the HTTP handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed request body or query.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// Repository failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ApiError {
    pub fn not_found(entity_type: &str, id: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("{entity_type} not found: {id}"))
    }

    /// Status, machine-readable code and message for the response body.
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            ApiError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", msg.clone())
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            ApiError::Store(e) => match e {
                StoreError::ValidationFailed(msg) => {
                    (StatusCode::BAD_REQUEST, "validation_failed", msg.clone())
                }
                StoreError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found", e.to_string()),
                StoreError::BackendUnconfigured => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "backend_unconfigured",
                    e.to_string(),
                ),
                e if e.is_unavailable() => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "store_unavailable",
                    e.to_string(),
                ),
                e => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", e.to_string()),
            },
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::InvalidRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        if status.is_server_error() {
            tracing::error!(error = %self, code, "Request failed");
        }

        let body = json!({
            "error": {
                "code": code,
                "message": message,
            }
        });

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers.
pub type ApiResult<T> = Result<T, ApiError>;
