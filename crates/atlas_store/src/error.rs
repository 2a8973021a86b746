//! Store error types.

use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No backend has been configured for this process or session.
    #[error("backend is not configured")]
    BackendUnconfigured,

    /// The backend could not be reached, opened or written.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// A required field is absent or blank.
    #[error("validation failed: {0}")]
    ValidationFailed(String),

    /// Entity not found.
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Creates a not found error.
    pub fn not_found(entity_type: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity_type,
            id: id.to_string(),
        }
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationFailed(message.into())
    }

    /// Creates a validation error naming the missing fields.
    pub fn missing_fields(missing: &[&str]) -> Self {
        Self::validation(format!("missing required fields: {}", missing.join(", ")))
    }

    /// Fails with `ValidationFailed` when any required field is missing.
    pub fn check_required(missing: &[&str]) -> StoreResult<()> {
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Self::missing_fields(missing))
        }
    }

    /// Returns true if the error means the backend could not be reached.
    pub fn is_unavailable(&self) -> bool {
        match self {
            Self::StoreUnavailable(_) => true,
            Self::Database(e) => matches!(
                e,
                sqlx::Error::Io(_)
                    | sqlx::Error::PoolTimedOut
                    | sqlx::Error::PoolClosed
                    | sqlx::Error::WorkerCrashed
            ),
            _ => false,
        }
    }

    /// Returns true for `NotFound`.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        Self::StoreUnavailable(e.to_string())
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
