//! Cache error types.

use std::time::Duration;

use atlas_store::StoreError;
use thiserror::Error;

/// Errors surfaced by cache operations.
///
/// The `Display` text is what the cache records in its `error` field.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The repository call failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The repository did not answer in time.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}

impl CacheError {
    /// Returns true if the cache has no repository to talk to.
    pub fn is_unconfigured(&self) -> bool {
        matches!(self, Self::Store(StoreError::BackendUnconfigured))
    }

    /// Returns true if the repository reported a missing entity.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_not_found())
    }
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;
