//! Application state

use std::sync::Arc;

use atlas_store::{JsonFileStore, Repositories, SqliteStore, StoreError};
use tracing::info;

use crate::config::{ServerConfig, StorageKind};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Coordinate and project repositories
    pub repositories: Repositories,

    /// Server configuration
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Opens the configured storage backend.
    pub async fn new(config: ServerConfig) -> Result<Self, StateError> {
        let repositories = match config.storage {
            StorageKind::Json => {
                let store = JsonFileStore::open(&config.data_dir).await?;
                info!(dir = %config.data_dir.display(), "Using JSON document storage");
                Repositories::from_shared(Arc::new(store))
            }
            StorageKind::Sqlite => {
                let store = match &config.database_url {
                    Some(url) => SqliteStore::connect(url).await?,
                    None => SqliteStore::open(&config.database_path).await?,
                };
                info!("Using SQLite storage");
                Repositories::from_shared(Arc::new(store))
            }
        };

        Ok(Self::with_repositories(repositories, config))
    }

    /// Builds the state around existing repositories.
    pub fn with_repositories(repositories: Repositories, config: ServerConfig) -> Self {
        Self {
            repositories,
            config: Arc::new(config),
        }
    }
}

/// State initialization errors
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("Failed to open storage: {0}")]
    Storage(#[from] StoreError),
}
