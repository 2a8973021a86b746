//! Reactive cache of coordinates.

use std::{sync::Arc, time::Duration};

use atlas_store::{CoordinateRepository, StoreError};
use entities::{Category, Coordinate, CoordinateDraft};
use tokio::sync::watch;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    state::{round_trip, StateCell},
    CacheError, CacheResult, CacheState, DEFAULT_TIMEOUT,
};

/// Client-side mirror of the coordinate collection.
///
/// Entities are kept newest first. Mutations are applied locally only after
/// the repository confirms them.
pub struct CoordinateCache {
    repository: Option<Arc<dyn CoordinateRepository>>,
    timeout: Duration,
    state: StateCell<Coordinate>,
}

impl CoordinateCache {
    /// Creates a cache over the given repository.
    pub fn new(repository: Arc<dyn CoordinateRepository>) -> Self {
        Self {
            repository: Some(repository),
            timeout: DEFAULT_TIMEOUT,
            state: StateCell::new(),
        }
    }

    /// Creates a cache with no backend. Every operation reports
    /// `BackendUnconfigured`.
    pub fn detached() -> Self {
        Self {
            repository: None,
            timeout: DEFAULT_TIMEOUT,
            state: StateCell::new(),
        }
    }

    /// Sets the bound on each repository round-trip.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Subscribes to state changes.
    pub fn subscribe(&self) -> watch::Receiver<CacheState<Coordinate>> {
        self.state.subscribe()
    }

    /// Returns a copy of the current state.
    pub fn snapshot(&self) -> CacheState<Coordinate> {
        self.state.snapshot()
    }

    pub fn entities(&self) -> Vec<Coordinate> {
        self.state.snapshot().entities
    }

    pub fn is_loading(&self) -> bool {
        self.state.snapshot().is_loading
    }

    pub fn error(&self) -> Option<String> {
        self.state.snapshot().error
    }

    /// Coordinates of the given category, in cache order.
    pub fn by_category(&self, category: Category) -> Vec<Coordinate> {
        self.state
            .read(|entities| {
                Some(
                    entities
                        .iter()
                        .filter(|c| c.category == category)
                        .cloned()
                        .collect(),
                )
            })
            .unwrap_or_default()
    }

    pub fn biomes(&self) -> Vec<Coordinate> {
        self.by_category(Category::Biome)
    }

    pub fn bases(&self) -> Vec<Coordinate> {
        self.by_category(Category::Base)
    }

    pub fn resources(&self) -> Vec<Coordinate> {
        self.by_category(Category::Resource)
    }

    fn repository(&self) -> CacheResult<&Arc<dyn CoordinateRepository>> {
        self.repository.as_ref().ok_or_else(|| {
            let e = CacheError::from(StoreError::BackendUnconfigured);
            self.state.record_error(&e);
            e
        })
    }

    /// Reloads every coordinate from the repository.
    ///
    /// Failures are logged and recorded in `error`; the previous entities
    /// stay visible.
    pub async fn refresh(&self) {
        let Ok(repository) = self.repository() else {
            warn!("Coordinate refresh skipped: backend is not configured");
            return;
        };

        self.state.begin_refresh();
        let result = round_trip(self.timeout, repository.list_all_coordinates()).await;
        self.state.finish_refresh(result);
    }

    /// Creates a coordinate and puts it at the front of the cache.
    pub async fn add(&self, draft: CoordinateDraft) -> CacheResult<Coordinate> {
        let repository = self.repository()?;
        self.state.clear_error();

        match round_trip(self.timeout, repository.create_coordinate(draft)).await {
            Ok(coordinate) => {
                info!(id = %coordinate.id, name = %coordinate.name, "Coordinate added");
                let cached = coordinate.clone();
                self.state.apply(|entities| entities.insert(0, cached));
                Ok(coordinate)
            }
            Err(e) => {
                self.state.record_error(&e);
                Err(e)
            }
        }
    }

    /// Deletes a coordinate and drops it from the cache.
    ///
    /// Returns false if the repository did not know the id.
    pub async fn remove(&self, id: Uuid) -> CacheResult<bool> {
        let repository = self.repository()?;
        self.state.clear_error();

        match round_trip(self.timeout, repository.delete_coordinate(id)).await {
            Ok(deleted) => {
                if deleted {
                    info!(id = %id, "Coordinate removed");
                }
                self.state.apply(|entities| entities.retain(|c| c.id != id));
                Ok(deleted)
            }
            Err(e) => {
                self.state.record_error(&e);
                Err(e)
            }
        }
    }
}
