//! Published cache state.

use std::{future::Future, time::Duration};

use atlas_store::StoreResult;
use tokio::sync::watch;
use tracing::error;

use crate::{CacheError, CacheResult};

/// Lifecycle of a cache instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// Nothing has been loaded yet.
    Idle,
    /// A full refresh is in flight.
    Loading,
    /// The last operation succeeded.
    Ready,
    /// The last operation failed; entities may be stale.
    Error,
}

/// Snapshot of a cache: the entities plus loading and error indicators.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheState<T> {
    pub entities: Vec<T>,
    pub is_loading: bool,
    pub error: Option<String>,
    /// Set once any refresh or mutation has succeeded.
    pub loaded: bool,
}

impl<T> Default for CacheState<T> {
    fn default() -> Self {
        Self {
            entities: Vec::new(),
            is_loading: false,
            error: None,
            loaded: false,
        }
    }
}

impl<T> CacheState<T> {
    pub fn status(&self) -> CacheStatus {
        if self.is_loading {
            CacheStatus::Loading
        } else if self.error.is_some() {
            CacheStatus::Error
        } else if self.loaded {
            CacheStatus::Ready
        } else {
            CacheStatus::Idle
        }
    }
}

/// Owner of a cache's state channel.
///
/// Every change goes through `watch::Sender::send_modify`, so subscribers
/// always observe whole operations.
#[derive(Debug)]
pub(crate) struct StateCell<T> {
    tx: watch::Sender<CacheState<T>>,
}

impl<T: Clone> StateCell<T> {
    pub(crate) fn new() -> Self {
        let (tx, _rx) = watch::channel(CacheState::default());
        Self { tx }
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<CacheState<T>> {
        self.tx.subscribe()
    }

    pub(crate) fn snapshot(&self) -> CacheState<T> {
        self.tx.borrow().clone()
    }

    /// Looks something up in the current entities.
    pub(crate) fn read<R>(&self, pick: impl FnOnce(&[T]) -> Option<R>) -> Option<R> {
        pick(&self.tx.borrow().entities)
    }

    pub(crate) fn begin_refresh(&self) {
        self.tx.send_modify(|state| {
            state.is_loading = true;
            state.error = None;
        });
    }

    /// Ends a refresh, replacing the entities only on success.
    pub(crate) fn finish_refresh(&self, result: CacheResult<Vec<T>>) {
        self.tx.send_modify(|state| {
            state.is_loading = false;
            match result {
                Ok(entities) => {
                    state.entities = entities;
                    state.error = None;
                    state.loaded = true;
                }
                Err(e) => {
                    error!(error = %e, "Cache refresh failed");
                    state.error = Some(e.to_string());
                }
            }
        });
    }

    pub(crate) fn clear_error(&self) {
        self.tx.send_if_modified(|state| state.error.take().is_some());
    }

    pub(crate) fn record_error(&self, e: &CacheError) {
        let message = e.to_string();
        self.tx.send_modify(|state| state.error = Some(message));
    }

    /// Applies a successful mutation to the entities.
    pub(crate) fn apply(&self, f: impl FnOnce(&mut Vec<T>)) {
        self.tx.send_modify(|state| {
            f(&mut state.entities);
            state.loaded = true;
        });
    }
}

/// Awaits one repository round-trip, bounded by `limit`.
pub(crate) async fn round_trip<T>(
    limit: Duration,
    call: impl Future<Output = StoreResult<T>>,
) -> CacheResult<T> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result.map_err(CacheError::from),
        Err(_) => Err(CacheError::Timeout(limit)),
    }
}

#[cfg(test)]
mod tests {
    use atlas_store::StoreError;

    use super::*;

    #[test]
    fn test_status_transitions() {
        let cell: StateCell<u32> = StateCell::new();
        assert_eq!(cell.snapshot().status(), CacheStatus::Idle);

        cell.begin_refresh();
        assert_eq!(cell.snapshot().status(), CacheStatus::Loading);

        cell.finish_refresh(Ok(vec![1, 2]));
        assert_eq!(cell.snapshot().status(), CacheStatus::Ready);

        cell.begin_refresh();
        cell.finish_refresh(Err(StoreError::StoreUnavailable("offline".into()).into()));
        let state = cell.snapshot();
        assert_eq!(state.status(), CacheStatus::Error);
        assert_eq!(state.entities, vec![1, 2]);
        assert_eq!(state.error.as_deref(), Some("store unavailable: offline"));
    }

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let cell: StateCell<u32> = StateCell::new();
        let mut rx = cell.subscribe();

        cell.apply(|entities| entities.push(7));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().entities, vec![7]);

        // Clearing an absent error does not notify.
        cell.clear_error();
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_round_trip_timeout() {
        let limit = Duration::from_secs(5);
        let result: CacheResult<()> = round_trip(limit, std::future::pending()).await;
        assert!(matches!(result, Err(CacheError::Timeout(d)) if d == limit));

        let result = round_trip(limit, async { Ok(3) }).await;
        assert_eq!(result.unwrap(), 3);
    }
}
