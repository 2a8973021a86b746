//! Reactive caches for the shared-world atlas
//!
//! A cache mirrors one entity collection from a repository and publishes
//! its state (entities, loading flag, last error) through a
//! `tokio::sync::watch` channel. Mutations are written through to the
//! repository first and patched into the cache only on success.

use std::time::Duration;

mod config;
mod coordinates;
mod error;
mod projects;
mod session;
mod state;
#[cfg(test)]
mod testing;

pub use config::ClientConfig;
pub use coordinates::CoordinateCache;
pub use error::*;
pub use projects::{join_tasks, ProjectCache};
pub use session::{LocalSession, SESSION_NAME_KEY};
pub use state::{CacheState, CacheStatus};

/// Default bound on a repository round-trip.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
