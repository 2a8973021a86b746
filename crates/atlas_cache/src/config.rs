//! Client configuration

use std::{path::PathBuf, sync::Arc, time::Duration};

use atlas_store::{HttpStore, Repositories, StoreError, StoreResult};
use tracing::warn;

use crate::{CoordinateCache, ProjectCache};

const DEFAULT_TIMEOUT_SECS: u64 = crate::DEFAULT_TIMEOUT.as_secs();

/// Client configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Atlas server URL; no URL means no backend
    pub api_url: Option<String>,

    /// Bound on each request, in seconds
    pub request_timeout_secs: u64,

    /// Local session file
    pub session_path: PathBuf,
}

fn default_session_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("atlas")
        .join("session.json")
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            session_path: default_session_path(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from the environment (and `.env` if present)
    pub fn load() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from a variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup("ATLAS_API_URL").filter(|u| !u.trim().is_empty()) {
            config.api_url = Some(url.trim().to_string());
        }

        if let Some(secs) = lookup("ATLAS_REQUEST_TIMEOUT_SECS") {
            config.request_timeout_secs = match secs.parse::<u64>() {
                Ok(0) | Err(_) => {
                    warn!(value = %secs, "Ignoring invalid ATLAS_REQUEST_TIMEOUT_SECS");
                    DEFAULT_TIMEOUT_SECS
                }
                Ok(secs) => secs,
            };
        }

        if let Some(path) = lookup("ATLAS_SESSION_PATH") {
            config.session_path = PathBuf::from(path);
        }

        config
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Connects repositories to the configured server.
    pub fn repositories(&self) -> StoreResult<Repositories> {
        let url = self
            .api_url
            .as_deref()
            .ok_or(StoreError::BackendUnconfigured)?;
        let store = HttpStore::new(url, self.request_timeout())?;
        Ok(Repositories::from_shared(Arc::new(store)))
    }

    /// Builds both caches, detached when no server is configured.
    pub fn caches(&self) -> (CoordinateCache, ProjectCache) {
        match self.repositories() {
            Ok(repositories) => (
                CoordinateCache::new(repositories.coordinates).with_timeout(self.request_timeout()),
                ProjectCache::new(repositories.projects).with_timeout(self.request_timeout()),
            ),
            Err(e) => {
                warn!(error = %e, "Atlas caches running without a backend");
                (CoordinateCache::detached(), ProjectCache::detached())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ClientConfig::from_lookup(lookup(&[]));
        assert_eq!(config.api_url, None);
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert!(config.session_path.ends_with("atlas/session.json"));
        assert!(matches!(
            config.repositories(),
            Err(StoreError::BackendUnconfigured)
        ));
    }

    #[test]
    fn test_env_overrides() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("ATLAS_API_URL", " http://atlas.local:3000 "),
            ("ATLAS_REQUEST_TIMEOUT_SECS", "3"),
            ("ATLAS_SESSION_PATH", "/tmp/atlas-session.json"),
        ]));
        assert_eq!(config.api_url.as_deref(), Some("http://atlas.local:3000"));
        assert_eq!(config.request_timeout_secs, 3);
        assert_eq!(config.session_path, PathBuf::from("/tmp/atlas-session.json"));
        assert!(config.repositories().is_ok());
    }

    #[test]
    fn test_invalid_timeout_falls_back() {
        let config = ClientConfig::from_lookup(lookup(&[("ATLAS_REQUEST_TIMEOUT_SECS", "soon")]));
        assert_eq!(config.request_timeout_secs, 10);

        let config = ClientConfig::from_lookup(lookup(&[("ATLAS_REQUEST_TIMEOUT_SECS", "0")]));
        assert_eq!(config.request_timeout_secs, 10);
    }

    #[tokio::test]
    async fn test_unconfigured_caches_are_detached() {
        let (coordinates, projects) = ClientConfig::from_lookup(lookup(&[])).caches();
        coordinates.refresh().await;
        projects.refresh().await;
        assert_eq!(coordinates.error().as_deref(), Some("backend is not configured"));
        assert_eq!(projects.error().as_deref(), Some("backend is not configured"));
    }
}
