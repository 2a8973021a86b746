//! Local session: the display name used as `addedBy`.

use std::{
    collections::BTreeMap,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use atlas_store::{StoreError, StoreResult};
use tracing::info;
use uuid::Uuid;

/// Key under which the display name is stored.
pub const SESSION_NAME_KEY: &str = "redpill_pseudo";

/// Client-local key/value file holding the session's display name.
#[derive(Debug, Clone)]
pub struct LocalSession {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl LocalSession {
    /// Loads the session file, treating a missing file as logged out.
    pub async fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let values = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The logged-in display name.
    pub fn name(&self) -> Option<&str> {
        self.values.get(SESSION_NAME_KEY).map(String::as_str)
    }

    pub fn is_logged_in(&self) -> bool {
        self.name().is_some()
    }

    /// Stores `name` as the session's display name.
    pub async fn login(&mut self, name: &str) -> StoreResult<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::validation("display name must not be blank"));
        }

        self.values
            .insert(SESSION_NAME_KEY.to_string(), name.to_string());
        self.save().await?;
        info!(name = %name, "Session started");
        Ok(())
    }

    /// Forgets the display name.
    pub async fn logout(&mut self) -> StoreResult<()> {
        if self.values.remove(SESSION_NAME_KEY).is_some() {
            self.save().await?;
            info!("Session ended");
        }
        Ok(())
    }

    async fn save(&self) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec_pretty(&self.values)?;
        let tmp = self
            .path
            .with_extension(format!("{}.tmp", Uuid::new_v4().simple()));
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[tokio::test]
    async fn test_login_persists_across_sessions() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("atlas").join("session.json");

        let mut session = LocalSession::open(&path).await.unwrap();
        assert!(!session.is_logged_in());

        session.login("  neo ").await.unwrap();
        assert_eq!(session.name(), Some("neo"));

        let reopened = LocalSession::open(&path).await.unwrap();
        assert_eq!(reopened.name(), Some("neo"));

        let raw: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(raw[SESSION_NAME_KEY], "neo");
    }

    #[tokio::test]
    async fn test_logout_clears_name() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");

        let mut session = LocalSession::open(&path).await.unwrap();
        session.login("trinity").await.unwrap();
        session.logout().await.unwrap();
        assert_eq!(session.name(), None);

        let reopened = LocalSession::open(&path).await.unwrap();
        assert!(!reopened.is_logged_in());
    }

    #[tokio::test]
    async fn test_blank_name_rejected() {
        let dir = tempdir().unwrap();
        let mut session = LocalSession::open(dir.path().join("session.json"))
            .await
            .unwrap();

        let err = session.login("   ").await.unwrap_err();
        assert!(matches!(err, StoreError::ValidationFailed(_)));
        assert!(!session.path().exists());
    }

    #[tokio::test]
    async fn test_other_keys_are_kept() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, r#"{"theme":"dark"}"#).unwrap();

        let mut session = LocalSession::open(&path).await.unwrap();
        session.login("neo").await.unwrap();
        session.logout().await.unwrap();

        let raw: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(raw, serde_json::json!({"theme": "dark"}));
    }
}
