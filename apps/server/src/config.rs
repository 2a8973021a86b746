//! Server configuration

use std::{fmt, path::PathBuf, str::FromStr};

use serde::{Deserialize, Serialize};

/// Backend holding the atlas data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    /// One JSON document per collection under `data_dir`
    Json,
    /// SQLite database at `database_url` or `database_path`
    Sqlite,
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Sqlite => write!(f, "sqlite"),
        }
    }
}

impl FromStr for StorageKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(ConfigError::InvalidStorage(other.to_string())),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address (e.g., "0.0.0.0:3000")
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Storage backend
    #[serde(default = "default_storage")]
    pub storage: StorageKind,

    /// SQLite connection URL; overrides `database_path`
    #[serde(default)]
    pub database_url: Option<String>,

    /// SQLite database path
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Directory holding the JSON documents
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Whether to enable CORS
    #[serde(default = "default_enable_cors")]
    pub enable_cors: bool,

    /// Allowed CORS origins (empty allows any)
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_bind_address() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_storage() -> StorageKind {
    StorageKind::Json
}

fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("atlas")
        .join("atlas.db")
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_enable_cors() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            storage: default_storage(),
            database_url: None,
            database_path: default_database_path(),
            data_dir: default_data_dir(),
            enable_cors: default_enable_cors(),
            cors_origins: Vec::new(),
            log_level: default_log_level(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment and optional config file
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let mut config = Self::from_lookup(|key| std::env::var(key).ok())?;

        // Env takes precedence over the file, the file over defaults
        if let Some(config_path) = Self::find_config_file() {
            let contents = std::fs::read_to_string(&config_path)?;
            let file_config = toml::from_str::<ServerConfig>(&contents)?;
            tracing::debug!(path = %config_path.display(), "Loaded config file");
            config.merge_file(file_config);
        }

        config.validate()?;
        Ok(config)
    }

    /// Builds the configuration from defaults and a variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(addr) = lookup("ATLAS_BIND_ADDRESS") {
            config.bind_address = addr;
        }

        if let Some(storage) = lookup("ATLAS_STORAGE") {
            config.storage = storage.parse()?;
        }

        if let Some(url) = lookup("DATABASE_URL") {
            config.database_url = Some(url);
        }

        if let Some(path) = lookup("ATLAS_DATABASE_PATH") {
            config.database_path = PathBuf::from(path);
        }

        if let Some(dir) = lookup("ATLAS_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }

        if let Some(val) = lookup("ATLAS_ENABLE_CORS") {
            match parse_flag(&val) {
                Some(enabled) => config.enable_cors = enabled,
                None => tracing::warn!(
                    value = %val,
                    "Ignoring unrecognized ATLAS_ENABLE_CORS value"
                ),
            }
        }

        if let Some(origins) = lookup("ATLAS_CORS_ORIGINS") {
            config.cors_origins = origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        if let Some(level) = lookup("ATLAS_LOG_LEVEL") {
            config.log_level = level;
        }

        Ok(config)
    }

    /// Fills fields still at their defaults from a config file.
    fn merge_file(&mut self, file_config: ServerConfig) {
        if self.bind_address == default_bind_address() {
            self.bind_address = file_config.bind_address;
        }
        if self.storage == default_storage() {
            self.storage = file_config.storage;
        }
        if self.database_url.is_none() {
            self.database_url = file_config.database_url;
        }
        if self.database_path == default_database_path() {
            self.database_path = file_config.database_path;
        }
        if self.data_dir == default_data_dir() {
            self.data_dir = file_config.data_dir;
        }
        if self.enable_cors == default_enable_cors() {
            self.enable_cors = file_config.enable_cors;
        }
        if self.cors_origins.is_empty() {
            self.cors_origins = file_config.cors_origins;
        }
        if self.log_level == default_log_level() {
            self.log_level = file_config.log_level;
        }
    }

    /// Find the config file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let locations = [
            PathBuf::from("atlas-server.toml"),
            PathBuf::from("/etc/atlas/server.toml"),
            dirs::config_dir()
                .map(|p| p.join("atlas").join("server.toml"))
                .unwrap_or_default(),
        ];

        locations
            .into_iter()
            .find(|p| !p.as_os_str().is_empty() && p.exists())
    }

    /// Validate the configuration
    fn validate(&self) -> Result<(), ConfigError> {
        if self.bind_address.trim().is_empty() {
            return Err(ConfigError::MissingBindAddress);
        }

        if self.storage == StorageKind::Json && self.database_url.is_some() {
            tracing::warn!("DATABASE_URL is ignored with JSON storage");
        }

        Ok(())
    }
}

/// Parses a boolean environment flag.
fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Bind address must not be empty")]
    MissingBindAddress,

    #[error("Unknown storage backend: {0} (expected json or sqlite)")]
    InvalidStorage(String),

    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}
