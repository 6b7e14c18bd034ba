//! # Configuration State
//!
//! Settings loaded once at startup.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`STOREFRONT_*`)
//! 2. Config file (`storefront.toml`)
//! 3. Defaults (this file)
//!
//! ## File Location
//! ```text
//! --config <path>                                         (explicit)
//! ~/.config/storefront-cart/storefront.toml               (Linux)
//! ~/Library/Application Support/com.storefront.cart/...   (macOS)
//! %APPDATA%\storefront\cart\config\storefront.toml        (Windows)
//! ```
//!
//! ## Example
//! ```toml
//! [storage]
//! backend = "sqlite"
//! data_dir = "/var/lib/storefront"
//!
//! [storage.sqlite]
//! max_connections = 2
//! connect_timeout_secs = 10
//!
//! [persistence]
//! initial_backoff_ms = 100
//! max_backoff_ms = 5000
//! max_attempts = 5
//!
//! [display]
//! default_currency = "USD"
//! ```
//!
//! ## Thread Safety
//! Read-only after initialization, so no mutex needed.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use storefront_core::Currency;
use storefront_storage::{RetryPolicy, SqliteConfig};
use tracing::{debug, info, warn};

use crate::error::{ApiError, ApiResult};

/// Config file name inside the platform config directory.
pub const CONFIG_FILE_NAME: &str = "storefront.toml";

/// SQLite database file name inside the data directory.
pub const DATABASE_FILE_NAME: &str = "storefront.db";

// =============================================================================
// Storage Backend Selection
// =============================================================================

/// Which storage backend the cart store persists to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// One JSON file per key in the data directory
    #[default]
    File,

    /// SQLite database behind the write-behind queue
    Sqlite,

    /// Process memory only (nothing survives exit)
    Memory,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::File => write!(f, "file"),
            BackendKind::Sqlite => write!(f, "sqlite"),
            BackendKind::Memory => write!(f, "memory"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "file" | "json" => Ok(BackendKind::File),
            "sqlite" | "db" => Ok(BackendKind::Sqlite),
            "memory" | "mem" => Ok(BackendKind::Memory),
            _ => Err(format!("Unknown storage backend: {}", s)),
        }
    }
}

// =============================================================================
// Sections
// =============================================================================

/// `[storage]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub backend: BackendKind,

    /// Data directory. Defaults to the platform data directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    pub sqlite: SqliteSettings,
}

/// `[storage.sqlite]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SqliteSettings {
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
}

impl Default for SqliteSettings {
    fn default() -> Self {
        SqliteSettings {
            max_connections: 2,
            connect_timeout_secs: 10,
        }
    }
}

/// `[persistence]` - retry policy for background SQLite writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceSettings {
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub max_attempts: u32,
}

impl Default for PersistenceSettings {
    fn default() -> Self {
        PersistenceSettings {
            initial_backoff_ms: 100,
            max_backoff_ms: 5_000,
            max_attempts: 5,
        }
    }
}

/// `[display]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    /// Currency used when no preference has been saved yet.
    pub default_currency: Currency,
}

// =============================================================================
// Config State
// =============================================================================

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigState {
    pub storage: StorageSettings,
    pub persistence: PersistenceSettings,
    pub display: DisplaySettings,
}

impl ConfigState {
    /// Loads configuration from defaults, the config file and environment.
    ///
    /// An explicit `config_path` must exist. The default path is optional.
    pub fn load(config_path: Option<&Path>) -> ApiResult<Self> {
        let mut config = match config_path {
            Some(path) => {
                if !path.exists() {
                    return Err(ApiError::config(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
                Self::read_file(path)?
            }
            None => match Self::default_config_path() {
                Some(path) if path.exists() => Self::read_file(&path)?,
                Some(path) => {
                    debug!(?path, "Config file not found, using defaults");
                    ConfigState::default()
                }
                None => ConfigState::default(),
            },
        };

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Like [`ConfigState::load`], but falls back to defaults on any error.
    pub fn load_or_default(config_path: Option<&Path>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load config: {}. Using defaults.", e.message);
            ConfigState::default()
        })
    }

    /// Writes the configuration as TOML, creating parent directories.
    pub fn save(&self, path: &Path) -> ApiResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        info!(?path, "Config saved");
        Ok(())
    }

    fn read_file(path: &Path) -> ApiResult<Self> {
        info!(?path, "Loading config from file");
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Platform config file path, if a home directory can be determined.
    pub fn default_config_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ApiResult<()> {
        if self.storage.sqlite.max_connections == 0 {
            return Err(ApiError::config(
                "storage.sqlite.max_connections must be at least 1",
            ));
        }
        if self.persistence.max_attempts == 0 {
            return Err(ApiError::config(
                "persistence.max_attempts must be at least 1",
            ));
        }
        if self.persistence.initial_backoff_ms > self.persistence.max_backoff_ms {
            return Err(ApiError::config(
                "persistence.initial_backoff_ms must not exceed max_backoff_ms",
            ));
        }
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies `STOREFRONT_*` overrides read through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(backend) = lookup("STOREFRONT_STORAGE_BACKEND") {
            match backend.parse() {
                Ok(parsed) => {
                    debug!(backend = %backend, "Overriding storage backend from environment");
                    self.storage.backend = parsed;
                }
                Err(e) => warn!("{}", e),
            }
        }

        if let Some(dir) = lookup("STOREFRONT_DATA_DIR") {
            if !dir.trim().is_empty() {
                debug!(data_dir = %dir, "Overriding data directory from environment");
                self.storage.data_dir = Some(PathBuf::from(dir));
            }
        }

        if let Some(currency) = lookup("STOREFRONT_DEFAULT_CURRENCY") {
            match currency.parse::<Currency>() {
                Ok(parsed) => self.display.default_currency = parsed,
                Err(_) => warn!(currency = %currency, "Unknown currency in environment"),
            }
        }
    }

    // =========================================================================
    // Derived settings
    // =========================================================================

    /// Resolved data directory.
    pub fn data_dir(&self) -> PathBuf {
        if let Some(dir) = &self.storage.data_dir {
            return dir.clone();
        }
        project_dirs()
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".storefront"))
    }

    pub fn sqlite_config(&self) -> SqliteConfig {
        SqliteConfig::new(self.data_dir().join(DATABASE_FILE_NAME))
            .max_connections(self.storage.sqlite.max_connections)
            .connect_timeout(Duration::from_secs(self.storage.sqlite.connect_timeout_secs))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            initial_backoff: Duration::from_millis(self.persistence.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.persistence.max_backoff_ms),
            max_attempts: self.persistence.max_attempts,
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "storefront", "cart")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = ConfigState::default();
        assert_eq!(config.storage.backend, BackendKind::File);
        assert_eq!(config.display.default_currency, Currency::Inr);
        assert_eq!(config.persistence.max_attempts, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: ConfigState = toml::from_str(
            r#"
            [storage]
            backend = "sqlite"

            [display]
            default_currency = "USD"
            "#,
        )
        .unwrap();

        assert_eq!(config.storage.backend, BackendKind::Sqlite);
        assert_eq!(config.storage.sqlite.max_connections, 2);
        assert_eq!(config.display.default_currency, Currency::Usd);
        assert_eq!(config.persistence, PersistenceSettings::default());
    }

    #[test]
    fn test_env_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            "[storage]\nbackend = \"sqlite\"\ndata_dir = \"/from/file\"\n",
        )
        .unwrap();

        let mut config = ConfigState::read_file(&path).unwrap();
        let env: HashMap<&str, &str> = [
            ("STOREFRONT_STORAGE_BACKEND", "memory"),
            ("STOREFRONT_DEFAULT_CURRENCY", "usd"),
        ]
        .into_iter()
        .collect();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.storage.backend, BackendKind::Memory);
        assert_eq!(config.display.default_currency, Currency::Usd);
        // Not overridden, so the file wins over the default
        assert_eq!(config.data_dir(), PathBuf::from("/from/file"));
    }

    #[test]
    fn test_invalid_env_values_are_ignored() {
        let mut config = ConfigState::default();
        config.apply_overrides(|key| match key {
            "STOREFRONT_STORAGE_BACKEND" => Some("postgres".to_string()),
            "STOREFRONT_DEFAULT_CURRENCY" => Some("EUR".to_string()),
            _ => None,
        });

        assert_eq!(config, ConfigState::default());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ConfigState::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::ConfigError);
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let mut config = ConfigState::default();
        config.persistence.max_attempts = 0;
        assert!(config.validate().is_err());

        let mut config = ConfigState::default();
        config.storage.sqlite.max_connections = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);

        let mut config = ConfigState::default();
        config.storage.backend = BackendKind::Sqlite;
        config.storage.data_dir = Some(dir.path().to_path_buf());
        config.save(&path).unwrap();

        let loaded = ConfigState::read_file(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(
            loaded.sqlite_config().database_path,
            dir.path().join(DATABASE_FILE_NAME)
        );
    }

    #[test]
    fn test_backend_kind_from_str() {
        assert_eq!("SQLite".parse::<BackendKind>().unwrap(), BackendKind::Sqlite);
        assert_eq!("json".parse::<BackendKind>().unwrap(), BackendKind::File);
        assert!("redis".parse::<BackendKind>().is_err());
    }
}
