//! # API Error Type
//!
//! Unified error type for the command layer.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Cart CLI                           │
//! │                                                                         │
//! │  Startup (before the store exists)                                      │
//! │  ─────────────────────────────────                                      │
//! │  Config file unreadable ─── toml / io error ─────┐                      │
//! │  SQLite pool won't open ─── StorageError ────────┼──► ApiError ──► exit 1│
//! │  Bad CLI input (--json) ─── serde_json error ────┘                      │
//! │                                                                         │
//! │  Cart operations (store exists)                                         │
//! │  ──────────────────────────────                                         │
//! │  Bad index / qty < 1 / over stock ──► Notice (never an ApiError)        │
//! │  Storage write failed ──────────────► tracing::error!, state kept       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Serialization
//! With `--json` the CLI prints the error as `{"code": ..., "message": ...}`
//! on stderr.

use serde::Serialize;
use storefront_core::ValidationError;
use storefront_storage::StorageError;

/// Error returned from commands and startup.
///
/// ```json
/// {
///   "code": "CONFIG_ERROR",
///   "message": "Config file not found: /etc/storefront.toml"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Input validation failed
    ValidationError,

    /// Configuration could not be loaded or is invalid
    ConfigError,

    /// Storage backend could not be opened or flushed
    StorageError,

    /// Internal error
    Internal,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn config(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ConfigError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

/// Result type for command handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// Converts storage errors to API errors.
impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::ConnectionFailed(e) => {
                tracing::error!("Storage connection failed: {}", e);
                ApiError::new(ErrorCode::StorageError, "Storage connection failed")
            }
            StorageError::MigrationFailed(e) => {
                tracing::error!("Storage migration failed: {}", e);
                ApiError::new(ErrorCode::StorageError, "Storage migration failed")
            }
            StorageError::InvalidKey(key) => {
                ApiError::validation(format!("Invalid storage key: '{}'", key))
            }
            StorageError::WriterClosed => {
                ApiError::new(ErrorCode::StorageError, "Storage writer is closed")
            }
            other => {
                tracing::error!("Storage error: {}", other);
                ApiError::new(ErrorCode::StorageError, other.to_string())
            }
        }
    }
}

/// Malformed command input (e.g. `--sku` without `--variant-id`). Cart rule
/// violations never get here; the store turns them into notices.
impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::validation(format!("Invalid JSON: {}", err))
    }
}

impl From<toml::de::Error> for ApiError {
    fn from(err: toml::de::Error) -> Self {
        ApiError::config(format!("Invalid config file: {}", err))
    }
}

impl From<toml::ser::Error> for ApiError {
    fn from(err: toml::ser::Error) -> Self {
        ApiError::config(format!("Could not serialize config: {}", err))
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::internal(format!("I/O error: {}", err))
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}
