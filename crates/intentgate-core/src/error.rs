//! Core error types for intentgate-core.
//!
//! Two families live here. [`CoreError`] covers genuine infrastructure
//! failures (SQLite, filesystem, malformed config) and is propagated with `?`.
//! [`GateError`] is the small, non-fatal gating taxonomy: it is handled where
//! it is detected and never escapes to surrounding UI code.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for intentgate-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Storage-specific errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open database connection
    #[error("Failed to open state database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// A stored field could not be decoded
    #[error("Stored field '{field}' is malformed: {message}")]
    Malformed { field: String, message: String },

    /// Database is locked
    #[error("State database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown configuration key
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Value not usable as a site entry
    #[error("'{0}' is not a usable site")]
    InvalidSite(String),
}

/// Non-fatal gating outcomes.
///
/// Every variant degrades to "do nothing / show nothing"; only
/// `IntentTooShort` is surfaced, as the `too_short` status.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GateError {
    /// The normalizer produced no domain; gating is skipped.
    #[error("no gateable domain for this page")]
    EmptyDomain,

    /// Submitted intent is below the configured minimum length.
    #[error("intent has {len} characters, at least {min} required")]
    IntentTooShort { len: usize, min: usize },

    /// A deferred callback fired after the state it captured changed.
    #[error("stale timer for '{key}' ignored")]
    StaleTimerFire { key: String },
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(inner, _msg) => {
                if inner.code == rusqlite::ErrorCode::DatabaseBusy
                    || inner.code == rusqlite::ErrorCode::DatabaseLocked
                {
                    StorageError::Locked
                } else {
                    StorageError::QueryFailed(err.to_string())
                }
            }
            _ => StorageError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Storage(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
