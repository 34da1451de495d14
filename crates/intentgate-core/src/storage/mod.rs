mod config;
pub mod database;
pub mod memory;
pub mod state;

pub use config::{BadgeConfig, Config, GateConfig, LogConfig, SetupConfig};
pub use database::SqliteStore;
pub use memory::MemoryStore;
pub use state::StoredState;

use std::path::PathBuf;

use crate::error::{ConfigError, Result};

/// Persisted key-value state collaborator.
///
/// Individual `get` and `set` calls are atomic; read-modify-write sequences
/// are not, so callers serialize them (see `Coordinator`).
pub trait StateStore: Send {
    /// Snapshot of every stored field.
    fn get(&self) -> Result<StoredState>;

    /// Write only the fields present in `partial`.
    fn set(&mut self, partial: &StoredState) -> Result<()>;
}

/// Returns the data directory, creating it if needed.
///
/// `INTENTGATE_HOME` wins outright. Otherwise `~/.config/intentgate/`, or
/// `~/.config/intentgate-dev/` when `INTENTGATE_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os("INTENTGATE_HOME") {
        Some(home) if !home.is_empty() => PathBuf::from(home),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("INTENTGATE_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("intentgate-dev")
            } else {
                base_dir.join("intentgate")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
