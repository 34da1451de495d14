use clap::Subcommand;
use intentgate_core::{Config, ConfigError};
use serde_json::json;

use super::{print_json, CliResult};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print one setting by dotted key
    Get {
        /// Dotted key, e.g. "gate.min_custom_minutes" or "badge.tick_interval_ms"
        key: String,
    },
    /// Change one setting and write config.toml
    Set {
        /// Dotted key
        key: String,
        /// Value; lists take JSON, e.g. "[5, 15, 30]"
        value: String,
    },
    /// Print the whole configuration as JSON
    List,
    /// Overwrite config.toml with the built-in defaults
    Reset,
}

pub fn run(action: ConfigAction) -> CliResult {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            let value = config.get(&key).ok_or(ConfigError::UnknownKey(key))?;
            println!("{value}");
            Ok(())
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            tracing::info!(%key, "config updated");
            print_json(&json!({ "key": key, "value": config.get(&key) }))
        }
        ConfigAction::List => print_json(&Config::load()?),
        ConfigAction::Reset => {
            let config = Config::default();
            config.save()?;
            print_json(&config)
        }
    }
}
