//! TOML-based application configuration.
//!
//! Stores operator preferences including:
//! - Whitelist duration presets and custom bounds
//! - Pages that are never gated (link wrappers, onboarding)
//! - Badge tick interval
//! - First-run defaults
//! - Log filter
//!
//! Configuration is stored at `~/.config/intentgate/config.toml`. Knobs the
//! options page edits (`minIntentLength`, `customMessage`, ...) live in the
//! persisted state instead.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::{ConfigError, Result};
use crate::matcher::GateRules;
use crate::overlay::DurationOptions;

/// Longest accepted `gate.dismiss_delay_ms`.
pub const MAX_DISMISS_DELAY_MS: u64 = 60_000;

/// Gating and whitelist configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    #[serde(default = "default_whitelist_minutes")]
    pub default_whitelist_minutes: u32,
    #[serde(default = "default_duration_presets")]
    pub duration_presets: Vec<u32>,
    #[serde(default = "default_min_custom_minutes")]
    pub min_custom_minutes: u32,
    #[serde(default = "default_max_custom_minutes")]
    pub max_custom_minutes: u32,
    /// Delay between the "got it!" confirmation and hiding the prompt.
    #[serde(default = "default_dismiss_delay_ms")]
    pub dismiss_delay_ms: u64,
    #[serde(default = "default_passthrough_wrappers")]
    pub passthrough_wrappers: Vec<String>,
    #[serde(default = "default_onboarding_urls")]
    pub onboarding_urls: Vec<String>,
}

/// Badge countdown configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BadgeConfig {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

/// First-run defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetupConfig {
    #[serde(default = "default_blocked_sites")]
    pub default_blocked_sites: Vec<String>,
    #[serde(default = "default_num_intent_entries")]
    pub num_intent_entries: usize,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directive, overridden by `INTENTGATE_LOG`.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/intentgate/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub gate: GateConfig,
    #[serde(default)]
    pub badge: BadgeConfig,
    #[serde(default)]
    pub setup: SetupConfig,
    #[serde(default)]
    pub log: LogConfig,
}

// Default functions
fn default_whitelist_minutes() -> u32 {
    15
}
fn default_duration_presets() -> Vec<u32> {
    vec![5, 15, 30, 60]
}
fn default_min_custom_minutes() -> u32 {
    1
}
fn default_max_custom_minutes() -> u32 {
    1440
}
fn default_dismiss_delay_ms() -> u64 {
    1000
}
fn default_passthrough_wrappers() -> Vec<String> {
    vec!["facebook.com/flx".into(), "l.facebook.com".into()]
}
fn default_onboarding_urls() -> Vec<String> {
    vec![
        "https://getreflect.app/onboarding/".into(),
        "http://localhost:1313/onboarding/".into(),
    ]
}
fn default_tick_interval_ms() -> u64 {
    1000
}
fn default_blocked_sites() -> Vec<String> {
    ["facebook.com", "twitter.com", "instagram.com", "youtube.com"]
        .into_iter()
        .map(String::from)
        .collect()
}
fn default_num_intent_entries() -> usize {
    20
}
fn default_log_filter() -> String {
    "warn".into()
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            default_whitelist_minutes: default_whitelist_minutes(),
            duration_presets: default_duration_presets(),
            min_custom_minutes: default_min_custom_minutes(),
            max_custom_minutes: default_max_custom_minutes(),
            dismiss_delay_ms: default_dismiss_delay_ms(),
            passthrough_wrappers: default_passthrough_wrappers(),
            onboarding_urls: default_onboarding_urls(),
        }
    }
}

impl Default for BadgeConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

impl Default for SetupConfig {
    fn default() -> Self {
        Self {
            default_blocked_sites: default_blocked_sites(),
            num_intent_entries: default_num_intent_entries(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as number")));
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the data directory, writing defaults if the file is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
            .into()),
        }
    }

    /// Persist to the data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!("using default config: {e}");
            Self::default()
        })
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a value by dot-separated key without saving.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not fit the
    /// field's type.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Check cross-field constraints serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when the custom duration bounds
    /// are inverted or the dismiss delay exceeds [`MAX_DISMISS_DELAY_MS`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        let gate = &self.gate;
        if gate.min_custom_minutes > gate.max_custom_minutes {
            return Err(ConfigError::InvalidValue {
                key: "gate.min_custom_minutes".into(),
                message: format!(
                    "{} is above gate.max_custom_minutes ({})",
                    gate.min_custom_minutes, gate.max_custom_minutes
                ),
            });
        }
        if gate.dismiss_delay_ms > MAX_DISMISS_DELAY_MS {
            return Err(ConfigError::InvalidValue {
                key: "gate.dismiss_delay_ms".into(),
                message: format!("must be at most {MAX_DISMISS_DELAY_MS}"),
            });
        }
        Ok(())
    }

    /// Set a value by key and save. Returns error if key is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.apply(key, value)?;
        self.save()
    }

    pub fn rules(&self) -> GateRules {
        GateRules {
            passthrough_wrappers: self.gate.passthrough_wrappers.clone(),
            onboarding_urls: self.gate.onboarding_urls.clone(),
        }
    }

    pub fn duration_options(&self) -> DurationOptions {
        DurationOptions {
            presets: self.gate.duration_presets.clone(),
            default_minutes: self.gate.default_whitelist_minutes,
            min_custom_minutes: self.gate.min_custom_minutes,
            max_custom_minutes: self.gate.max_custom_minutes,
        }
    }

    pub fn dismiss_delay(&self) -> chrono::Duration {
        let ms = self.gate.dismiss_delay_ms.min(MAX_DISMISS_DELAY_MS);
        chrono::Duration::milliseconds(i64::try_from(ms).unwrap_or(0))
    }

    pub fn tick_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.badge.tick_interval_ms.max(1))
    }
}
