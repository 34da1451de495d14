//! Whitelist state machine.
//!
//! ## States per key
//!
//! ```text
//! Unlisted -> Granted -> (Active | Expired)
//! ```
//!
//! A grant writes `expiry = now + minutes`, overwriting any previous entry
//! (later grant wins, no stacking). Validity is `now < expiry`; expired
//! entries stay stored and evaluate false until the next grant overwrites
//! them. There is no explicit delete.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::GateError;

/// Result of a successful grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    pub key: String,
    pub minutes: u32,
    pub expires_at: DateTime<Utc>,
}

/// Mapping from domain key to absolute expiry instant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Whitelist {
    entries: BTreeMap<String, DateTime<Utc>>,
}

impl Whitelist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a grant of `minutes` from `now`, replacing any prior entry.
    pub fn grant(&mut self, key: &str, minutes: u32, now: DateTime<Utc>) -> Grant {
        let expires_at = now + Duration::minutes(i64::from(minutes));
        self.entries.insert(key.to_string(), expires_at);
        Grant {
            key: key.to_string(),
            minutes,
            expires_at,
        }
    }

    /// `exists(key) && now < expiry`. Pure read.
    pub fn is_active(&self, key: &str, now: DateTime<Utc>) -> bool {
        self.active_expiry(key, now).is_some()
    }

    /// The stored expiry, live or not.
    pub fn expiry(&self, key: &str) -> Option<DateTime<Utc>> {
        self.entries.get(key).copied()
    }

    /// The expiry only while it is still in the future.
    pub fn active_expiry(&self, key: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.expiry(key).filter(|expiry| now < *expiry)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, DateTime<Utc>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Minimum-length gate in front of [`Whitelist::grant`].
///
/// Length counts characters. Any text at or above the minimum passes; the
/// content is never judged.
pub fn check_intent(intent: &str, min_len: usize) -> Result<(), GateError> {
    let len = intent.chars().count();
    if len < min_len {
        return Err(GateError::IntentTooShort { len, min: min_len });
    }
    Ok(())
}

// ── Storage codec ────────────────────────────────────────────────────
//
// Written as RFC 3339. Read leniently: RFC 3339, epoch milliseconds (number
// or numeric string) and the JavaScript `Date.toString()` form. Entries that
// match none of these are dropped with a warning.

impl Serialize for Whitelist {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(
            self.entries
                .iter()
                .map(|(key, expiry)| (key, expiry.to_rfc3339())),
        )
    }
}

impl<'de> Deserialize<'de> for Whitelist {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, serde_json::Value>::deserialize(deserializer)?;
        let mut entries = BTreeMap::new();
        for (key, value) in raw {
            match parse_timestamp(&value) {
                Some(expiry) => {
                    entries.insert(key, expiry);
                }
                None => {
                    tracing::warn!(%key, %value, "dropping whitelist entry with unreadable expiry");
                }
            }
        }
        Ok(Self { entries })
    }
}

pub(crate) fn parse_timestamp(value: &serde_json::Value) -> Option<DateTime<Utc>> {
    match value {
        serde_json::Value::Number(n) => n.as_i64().and_then(from_epoch_ms),
        serde_json::Value::String(s) => parse_timestamp_str(s),
        _ => None,
    }
}

fn parse_timestamp_str(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(ms) = s.parse::<i64>() {
        return from_epoch_ms(ms);
    }
    // "Fri Oct 16 2026 10:13:00 GMT+0200 (Central European Summer Time)"
    let without_zone_name = s.split(" (").next().unwrap_or(s);
    DateTime::parse_from_str(without_zone_name, "%a %b %d %Y %H:%M:%S GMT%z")
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn from_epoch_ms(ms: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single()
}
