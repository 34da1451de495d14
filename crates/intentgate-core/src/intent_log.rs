//! Append-only history of submitted intents.
//!
//! Records are keyed by their RFC 3339 millisecond timestamp so key order is
//! chronological order. Capping the visible history is left to readers via
//! [`IntentLog::recent`].

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Yes,
    No,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentLogRecord {
    pub url: String,
    #[serde(rename = "intent")]
    pub intent_text: String,
    #[serde(rename = "accepted")]
    pub decision: Decision,
    #[serde(rename = "whitelistTime", default)]
    pub whitelist_minutes: Option<u32>,
    #[serde(skip)]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IntentLog {
    entries: BTreeMap<String, IntentLogRecord>,
}

impl IntentLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record at `at`. Never overwrites: a colliding key is bumped
    /// by a millisecond.
    pub fn append(&mut self, mut record: IntentLogRecord, at: DateTime<Utc>) -> String {
        let mut at = at;
        let mut key = timestamp_key(at);
        while self.entries.contains_key(&key) {
            at += Duration::milliseconds(1);
            key = timestamp_key(at);
        }
        record.timestamp = Some(at);
        self.entries.insert(key.clone(), record);
        key
    }

    /// Newest first, at most `limit` records, each with its timestamp filled in.
    pub fn recent(&self, limit: usize) -> Vec<IntentLogRecord> {
        self.entries
            .iter()
            .rev()
            .take(limit)
            .map(|(key, record)| {
                let mut record = record.clone();
                if record.timestamp.is_none() {
                    record.timestamp = DateTime::parse_from_rfc3339(key)
                        .ok()
                        .map(|dt| dt.with_timezone(&Utc));
                }
                record
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn timestamp_key(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(text: &str, decision: Decision) -> IntentLogRecord {
        IntentLogRecord {
            url: "https://news.com/a".into(),
            intent_text: text.into(),
            decision,
            whitelist_minutes: Some(15),
            timestamp: None,
        }
    }

    #[test]
    fn recent_is_newest_first_and_capped() {
        let t0 = Utc.with_ymd_and_hms(2026, 10, 16, 9, 0, 0).unwrap();
        let mut log = IntentLog::new();
        for (i, text) in ["one", "two", "three"].iter().enumerate() {
            log.append(record(text, Decision::Yes), t0 + Duration::minutes(i as i64));
        }
        let recent = log.recent(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].intent_text, "three");
        assert_eq!(recent[1].intent_text, "two");
        assert_eq!(recent[1].timestamp, Some(t0 + Duration::minutes(1)));
    }

    #[test]
    fn same_instant_appends_do_not_overwrite() {
        let t0 = Utc.with_ymd_and_hms(2026, 10, 16, 9, 0, 0).unwrap();
        let mut log = IntentLog::new();
        let a = log.append(record("first", Decision::No), t0);
        let b = log.append(record("second", Decision::Yes), t0);
        assert_ne!(a, b);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn wire_shape_matches_stored_history() {
        let t0 = Utc.with_ymd_and_hms(2026, 10, 16, 9, 0, 0).unwrap();
        let mut log = IntentLog::new();
        log.append(record("reading", Decision::Yes), t0);
        let json = serde_json::to_value(&log).unwrap();
        let entry = &json["2026-10-16T09:00:00.000Z"];
        assert_eq!(entry["intent"], "reading");
        assert_eq!(entry["accepted"], "yes");
        assert_eq!(entry["whitelistTime"], 15);

        let back: IntentLog = serde_json::from_value(json).unwrap();
        assert_eq!(back.recent(1)[0].timestamp, Some(t0));
    }
}
