//! Snapshot of the persisted key-value state.
//!
//! Every field is optional: a missing key means "never written", which
//! matters for first-run and upgrade handling. Read through the accessors to
//! get defaults applied.

use serde::{Deserialize, Serialize};

use crate::intent_log::IntentLog;
use crate::sites::ActiveSiteSet;
use crate::whitelist::Whitelist;

pub const DEFAULT_MIN_INTENT_LENGTH: usize = 3;
pub const DEFAULT_NUM_INTENT_ENTRIES: usize = 20;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_sites: Option<ActiveSiteSet>,
    /// The user's filter list; a superset of sites they may toggle on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocked_sites: Option<ActiveSiteSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whitelisted_sites: Option<Whitelist>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent_list: Option<IntentLog>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_intent_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_intent_entries: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_message: Option<String>,
    /// Global switch from before per-site activation; read only by migration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_enabled: Option<bool>,
}

impl StoredState {
    pub fn active_sites(&self) -> ActiveSiteSet {
        self.active_sites.clone().unwrap_or_default()
    }

    pub fn blocked_sites(&self) -> ActiveSiteSet {
        self.blocked_sites.clone().unwrap_or_default()
    }

    pub fn whitelist(&self) -> Whitelist {
        self.whitelisted_sites.clone().unwrap_or_default()
    }

    pub fn intent_log(&self) -> IntentLog {
        self.intent_list.clone().unwrap_or_default()
    }

    pub fn min_intent_length(&self) -> usize {
        self.min_intent_length.unwrap_or(DEFAULT_MIN_INTENT_LENGTH)
    }

    pub fn num_intent_entries(&self) -> usize {
        self.num_intent_entries.unwrap_or(DEFAULT_NUM_INTENT_ENTRIES)
    }

    pub fn custom_message(&self) -> &str {
        self.custom_message.as_deref().unwrap_or_default()
    }

    /// Overwrite every field present in `partial`.
    pub fn merge(&mut self, partial: &StoredState) {
        fn take<T: Clone>(dst: &mut Option<T>, src: &Option<T>) {
            if let Some(value) = src {
                *dst = Some(value.clone());
            }
        }
        take(&mut self.active_sites, &partial.active_sites);
        take(&mut self.blocked_sites, &partial.blocked_sites);
        take(&mut self.whitelisted_sites, &partial.whitelisted_sites);
        take(&mut self.intent_list, &partial.intent_list);
        take(&mut self.min_intent_length, &partial.min_intent_length);
        take(&mut self.num_intent_entries, &partial.num_intent_entries);
        take(&mut self.custom_message, &partial.custom_message);
        take(&mut self.is_enabled, &partial.is_enabled);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_missing_fields() {
        let state = StoredState::default();
        assert_eq!(state.min_intent_length(), 3);
        assert_eq!(state.num_intent_entries(), 20);
        assert!(state.active_sites().is_empty());
        assert_eq!(state.custom_message(), "");
    }

    #[test]
    fn partial_serializes_only_present_fields() {
        let partial = StoredState {
            min_intent_length: Some(5),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_string(&partial).unwrap(),
            r#"{"minIntentLength":5}"#
        );
    }

    #[test]
    fn merge_keeps_untouched_fields() {
        let mut state = StoredState {
            active_sites: Some(["news.com"].into_iter().collect()),
            custom_message: Some("focus".into()),
            ..Default::default()
        };
        state.merge(&StoredState {
            custom_message: Some("later".into()),
            ..Default::default()
        });
        assert!(state.active_sites().contains("news.com"));
        assert_eq!(state.custom_message(), "later");
    }

    #[test]
    fn reads_legacy_snapshot() {
        let json = serde_json::json!({
            "isEnabled": true,
            "blockedSites": ["facebook.com", "twitter.com"],
            "whitelistedSites": {},
            "enableBlobs": true,
            "predictionThreshold": 0.5
        });
        let state: StoredState = serde_json::from_value(json).unwrap();
        assert_eq!(state.is_enabled, Some(true));
        assert!(state.active_sites.is_none());
        assert_eq!(state.blocked_sites().len(), 2);
    }
}
