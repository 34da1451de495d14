use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::sites::IconState;

/// Every state change in the system produces an Event.
/// Surfaces render them; the CLI prints them as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// First-run defaults were written.
    SetupCompleted {
        blocked_sites: Vec<String>,
        at: DateTime<Utc>,
    },
    /// Legacy state was migrated on upgrade.
    StateMigrated {
        activated: Vec<String>,
        at: DateTime<Utc>,
    },
    SiteActivated {
        site: String,
        icon: IconState,
        at: DateTime<Utc>,
    },
    SiteDeactivated {
        site: String,
        icon: IconState,
        at: DateTime<Utc>,
    },
    /// Every site was turned off at once.
    GatingTurnedOff {
        count: usize,
        at: DateTime<Utc>,
    },
    WhitelistGranted {
        key: String,
        minutes: u32,
        expires_at: DateTime<Utc>,
        at: DateTime<Utc>,
    },
    IntentRejected {
        url: String,
        length: usize,
        min_length: usize,
        at: DateTime<Utc>,
    },
    /// A grant ran out; consumers should re-evaluate the key.
    WhitelistExpired {
        key: String,
        at: DateTime<Utc>,
    },
    OverlayPresented {
        key: String,
        at: DateTime<Utc>,
    },
    OverlayDismissed {
        at: DateTime<Utc>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_type_tagged() {
        let at = Utc::now();
        let json = serde_json::to_value(Event::WhitelistExpired {
            key: "news.com".into(),
            at,
        })
        .unwrap();
        assert_eq!(json["type"], "WhitelistExpired");
        assert_eq!(json["key"], "news.com");
    }
}
