//! Cross-context message types between the prompt surface and the
//! background coordinator.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentRequest {
    pub intent: String,
    /// Full href of the page the prompt was shown on.
    pub url: String,
    /// Missing or zero falls back to the configured default.
    #[serde(default, alias = "whitelistTime")]
    pub whitelist_minutes: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentStatus {
    Ok,
    TooShort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentResponse {
    pub status: IntentStatus,
}

impl IntentResponse {
    pub fn ok() -> Self {
        Self {
            status: IntentStatus::Ok,
        }
    }

    pub fn too_short() -> Self {
        Self {
            status: IntentStatus::TooShort,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_accepts_both_minute_field_names() {
        let a: IntentRequest =
            serde_json::from_str(r#"{"intent":"x","url":"u","whitelistMinutes":5}"#).unwrap();
        let b: IntentRequest =
            serde_json::from_str(r#"{"intent":"x","url":"u","whitelistTime":5}"#).unwrap();
        let c: IntentRequest = serde_json::from_str(r#"{"intent":"x","url":"u"}"#).unwrap();
        assert_eq!(a, b);
        assert_eq!(c.whitelist_minutes, None);
    }

    #[test]
    fn status_wire_names() {
        assert_eq!(
            serde_json::to_string(&IntentResponse::too_short()).unwrap(),
            r#"{"status":"too_short"}"#
        );
        assert_eq!(
            serde_json::to_string(&IntentResponse::ok()).unwrap(),
            r#"{"status":"ok"}"#
        );
    }
}
