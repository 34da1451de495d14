//! Countdown badge projection.
//!
//! The projector is ticked by an external periodic primitive (about once a
//! second). Each tick resolves the current page's domain, looks up its
//! whitelist expiry and either shows the remaining time or clears the label
//! and disarms itself until the next grant or focus change re-arms it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain;
use crate::sites::IconState;
use crate::whitelist::Whitelist;

/// Output sink for the toolbar label and icon. No feedback into core logic.
pub trait BadgeSink {
    fn set_badge_text(&mut self, text: &str);
    fn set_icon(&mut self, icon: IconState);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "badge", content = "text", rename_all = "lowercase")]
pub enum BadgeUpdate {
    Show(String),
    Clear,
}

/// Render remaining whitelist time as a short label.
///
/// Milliseconds round half-up to whole seconds. More than 60 seconds shows
/// rounded minutes (`2m`), otherwise seconds (`45s`). Zero or negative
/// clears the label (`None`).
pub fn format_remaining(remaining_ms: i64) -> Option<String> {
    if remaining_ms <= 0 {
        return None;
    }
    let secs = (remaining_ms + 500) / 1000;
    if secs <= 0 {
        return None;
    }
    if secs > 60 {
        let mins = (secs + 30) / 60;
        Some(format!("{mins}m"))
    } else {
        Some(format!("{secs}s"))
    }
}

/// Pure projection for one page.
pub fn project<S: AsRef<str>>(urls: &[S], whitelist: &Whitelist, now: DateTime<Utc>) -> BadgeUpdate {
    let key = domain::normalize(urls, false);
    if key.is_empty() {
        return BadgeUpdate::Clear;
    }
    let Some(expiry) = whitelist.expiry(&key) else {
        return BadgeUpdate::Clear;
    };
    let remaining_ms = (expiry - now).num_milliseconds();
    match format_remaining(remaining_ms) {
        Some(label) => BadgeUpdate::Show(label),
        None => BadgeUpdate::Clear,
    }
}

#[derive(Debug, Default)]
pub struct BadgeProjector {
    armed: bool,
}

impl BadgeProjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start ticking. Safe to call while already armed.
    pub fn arm(&mut self) {
        self.armed = true;
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Disarm and clear the label.
    pub fn stop(&mut self, sink: &mut dyn BadgeSink) {
        self.armed = false;
        sink.set_badge_text("");
    }

    /// One tick. Returns `None` while disarmed.
    pub fn tick<S: AsRef<str>>(
        &mut self,
        urls: &[S],
        whitelist: &Whitelist,
        now: DateTime<Utc>,
        sink: &mut dyn BadgeSink,
    ) -> Option<BadgeUpdate> {
        if !self.armed {
            return None;
        }
        let update = project(urls, whitelist, now);
        match &update {
            BadgeUpdate::Show(label) => sink.set_badge_text(label),
            BadgeUpdate::Clear => {
                tracing::debug!("nothing to count down, badge stopped");
                self.stop(sink);
            }
        }
        Some(update)
    }
}
