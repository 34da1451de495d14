//! Block-overlay lifecycle.
//!
//! ## State Transitions
//!
//! ```text
//! Hidden -> Shown -> Hidden
//! ```
//!
//! `present` while shown is a no-op, so repeated focus triggers never stack a
//! second surface or a second input focus. The surface is built once and
//! then only revealed and hidden. Submission disables the submit control
//! until the coordinator answers; an `ok` answer schedules `dismiss` after a
//! short delay so the confirmation stays readable. Like the timer arena, the
//! delayed dismiss is a deadline the owner drives through [`OverlayController::poll`].

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::messages::{IntentRequest, IntentResponse, IntentStatus};

pub const DEFAULT_PROMPT_MESSAGE: &str = "hey! what are you here for?";
pub const NO_DURATION_MESSAGE: &str = "please select a time duration";
pub const TOO_SHORT_MESSAGE: &str = "your response is a little short. be more specific!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlayState {
    Hidden,
    Shown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTone {
    Info,
    Error,
}

/// What gets rendered into a freshly built surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub key: String,
    pub message: String,
    pub presets: Vec<u32>,
}

/// Currently highlighted duration option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DurationChoice {
    Preset(u32),
    /// Raw text of the custom-minutes input.
    Custom(String),
}

/// Platform surface primitives for the prompt.
///
/// `mount` builds a full-viewport, topmost, opaque container holding the
/// prompt form. `attach_duration_listeners` must be idempotent: it is called
/// on every reveal because prior DOM mutation may have detached listeners.
pub trait OverlaySurface {
    fn mount(&mut self, prompt: &Prompt);
    /// Prompt heading. Pushed on every reveal, so it tracks `set_message`.
    fn set_message(&mut self, message: &str);
    fn set_visible(&mut self, visible: bool);
    fn focus_input(&mut self);
    fn clear_input(&mut self);
    fn attach_duration_listeners(&mut self);
    fn select_duration(&mut self, choice: &DurationChoice);
    fn set_submit_enabled(&mut self, enabled: bool);
    fn show_status(&mut self, message: &str, tone: StatusTone);
}

/// Bounds and presets for the duration selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationOptions {
    pub presets: Vec<u32>,
    pub default_minutes: u32,
    pub min_custom_minutes: u32,
    pub max_custom_minutes: u32,
}

impl Default for DurationOptions {
    fn default() -> Self {
        Self {
            presets: vec![5, 15, 30, 60],
            default_minutes: 15,
            min_custom_minutes: 1,
            max_custom_minutes: 1440,
        }
    }
}

impl DurationOptions {
    /// Custom bounds as `(low, high)`, whichever way round they were set.
    pub fn bounds(&self) -> (u32, u32) {
        let (a, b) = (self.min_custom_minutes, self.max_custom_minutes);
        (a.min(b), a.max(b))
    }

    /// Clamp a requested duration into the custom bounds.
    pub fn clamp(&self, minutes: u32) -> u32 {
        let (low, high) = self.bounds();
        minutes.clamp(low, high)
    }
}

#[derive(Debug, Clone)]
pub struct DurationSelector {
    options: DurationOptions,
    choice: DurationChoice,
}

impl DurationSelector {
    pub fn new(options: DurationOptions) -> Self {
        let choice = DurationChoice::Preset(options.default_minutes);
        Self { options, choice }
    }

    pub fn choice(&self) -> &DurationChoice {
        &self.choice
    }

    pub fn reset(&mut self) {
        self.choice = DurationChoice::Preset(self.options.default_minutes);
    }

    pub fn select_preset(&mut self, minutes: u32) {
        self.choice = DurationChoice::Preset(minutes);
    }

    pub fn set_custom(&mut self, raw: &str) {
        self.choice = DurationChoice::Custom(raw.to_string());
    }

    /// Selected minutes, or `None` when the custom input is not a number.
    pub fn minutes(&self) -> Option<u32> {
        match &self.choice {
            DurationChoice::Preset(minutes) => Some(*minutes),
            DurationChoice::Custom(raw) => {
                let value: i64 = raw.trim().parse().ok()?;
                let (low, high) = self.options.bounds();
                u32::try_from(value.clamp(i64::from(low), i64::from(high))).ok()
            }
        }
    }
}

/// Why a submit did not produce a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitBlocked {
    NotShown,
    InFlight,
    NoDuration,
}

pub struct OverlayController<S: OverlaySurface> {
    surface: S,
    state: OverlayState,
    mounted: bool,
    selector: DurationSelector,
    message: String,
    key: Option<String>,
    submitting: Option<u32>,
    pending_dismiss: Option<DateTime<Utc>>,
    dismiss_delay: Duration,
}

impl<S: OverlaySurface> OverlayController<S> {
    pub fn new(surface: S, options: DurationOptions, dismiss_delay: Duration) -> Self {
        Self {
            surface,
            state: OverlayState::Hidden,
            mounted: false,
            selector: DurationSelector::new(options),
            message: DEFAULT_PROMPT_MESSAGE.to_string(),
            key: None,
            submitting: None,
            pending_dismiss: None,
            dismiss_delay,
        }
    }

    /// Custom prompt text; empty falls back to the default greeting.
    pub fn set_message(&mut self, message: &str) {
        self.message = if message.trim().is_empty() {
            DEFAULT_PROMPT_MESSAGE.to_string()
        } else {
            message.to_string()
        };
    }

    pub fn state(&self) -> OverlayState {
        self.state
    }

    pub fn is_shown(&self) -> bool {
        self.state == OverlayState::Shown
    }

    /// Key of the most recent `present`.
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.is_some()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn selector(&self) -> &DurationSelector {
        &self.selector
    }

    // ── Transitions ──────────────────────────────────────────────────

    /// Show the prompt for `key`. Returns `false` if it was already shown.
    pub fn present(&mut self, key: &str) -> bool {
        if self.state == OverlayState::Shown {
            return false;
        }
        self.key = Some(key.to_string());
        self.pending_dismiss = None;

        if !self.mounted {
            let prompt = Prompt {
                key: key.to_string(),
                message: self.message.clone(),
                presets: self.selector.options.presets.clone(),
            };
            self.surface.mount(&prompt);
            self.mounted = true;
        }
        self.surface.set_message(&self.message);
        self.surface.attach_duration_listeners();
        self.surface.select_duration(self.selector.choice());
        self.surface.set_visible(true);
        self.surface.focus_input();
        self.state = OverlayState::Shown;
        tracing::debug!(key, "overlay presented");
        true
    }

    /// Hide, clear the text and reset the duration. Returns `false` if
    /// nothing was shown.
    pub fn dismiss(&mut self) -> bool {
        self.pending_dismiss = None;
        if !self.mounted || self.state == OverlayState::Hidden {
            return false;
        }
        self.surface.set_visible(false);
        self.surface.clear_input();
        self.selector.reset();
        self.surface.select_duration(self.selector.choice());
        self.state = OverlayState::Hidden;
        tracing::debug!("overlay dismissed");
        true
    }

    pub fn select_preset(&mut self, minutes: u32) {
        self.selector.select_preset(minutes);
        self.surface.select_duration(self.selector.choice());
    }

    pub fn set_custom_minutes(&mut self, raw: &str) {
        self.selector.set_custom(raw);
        self.surface.select_duration(self.selector.choice());
    }

    // ── Submission handshake ─────────────────────────────────────────

    /// Turn a form submit into a request for the coordinator and lock the
    /// submit control until [`Self::on_response`].
    pub fn begin_submit(&mut self, intent: &str, href: &str) -> Result<IntentRequest, SubmitBlocked> {
        if self.state != OverlayState::Shown {
            return Err(SubmitBlocked::NotShown);
        }
        if self.submitting.is_some() {
            return Err(SubmitBlocked::InFlight);
        }
        let Some(minutes) = self.selector.minutes() else {
            self.surface.show_status(NO_DURATION_MESSAGE, StatusTone::Error);
            return Err(SubmitBlocked::NoDuration);
        };

        self.submitting = Some(minutes);
        self.surface.set_submit_enabled(false);
        Ok(IntentRequest {
            intent: intent.to_string(),
            url: href.to_string(),
            whitelist_minutes: Some(minutes),
        })
    }

    /// Apply the coordinator's answer. Re-enables submit either way.
    pub fn on_response(&mut self, response: IntentResponse, now: DateTime<Utc>) {
        let minutes = self.submitting.take();
        self.surface.set_submit_enabled(true);
        match response.status {
            IntentStatus::Ok => {
                let minutes = minutes.unwrap_or(self.selector.options.default_minutes);
                self.surface.show_status(
                    &format!("got it! {minutes} minutes starting now."),
                    StatusTone::Info,
                );
                self.pending_dismiss = Some(now.checked_add_signed(self.dismiss_delay).unwrap_or(now));
            }
            IntentStatus::TooShort => {
                self.surface.show_status(TOO_SHORT_MESSAGE, StatusTone::Error);
                self.surface.clear_input();
            }
        }
    }

    /// Release the submit lock when the channel failed to answer.
    pub fn abort_submit(&mut self) {
        self.submitting = None;
        self.surface.set_submit_enabled(true);
    }

    /// Run the delayed dismiss once due. Returns `true` if it ran.
    pub fn poll(&mut self, now: DateTime<Utc>) -> bool {
        match self.pending_dismiss {
            Some(at) if at <= now => self.dismiss(),
            _ => false,
        }
    }

    pub fn pending_dismiss(&self) -> Option<DateTime<Utc>> {
        self.pending_dismiss
    }
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingSurface;
    use super::*;

    fn controller() -> OverlayController<RecordingSurface> {
        OverlayController::new(
            RecordingSurface::default(),
            DurationOptions::default(),
            Duration::seconds(1),
        )
    }

    #[test]
    fn present_twice_builds_one_surface_and_one_focus() {
        let mut overlay = controller();
        assert!(overlay.present("news.com"));
        assert!(!overlay.present("news.com"));
        let surface = overlay.surface();
        assert_eq!(surface.mounts, 1);
        assert_eq!(surface.focus_calls, 1);
        assert_eq!(surface.listener_sets, 1);
        assert!(surface.visible);
    }

    #[test]
    fn reveal_after_dismiss_reuses_surface_and_refocuses() {
        let mut overlay = controller();
        overlay.present("news.com");
        overlay.select_preset(60);
        assert!(overlay.dismiss());
        assert!(!overlay.surface().visible);
        assert_eq!(overlay.selector().choice(), &DurationChoice::Preset(15));
        assert_eq!(overlay.surface().input_cleared, 1);

        assert!(overlay.present("news.com"));
        assert_eq!(overlay.surface().mounts, 1);
        assert_eq!(overlay.surface().focus_calls, 2);
        assert_eq!(overlay.surface().listener_sets, 1);
    }

    #[test]
    fn dismiss_without_surface_is_noop() {
        let mut overlay = controller();
        assert!(!overlay.dismiss());
        assert_eq!(overlay.surface().input_cleared, 0);
    }

    #[test]
    fn custom_minutes_are_clamped() {
        let mut selector = DurationSelector::new(DurationOptions::default());
        selector.set_custom("5000");
        assert_eq!(selector.minutes(), Some(1440));
        selector.set_custom("0");
        assert_eq!(selector.minutes(), Some(1));
        selector.set_custom(" 42 ");
        assert_eq!(selector.minutes(), Some(42));
        selector.set_custom("soon");
        assert_eq!(selector.minutes(), None);
        selector.set_custom("");
        assert_eq!(selector.minutes(), None);
    }

    #[test]
    fn submit_locks_until_response_then_dismisses_after_delay() {
        let now = Utc::now();
        let mut overlay = controller();
        overlay.present("news.com");
        overlay.select_preset(30);

        let request = overlay.begin_submit("reading for research", "https://news.com/a").unwrap();
        assert_eq!(request.whitelist_minutes, Some(30));
        assert!(!overlay.surface().submit_enabled);
        assert_eq!(
            overlay.begin_submit("again", "https://news.com/a"),
            Err(SubmitBlocked::InFlight)
        );

        overlay.on_response(IntentResponse::ok(), now);
        assert!(overlay.surface().submit_enabled);
        assert_eq!(
            overlay.surface().statuses.last().unwrap().0,
            "got it! 30 minutes starting now."
        );
        assert!(!overlay.poll(now + Duration::milliseconds(500)));
        assert!(overlay.is_shown());
        assert!(overlay.poll(now + Duration::seconds(1)));
        assert!(!overlay.is_shown());
    }

    #[test]
    fn too_short_keeps_overlay_editable() {
        let now = Utc::now();
        let mut overlay = controller();
        overlay.present("news.com");
        overlay.begin_submit("ok", "https://news.com").unwrap();
        overlay.on_response(IntentResponse::too_short(), now);
        assert!(overlay.is_shown());
        assert!(overlay.surface().submit_enabled);
        assert_eq!(overlay.surface().statuses.last().unwrap().0, TOO_SHORT_MESSAGE);
        assert!(overlay.pending_dismiss().is_none());
        assert!(overlay.begin_submit("yes", "https://news.com").is_ok());
    }

    #[test]
    fn unparseable_custom_duration_blocks_submit() {
        let mut overlay = controller();
        overlay.present("news.com");
        overlay.set_custom_minutes("abc");
        assert_eq!(
            overlay.begin_submit("reading", "https://news.com"),
            Err(SubmitBlocked::NoDuration)
        );
        assert!(overlay.surface().submit_enabled);
        assert_eq!(overlay.surface().statuses.last().unwrap().0, NO_DURATION_MESSAGE);
    }

    #[test]
    fn custom_message_reaches_prompt() {
        let mut overlay = controller();
        overlay.set_message("back to work?");
        overlay.present("news.com");
        assert_eq!(overlay.surface().prompt.as_ref().unwrap().message, "back to work?");

        let mut fallback = controller();
        fallback.set_message("  ");
        fallback.present("news.com");
        assert_eq!(
            fallback.surface().prompt.as_ref().unwrap().message,
            DEFAULT_PROMPT_MESSAGE
        );
    }

    #[test]
    fn message_change_shows_on_next_reveal() {
        let mut overlay = controller();
        overlay.set_message("first");
        overlay.present("news.com");
        assert_eq!(overlay.surface().message.as_deref(), Some("first"));

        overlay.dismiss();
        overlay.set_message("second");
        overlay.present("news.com");
        assert_eq!(overlay.surface().mounts, 1);
        assert_eq!(overlay.surface().message.as_deref(), Some("second"));
    }

    #[test]
    fn inverted_custom_bounds_do_not_panic() {
        let options = DurationOptions {
            min_custom_minutes: 2000,
            max_custom_minutes: 1440,
            ..DurationOptions::default()
        };
        assert_eq!(options.bounds(), (1440, 2000));
        assert_eq!(options.clamp(15), 1440);
        assert_eq!(options.clamp(5000), 2000);

        let mut selector = DurationSelector::new(options);
        selector.set_custom("90");
        assert_eq!(selector.minutes(), Some(1440));
    }

    #[test]
    fn huge_dismiss_delay_does_not_overflow() {
        let mut overlay = OverlayController::new(
            RecordingSurface::default(),
            DurationOptions::default(),
            Duration::MAX,
        );
        overlay.present("news.com");
        let request = overlay.begin_submit("reading", "https://news.com").unwrap();
        assert_eq!(request.whitelist_minutes, Some(15));
        let now = Utc::now();
        overlay.on_response(IntentResponse::ok(), now);
        assert_eq!(overlay.pending_dismiss(), Some(now));
        assert!(overlay.poll(now));
    }
}
