//! Page-side gate: one page's overlay plus its own re-block timers.
//!
//! The page never touches the store directly. It asks the background for a
//! decision through [`BackgroundLink`] and sends intents the same way.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::domain::PageIdentity;
use crate::error::{GateError, Result};
use crate::events::Event;
use crate::matcher::{GateRules, GatingDecision};
use crate::messages::{IntentRequest, IntentResponse};
use crate::overlay::{OverlayController, OverlaySurface};
use crate::storage::Config;
use crate::timers::TimerArena;

/// Channel from a page to the background coordinator.
pub trait BackgroundLink {
    /// Fresh gating decision for `href`.
    fn evaluate(&self, href: &str) -> impl Future<Output = Result<GatingDecision>> + Send;

    /// The user's custom prompt text (may be empty).
    fn prompt_message(&self) -> impl Future<Output = Result<String>> + Send;

    /// Request/response round-trip for one submission.
    fn send_intent(&self, request: IntentRequest) -> impl Future<Output = Result<IntentResponse>> + Send;
}

pub struct PageGate<S: OverlaySurface> {
    href: String,
    page: Option<PageIdentity>,
    rules: GateRules,
    overlay: OverlayController<S>,
    reblock: TimerArena,
}

impl<S: OverlaySurface> PageGate<S> {
    pub fn new(href: &str, surface: S, config: &Config) -> Self {
        let page = match PageIdentity::from_href(href) {
            Ok(page) => Some(page),
            Err(err) => {
                tracing::debug!(href, "{err}");
                None
            }
        };
        Self {
            href: href.to_string(),
            page,
            rules: config.rules(),
            overlay: OverlayController::new(surface, config.duration_options(), config.dismiss_delay()),
            reblock: TimerArena::new(),
        }
    }

    pub fn href(&self) -> &str {
        &self.href
    }

    pub fn overlay(&self) -> &OverlayController<S> {
        &self.overlay
    }

    pub fn overlay_mut(&mut self) -> &mut OverlayController<S> {
        &mut self.overlay
    }

    pub fn next_reblock(&self) -> Option<DateTime<Utc>> {
        self.reblock.next_deadline()
    }

    /// Re-check gating when the page gains focus.
    pub async fn on_focus<L: BackgroundLink>(&mut self, link: &L, now: DateTime<Utc>) -> Result<Option<Event>> {
        if self.rules.exempts(&self.href) || self.overlay.is_shown() {
            return Ok(None);
        }
        let Some(domain) = self.page.as_ref().map(|p| p.domain.clone()) else {
            return Ok(None);
        };

        match link.evaluate(&self.href).await? {
            GatingDecision::RequiresPrompt => self.block(link, &domain, now).await,
            GatingDecision::WhitelistedActive { expires_at } => {
                self.reblock.schedule(&domain, expires_at);
                Ok(self.overlay.dismiss().then_some(Event::OverlayDismissed { at: now }))
            }
            GatingDecision::NotApplicable => Ok(None),
        }
    }

    /// Submit the typed intent with the currently selected duration.
    ///
    /// Returns `None` when the overlay refused to submit (hidden, a request
    /// already in flight, or no usable duration).
    pub async fn submit<L: BackgroundLink>(
        &mut self,
        link: &L,
        intent: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<IntentResponse>> {
        let request = match self.overlay.begin_submit(intent, &self.href) {
            Ok(request) => request,
            Err(blocked) => {
                tracing::debug!(?blocked, "submit refused");
                return Ok(None);
            }
        };

        let response = match link.send_intent(request).await {
            Ok(response) => response,
            Err(err) => {
                self.overlay.abort_submit();
                return Err(err);
            }
        };
        self.overlay.on_response(response, now);

        if response == IntentResponse::ok() {
            if let Some(domain) = self.page.as_ref().map(|p| p.domain.clone()) {
                if let GatingDecision::WhitelistedActive { expires_at } = link.evaluate(&self.href).await? {
                    self.reblock.schedule(&domain, expires_at);
                }
            }
        }
        Ok(Some(response))
    }

    /// Run the delayed dismiss and any due re-block timers.
    ///
    /// A re-block fire re-evaluates first: if the grant was extended in the
    /// meantime the fire is stale and re-arms at the new expiry.
    pub async fn poll<L: BackgroundLink>(&mut self, link: &L, now: DateTime<Utc>) -> Result<Vec<Event>> {
        let mut events = Vec::new();
        if self.overlay.poll(now) {
            events.push(Event::OverlayDismissed { at: now });
        }

        for token in self.reblock.take_due(now) {
            match link.evaluate(&self.href).await? {
                GatingDecision::RequiresPrompt => {
                    if let Some(event) = self.block(link, &token.key, now).await? {
                        events.push(event);
                    }
                }
                GatingDecision::WhitelistedActive { expires_at } => {
                    let stale = GateError::StaleTimerFire { key: token.key.clone() };
                    tracing::debug!(captured = %token.deadline, current = %expires_at, "{stale}");
                    self.reblock.schedule(&token.key, expires_at);
                }
                GatingDecision::NotApplicable => {}
            }
        }
        Ok(events)
    }

    async fn block<L: BackgroundLink>(&mut self, link: &L, key: &str, now: DateTime<Utc>) -> Result<Option<Event>> {
        let message = link.prompt_message().await?;
        self.overlay.set_message(&message);
        Ok(self.overlay.present(key).then(|| Event::OverlayPresented {
            key: key.to_string(),
            at: now,
        }))
    }
}
