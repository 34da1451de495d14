//! Background coordinator.
//!
//! Owns the state store and is the only writer. Every read-modify-write
//! (read the snapshot, change one field, write it back) holds the store lock
//! across both calls, so concurrent triggers (a tab toggling a site while an
//! intent is granted elsewhere) queue up instead of overwriting each other.
//!
//! Deferred expiry callbacks live in a [`TimerArena`]; the owner drives them
//! with [`Coordinator::fire_due`] from its periodic tick.

use std::future::Future;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::badge::{BadgeProjector, BadgeSink, BadgeUpdate};
use crate::clock::{Clock, SystemClock};
use crate::domain::{self, PageIdentity};
use crate::error::{GateError, Result};
use crate::events::Event;
use crate::intent_log::{Decision, IntentLog, IntentLogRecord};
use crate::matcher::{self, GatingDecision};
use crate::messages::{IntentRequest, IntentResponse};
use crate::page::BackgroundLink;
use crate::sites::{canonical_site, ActiveSiteSet, IconState};
use crate::storage::{Config, StateStore, StoredState};
use crate::whitelist::{self, Grant, Whitelist};
use crate::timers::TimerArena;

/// Result of handling one intent submission.
#[derive(Debug, Clone, PartialEq)]
pub struct IntentOutcome {
    pub response: IntentResponse,
    pub event: Event,
}

pub struct Coordinator<S: StateStore, C: Clock = SystemClock> {
    store: Mutex<S>,
    timers: Mutex<TimerArena>,
    badge: Mutex<BadgeProjector>,
    clock: C,
    config: Config,
}

impl<S: StateStore> Coordinator<S, SystemClock> {
    pub fn new(store: S, config: Config) -> Self {
        Self::with_clock(store, config, SystemClock)
    }
}

impl<S: StateStore, C: Clock> Coordinator<S, C> {
    pub fn with_clock(store: S, config: Config, clock: C) -> Self {
        Self {
            store: Mutex::new(store),
            timers: Mutex::new(TimerArena::new()),
            badge: Mutex::new(BadgeProjector::new()),
            clock,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub async fn state(&self) -> Result<StoredState> {
        self.store.lock().await.get()
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Write first-install defaults. Nothing is active until the user turns
    /// a site on.
    pub async fn first_time_setup(&self) -> Result<Event> {
        let blocked: ActiveSiteSet = self.config.setup.default_blocked_sites.iter().cloned().collect();
        let mut store = self.store.lock().await;
        store.set(&StoredState {
            active_sites: Some(ActiveSiteSet::new()),
            blocked_sites: Some(blocked.clone()),
            whitelisted_sites: Some(Whitelist::new()),
            intent_list: Some(IntentLog::new()),
            num_intent_entries: Some(self.config.setup.num_intent_entries),
            custom_message: Some(String::new()),
            is_enabled: Some(false),
            ..Default::default()
        })?;
        tracing::info!(blocked = blocked.len(), "default values have been set");
        Ok(Event::SetupCompleted {
            blocked_sites: blocked.iter().map(String::from).collect(),
            at: self.clock.now(),
        })
    }

    /// Upgrade from the global on/off switch to per-site activation.
    ///
    /// Returns `None` when the state is already in the current shape.
    pub async fn migrate_legacy(&self) -> Result<Option<Event>> {
        let mut store = self.store.lock().await;
        let state = store.get()?;
        if state.active_sites.is_some() {
            return Ok(None);
        }

        let activated = match (&state.is_enabled, &state.blocked_sites) {
            (Some(true), Some(blocked)) => blocked.clone(),
            _ => ActiveSiteSet::new(),
        };
        store.set(&StoredState {
            active_sites: Some(activated.clone()),
            ..Default::default()
        })?;
        tracing::info!(activated = activated.len(), "migrated legacy state");
        Ok(Some(Event::StateMigrated {
            activated: activated.iter().map(String::from).collect(),
            at: self.clock.now(),
        }))
    }

    /// Set the startup icon; with any site active the badge starts ticking.
    pub async fn startup_icon(&self, sink: &mut dyn BadgeSink) -> Result<IconState> {
        let icon = self.store.lock().await.get()?.active_sites().icon_state();
        sink.set_icon(icon);
        if icon == IconState::On {
            self.badge.lock().await.arm();
        }
        Ok(icon)
    }

    // ── Active sites ─────────────────────────────────────────────────

    pub async fn active_sites(&self) -> Result<ActiveSiteSet> {
        Ok(self.store.lock().await.get()?.active_sites())
    }

    /// Activate a site and add it to the filter list (set union on both).
    pub async fn add_active_site(&self, site: &str) -> Result<Event> {
        let site = canonical_site(site)?;
        let mut store = self.store.lock().await;
        let state = store.get()?;
        let mut active = state.active_sites();
        let mut blocked = state.blocked_sites();
        active.insert(site.as_str());
        blocked.insert(site.as_str());
        let icon = active.icon_state();
        store.set(&StoredState {
            active_sites: Some(active),
            blocked_sites: Some(blocked),
            ..Default::default()
        })?;
        tracing::info!(%site, "site activated");
        Ok(Event::SiteActivated {
            site,
            icon,
            at: self.clock.now(),
        })
    }

    /// Remove a site from both the active set and the filter list.
    pub async fn remove_active_site(&self, site: &str) -> Result<Event> {
        let site = canonical_site(site)?;
        let mut store = self.store.lock().await;
        let state = store.get()?;
        let mut active = state.active_sites();
        let mut blocked = state.blocked_sites();
        active.remove(&site);
        blocked.remove(&site);
        let icon = active.icon_state();
        store.set(&StoredState {
            active_sites: Some(active),
            blocked_sites: Some(blocked),
            ..Default::default()
        })?;
        tracing::info!(%site, "site removed");
        Ok(Event::SiteDeactivated {
            site,
            icon,
            at: self.clock.now(),
        })
    }

    /// Toggle a site in the active set only; the filter list is untouched.
    pub async fn set_site_active(&self, site: &str, on: bool) -> Result<Event> {
        let site = canonical_site(site)?;
        let mut store = self.store.lock().await;
        let mut active = store.get()?.active_sites();
        if on {
            active.insert(site.as_str());
        } else {
            active.remove(&site);
        }
        let icon = active.icon_state();
        store.set(&StoredState {
            active_sites: Some(active),
            ..Default::default()
        })?;
        let at = self.clock.now();
        Ok(if on {
            Event::SiteActivated { site, icon, at }
        } else {
            Event::SiteDeactivated { site, icon, at }
        })
    }

    /// Turn gating off everywhere. `None` if nothing was active.
    pub async fn turn_all_off(&self) -> Result<Option<Event>> {
        let mut store = self.store.lock().await;
        let active = store.get()?.active_sites();
        if active.is_empty() {
            return Ok(None);
        }
        store.set(&StoredState {
            active_sites: Some(ActiveSiteSet::new()),
            ..Default::default()
        })?;
        tracing::info!(count = active.len(), "gating turned off for all sites");
        Ok(Some(Event::GatingTurnedOff {
            count: active.len(),
            at: self.clock.now(),
        }))
    }

    // ── Options ──────────────────────────────────────────────────────

    pub async fn set_min_intent_length(&self, min: usize) -> Result<()> {
        self.store.lock().await.set(&StoredState {
            min_intent_length: Some(min),
            ..Default::default()
        })
    }

    pub async fn set_custom_message(&self, message: &str) -> Result<()> {
        self.store.lock().await.set(&StoredState {
            custom_message: Some(message.to_string()),
            ..Default::default()
        })
    }

    /// Newest-first intent history; `None` uses `numIntentEntries`.
    pub async fn intent_history(&self, limit: Option<usize>) -> Result<Vec<IntentLogRecord>> {
        let state = self.store.lock().await.get()?;
        let limit = limit.unwrap_or_else(|| state.num_intent_entries());
        Ok(state.intent_log().recent(limit))
    }

    // ── Gating ───────────────────────────────────────────────────────

    /// Fresh gating decision for the page behind `urls`.
    pub async fn evaluate<U: AsRef<str> + Sync>(&self, urls: &[U]) -> Result<GatingDecision> {
        let page = match PageIdentity::from_urls(urls) {
            Ok(page) => page,
            Err(err) => {
                tracing::debug!("{err}");
                return Ok(GatingDecision::NotApplicable);
            }
        };
        let state = self.store.lock().await.get()?;
        let decision = matcher::evaluate(
            &page,
            &state.active_sites(),
            &state.whitelist(),
            &self.config.rules(),
            self.clock.now(),
        );
        if let GatingDecision::WhitelistedActive { .. } = decision {
            self.badge.lock().await.arm();
        }
        Ok(decision)
    }

    /// Grant `minutes` of access to `key` and arm its expiry timer.
    pub async fn grant_whitelist(&self, key: &str, minutes: u32) -> Result<Grant> {
        let grant = {
            let mut store = self.store.lock().await;
            let mut whitelist = store.get()?.whitelist();
            let grant = whitelist.grant(key, minutes, self.clock.now());
            store.set(&StoredState {
                whitelisted_sites: Some(whitelist),
                ..Default::default()
            })?;
            grant
        };
        self.timers.lock().await.schedule(key, grant.expires_at);
        self.badge.lock().await.arm();
        tracing::info!(key, minutes, expires_at = %grant.expires_at, "whitelist granted");
        Ok(grant)
    }

    /// Handle a prompt submission.
    ///
    /// Text shorter than `minIntentLength` is answered `too_short` with no
    /// grant; anything else is granted. Both outcomes are appended to the
    /// intent history.
    pub async fn handle_intent(&self, request: &IntentRequest) -> Result<IntentOutcome> {
        let now = self.clock.now();
        let options = self.config.duration_options();
        let minutes = options.clamp(
            request
                .whitelist_minutes
                .filter(|m| *m > 0)
                .unwrap_or(options.default_minutes),
        );
        let key = domain::domain_of(&request.url);

        let outcome = {
            let mut store = self.store.lock().await;
            let state = store.get()?;
            let mut log = state.intent_log();

            let checked = whitelist::check_intent(&request.intent, state.min_intent_length());
            let (outcome, whitelist) = match checked {
                Err(GateError::IntentTooShort { len, min }) => {
                    tracing::debug!(len, min, "intent too short");
                    let outcome = IntentOutcome {
                        response: IntentResponse::too_short(),
                        event: Event::IntentRejected {
                            url: request.url.clone(),
                            length: len,
                            min_length: min,
                            at: now,
                        },
                    };
                    (outcome, None)
                }
                _ => {
                    let mut whitelist = state.whitelist();
                    let expires_at = if key.is_empty() {
                        tracing::debug!(url = %request.url, "{}", GateError::EmptyDomain);
                        now
                    } else {
                        whitelist.grant(&key, minutes, now).expires_at
                    };
                    let outcome = IntentOutcome {
                        response: IntentResponse::ok(),
                        event: Event::WhitelistGranted {
                            key: key.clone(),
                            minutes,
                            expires_at,
                            at: now,
                        },
                    };
                    (outcome, (!key.is_empty()).then_some(whitelist))
                }
            };

            let decision = if outcome.response == IntentResponse::ok() {
                Decision::Yes
            } else {
                Decision::No
            };
            log.append(
                IntentLogRecord {
                    url: request.url.clone(),
                    intent_text: request.intent.clone(),
                    decision,
                    whitelist_minutes: Some(minutes),
                    timestamp: None,
                },
                now,
            );

            store.set(&StoredState {
                whitelisted_sites: whitelist,
                intent_list: Some(log),
                ..Default::default()
            })?;
            outcome
        };

        if let Event::WhitelistGranted { key, expires_at, .. } = &outcome.event {
            if !key.is_empty() {
                self.timers.lock().await.schedule(key, *expires_at);
                self.badge.lock().await.arm();
                tracing::info!(%key, minutes, intent = %request.intent, "access granted");
            }
        }
        Ok(outcome)
    }

    // ── Deferred expiry ──────────────────────────────────────────────

    pub async fn next_deadline(&self) -> Option<DateTime<Utc>> {
        self.timers.lock().await.next_deadline()
    }

    pub async fn has_pending_timers(&self) -> bool {
        !self.timers.lock().await.is_empty()
    }

    /// Fire due expiry timers.
    ///
    /// Each fire re-reads the whitelist: if the expiry it captured is no
    /// longer the stored one, the fire is stale and ignored (re-armed to the
    /// stored expiry if that is still live).
    pub async fn fire_due(&self) -> Result<Vec<Event>> {
        let now = self.clock.now();
        let due = self.timers.lock().await.take_due(now);
        if due.is_empty() {
            return Ok(Vec::new());
        }

        let whitelist = self.store.lock().await.get()?.whitelist();
        let mut events = Vec::new();
        let mut timers = self.timers.lock().await;
        for token in due {
            let current = whitelist.expiry(&token.key);
            if current == Some(token.deadline) {
                tracing::debug!(key = %token.key, "whitelist expired");
                events.push(Event::WhitelistExpired {
                    key: token.key,
                    at: now,
                });
                continue;
            }

            let stale = GateError::StaleTimerFire {
                key: token.key.clone(),
            };
            tracing::debug!("{stale}");
            if let Some(live) = whitelist.active_expiry(&token.key, now) {
                timers.schedule(&token.key, live);
            }
        }
        Ok(events)
    }

    // ── Badge ────────────────────────────────────────────────────────

    /// Whether the badge projector is ticking.
    ///
    /// It stops itself once there is nothing to count down and is re-armed
    /// by a new grant, a whitelisted evaluation or a startup with active
    /// sites.
    pub async fn badge_armed(&self) -> bool {
        self.badge.lock().await.is_armed()
    }

    pub async fn arm_badge(&self) {
        self.badge.lock().await.arm();
    }

    /// One badge tick for the page behind `urls`. `None` while disarmed.
    pub async fn badge_tick<U: AsRef<str>>(
        &self,
        urls: &[U],
        sink: &mut dyn BadgeSink,
    ) -> Result<Option<BadgeUpdate>> {
        let mut projector = self.badge.lock().await;
        if !projector.is_armed() {
            return Ok(None);
        }
        let whitelist = self.store.lock().await.get()?.whitelist();
        Ok(projector.tick(urls, &whitelist, self.clock.now(), sink))
    }
}

impl<S: StateStore, C: Clock> BackgroundLink for Coordinator<S, C> {
    fn evaluate(&self, href: &str) -> impl Future<Output = Result<GatingDecision>> + Send {
        let urls = [href.to_string()];
        async move { Coordinator::evaluate(self, &urls).await }
    }

    fn prompt_message(&self) -> impl Future<Output = Result<String>> + Send {
        async move { Ok(self.state().await?.custom_message().to_string()) }
    }

    fn send_intent(&self, request: IntentRequest) -> impl Future<Output = Result<IntentResponse>> + Send {
        async move { Ok(self.handle_intent(&request).await?.response) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::storage::MemoryStore;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 9, 0, 0).unwrap()
    }

    fn coordinator() -> (Coordinator<MemoryStore, ManualClock>, MemoryStore, ManualClock) {
        let store = MemoryStore::new();
        let clock = ManualClock::new(t0());
        let coordinator = Coordinator::with_clock(store.clone(), Config::default(), clock.clone());
        (coordinator, store, clock)
    }

    fn request(intent: &str, minutes: u32) -> IntentRequest {
        IntentRequest {
            intent: intent.into(),
            url: "https://example.com/page".into(),
            whitelist_minutes: Some(minutes),
        }
    }

    #[tokio::test]
    async fn setup_writes_defaults_with_nothing_active() {
        let (coordinator, store, _) = coordinator();
        coordinator.first_time_setup().await.unwrap();
        let state = store.snapshot();
        assert!(state.active_sites().is_empty());
        assert_eq!(state.blocked_sites().len(), 4);
        assert_eq!(state.num_intent_entries(), 20);
        assert_eq!(state.is_enabled, Some(false));
    }

    #[tokio::test]
    async fn legacy_enabled_state_activates_blocked_sites() {
        let store = MemoryStore::with_state(StoredState {
            is_enabled: Some(true),
            blocked_sites: Some(["a.com", "b.com"].into_iter().collect()),
            ..Default::default()
        });
        let coordinator = Coordinator::new(store.clone(), Config::default());
        let event = coordinator.migrate_legacy().await.unwrap();
        assert!(matches!(event, Some(Event::StateMigrated { ref activated, .. }) if activated.len() == 2));
        assert!(store.snapshot().active_sites().contains("b.com"));
        assert!(coordinator.migrate_legacy().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn legacy_disabled_state_gets_empty_active_set() {
        let store = MemoryStore::with_state(StoredState {
            is_enabled: Some(false),
            blocked_sites: Some(["a.com"].into_iter().collect()),
            ..Default::default()
        });
        let coordinator = Coordinator::new(store.clone(), Config::default());
        coordinator.migrate_legacy().await.unwrap();
        assert_eq!(store.snapshot().active_sites, Some(ActiveSiteSet::new()));
    }

    #[tokio::test]
    async fn site_mutations_track_icon_and_filter_list() {
        let (coordinator, store, _) = coordinator();
        let event = coordinator.add_active_site("https://www.news.com/x").await.unwrap();
        assert!(matches!(event, Event::SiteActivated { ref site, icon: IconState::On, .. } if site == "https://www.news.com"));
        coordinator.add_active_site("news.com").await.unwrap();
        coordinator.add_active_site("news.com").await.unwrap();
        assert_eq!(store.snapshot().active_sites().len(), 2);

        coordinator.set_site_active("news.com", false).await.unwrap();
        let state = store.snapshot();
        assert!(!state.active_sites().contains("news.com"));
        assert!(state.blocked_sites().contains("news.com"));

        let event = coordinator.remove_active_site("https://www.news.com").await.unwrap();
        assert!(matches!(event, Event::SiteDeactivated { icon: IconState::Off, .. }));
        assert!(!store.snapshot().blocked_sites().contains("https://www.news.com"));
    }

    #[tokio::test]
    async fn invalid_site_is_rejected() {
        let (coordinator, _, _) = coordinator();
        assert!(coordinator.add_active_site("chrome://newtab").await.is_err());
    }

    #[tokio::test]
    async fn turn_all_off_only_when_something_is_on() {
        let (coordinator, store, _) = coordinator();
        assert!(coordinator.turn_all_off().await.unwrap().is_none());
        coordinator.add_active_site("a.com").await.unwrap();
        coordinator.add_active_site("b.com").await.unwrap();
        let event = coordinator.turn_all_off().await.unwrap();
        assert!(matches!(event, Some(Event::GatingTurnedOff { count: 2, .. })));
        assert!(store.snapshot().active_sites().is_empty());
    }

    #[tokio::test]
    async fn short_intent_is_rejected_without_grant() {
        let (coordinator, store, _) = coordinator();
        let outcome = coordinator.handle_intent(&request("ok", 15)).await.unwrap();
        assert_eq!(outcome.response, IntentResponse::too_short());
        let state = store.snapshot();
        assert!(state.whitelist().is_empty());
        let history = state.intent_log().recent(10);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].decision, Decision::No);
        assert!(!coordinator.has_pending_timers().await);
    }

    #[tokio::test]
    async fn minimum_length_intent_is_granted() {
        let (coordinator, store, _) = coordinator();
        let outcome = coordinator.handle_intent(&request("yes", 15)).await.unwrap();
        assert_eq!(outcome.response, IntentResponse::ok());
        assert!(store.snapshot().whitelist().is_active("example.com", t0()));
        assert_eq!(coordinator.next_deadline().await, Some(t0() + Duration::minutes(15)));
    }

    #[tokio::test]
    async fn configured_min_length_is_respected() {
        let (coordinator, _, _) = coordinator();
        coordinator.set_min_intent_length(10).await.unwrap();
        let outcome = coordinator.handle_intent(&request("not enough", 5)).await.unwrap();
        assert_eq!(outcome.response, IntentResponse::ok());
        let outcome = coordinator.handle_intent(&request("too short", 5)).await.unwrap();
        assert_eq!(outcome.response, IntentResponse::too_short());
    }

    #[tokio::test]
    async fn minutes_default_and_clamp() {
        let (coordinator, store, _) = coordinator();
        let mut req = request("because", 0);
        req.whitelist_minutes = None;
        coordinator.handle_intent(&req).await.unwrap();
        assert_eq!(
            store.snapshot().whitelist().expiry("example.com"),
            Some(t0() + Duration::minutes(15))
        );
        coordinator.handle_intent(&request("because", 99_999)).await.unwrap();
        assert_eq!(
            store.snapshot().whitelist().expiry("example.com"),
            Some(t0() + Duration::minutes(1440))
        );
    }

    #[tokio::test]
    async fn expiry_fires_once_and_regrant_supersedes() {
        let (coordinator, _, clock) = coordinator();
        coordinator.grant_whitelist("example.com", 1).await.unwrap();
        clock.advance(Duration::seconds(30));
        coordinator.grant_whitelist("example.com", 5).await.unwrap();

        clock.advance(Duration::seconds(31));
        assert!(coordinator.fire_due().await.unwrap().is_empty());
        assert_eq!(
            coordinator.evaluate(&["https://example.com"]).await.unwrap(),
            GatingDecision::NotApplicable
        );

        clock.advance(Duration::minutes(5));
        let events = coordinator.fire_due().await.unwrap();
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], Event::WhitelistExpired { key, .. } if key == "example.com"));
        assert!(coordinator.fire_due().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn stale_fire_after_external_regrant_is_ignored_and_rearmed() {
        let (coordinator, store, clock) = coordinator();
        coordinator.grant_whitelist("example.com", 1).await.unwrap();

        // another context extends the grant behind this coordinator's back
        let mut other = store.clone();
        let mut whitelist = store.snapshot().whitelist();
        let extended = whitelist.grant("example.com", 10, t0()).expires_at;
        other
            .set(&StoredState {
                whitelisted_sites: Some(whitelist),
                ..Default::default()
            })
            .unwrap();

        clock.advance(Duration::minutes(2));
        assert!(coordinator.fire_due().await.unwrap().is_empty());
        assert_eq!(coordinator.next_deadline().await, Some(extended));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_activations_are_not_lost() {
        let store = MemoryStore::new();
        let coordinator = std::sync::Arc::new(Coordinator::new(store.clone(), Config::default()));
        let handles: Vec<_> = (0..20)
            .map(|i| {
                let coordinator = coordinator.clone();
                tokio::spawn(async move { coordinator.add_active_site(&format!("site{i}.com")).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(store.snapshot().active_sites().len(), 20);
    }

    #[derive(Default)]
    struct Labels(Vec<String>);

    impl BadgeSink for Labels {
        fn set_badge_text(&mut self, text: &str) {
            self.0.push(text.to_string());
        }
        fn set_icon(&mut self, _icon: IconState) {}
    }

    #[tokio::test]
    async fn badge_rearms_after_clearing_when_a_grant_lands() {
        let (coordinator, _, _) = coordinator();
        let mut sink = Labels::default();
        coordinator.arm_badge().await;
        let urls = ["https://example.com/page"];

        let update = coordinator.badge_tick(&urls, &mut sink).await.unwrap();
        assert_eq!(update, Some(BadgeUpdate::Clear));
        assert!(!coordinator.badge_armed().await);
        assert_eq!(coordinator.badge_tick(&urls, &mut sink).await.unwrap(), None);

        coordinator.handle_intent(&request("reading", 15)).await.unwrap();
        assert!(coordinator.badge_armed().await);
        let update = coordinator.badge_tick(&urls, &mut sink).await.unwrap();
        assert_eq!(update, Some(BadgeUpdate::Show("15m".into())));
    }

    #[tokio::test]
    async fn badge_rearms_on_whitelisted_evaluation_and_startup() {
        let (coordinator, store, _) = coordinator();
        let mut sink = Labels::default();
        assert_eq!(coordinator.startup_icon(&mut sink).await.unwrap(), IconState::Off);
        assert!(!coordinator.badge_armed().await);

        coordinator.add_active_site("example.com").await.unwrap();
        assert_eq!(coordinator.startup_icon(&mut sink).await.unwrap(), IconState::On);
        assert!(coordinator.badge_armed().await);
        coordinator.badge_tick(&["https://example.com"], &mut sink).await.unwrap();
        assert!(!coordinator.badge_armed().await);

        // a grant written by another context shows up on the next evaluation
        let mut other = store.clone();
        let mut whitelist = store.snapshot().whitelist();
        whitelist.grant("example.com", 5, t0());
        other
            .set(&StoredState {
                whitelisted_sites: Some(whitelist),
                ..Default::default()
            })
            .unwrap();
        let decision = coordinator.evaluate(&["https://example.com"]).await.unwrap();
        assert!(matches!(decision, GatingDecision::WhitelistedActive { .. }));
        assert!(coordinator.badge_armed().await);
    }

    #[tokio::test]
    async fn history_respects_configured_cap() {
        let (coordinator, _, clock) = coordinator();
        for i in 0..25 {
            coordinator.handle_intent(&request(&format!("intent {i}"), 5)).await.unwrap();
            clock.advance(Duration::seconds(1));
        }
        let history = coordinator.intent_history(None).await.unwrap();
        assert_eq!(history.len(), 20);
        assert_eq!(history[0].intent_text, "intent 24");
        assert_eq!(coordinator.intent_history(Some(3)).await.unwrap().len(), 3);
    }
}
