//! # IntentGate Core Library
//!
//! Core logic for an intent gate: before a page on a user-activated site is
//! shown, the user types why they are visiting and picks how long to stay.
//! A long-enough reason whitelists the site's domain for that many minutes.
//! The CLI binary drives the same library.
//!
//! ## Architecture
//!
//! - **Domain/Matcher**: URL normalization and the active-site rule (a parent
//!   domain never activates its subdomains)
//! - **Whitelist**: time-boxed grants, persisted as wall-clock expiries
//! - **Coordinator**: the single writer of persisted state; serializes every
//!   read-modify-write and owns deferred expiry timers
//! - **Page gate / Overlay**: the prompt state machine, driven by focus
//!   events and a caller-owned `poll(now)`
//! - **Storage**: SQLite key-value state and TOML configuration
//!
//! Nothing here spawns threads. Time always comes in as `now` or through a
//! [`Clock`].
//!
//! ## Key Components
//!
//! - [`Coordinator`]: background state owner
//! - [`PageGate`]: per-page overlay and re-block timers
//! - [`SqliteStore`]: persisted state
//! - [`Config`]: application configuration management

pub mod badge;
pub mod clock;
pub mod coordinator;
pub mod domain;
pub mod error;
pub mod events;
pub mod intent_log;
pub mod matcher;
pub mod messages;
pub mod overlay;
pub mod page;
pub mod sites;
pub mod storage;
pub mod timers;
pub mod whitelist;

pub use badge::{BadgeProjector, BadgeSink, BadgeUpdate};
pub use clock::{Clock, ManualClock, SystemClock};
pub use coordinator::{Coordinator, IntentOutcome};
pub use domain::PageIdentity;
pub use error::{ConfigError, CoreError, GateError, StorageError, ValidationError};
pub use events::Event;
pub use intent_log::{Decision, IntentLog, IntentLogRecord};
pub use matcher::{GateRules, GatingDecision};
pub use messages::{IntentRequest, IntentResponse, IntentStatus};
pub use overlay::{DurationChoice, OverlayController, OverlaySurface, OverlayState, Prompt, StatusTone};
pub use page::{BackgroundLink, PageGate};
pub use sites::{ActiveSiteSet, IconState};
pub use storage::{Config, MemoryStore, SqliteStore, StateStore, StoredState};
pub use whitelist::{Grant, Whitelist};
