//! Named, cancelable deadlines keyed by domain.
//!
//! Like the rest of the crate this runs no threads: whoever owns the arena
//! calls [`TimerArena::take_due`] from its own tick. Scheduling a key that is
//! already pending replaces it, so a superseded deadline can never fire.
//! Fired tokens still carry the deadline they were armed with so the owner
//! can re-validate against current state before acting.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerToken {
    pub key: String,
    pub deadline: DateTime<Utc>,
    generation: u64,
}

impl TimerToken {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Default)]
pub struct TimerArena {
    pending: HashMap<String, TimerToken>,
    next_generation: u64,
}

impl TimerArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm (or re-arm) the timer for `key`.
    pub fn schedule(&mut self, key: &str, deadline: DateTime<Utc>) -> TimerToken {
        self.next_generation += 1;
        let token = TimerToken {
            key: key.to_string(),
            deadline,
            generation: self.next_generation,
        };
        if let Some(previous) = self.pending.insert(key.to_string(), token.clone()) {
            tracing::debug!(key, superseded = %previous.deadline, %deadline, "timer re-armed");
        }
        token
    }

    pub fn cancel(&mut self, key: &str) -> Option<TimerToken> {
        self.pending.remove(key)
    }

    /// Whether `token` is still the armed timer for its key.
    pub fn is_current(&self, token: &TimerToken) -> bool {
        self.pending
            .get(&token.key)
            .is_some_and(|armed| armed.generation == token.generation)
    }

    /// Remove and return every timer whose deadline is at or before `now`,
    /// earliest first.
    pub fn take_due(&mut self, now: DateTime<Utc>) -> Vec<TimerToken> {
        let due_keys: Vec<String> = self
            .pending
            .iter()
            .filter(|(_, token)| token.deadline <= now)
            .map(|(key, _)| key.clone())
            .collect();

        let mut due: Vec<TimerToken> = due_keys
            .into_iter()
            .filter_map(|key| self.pending.remove(&key))
            .collect();
        due.sort_by_key(|token| token.deadline);
        due
    }

    pub fn next_deadline(&self) -> Option<DateTime<Utc>> {
        self.pending.values().map(|token| token.deadline).min()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
