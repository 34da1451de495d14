//! In-memory state store for tests and simulations.

use std::sync::{Arc, Mutex};

use super::{StateStore, StoredState};
use crate::error::Result;

/// Clones share the same state, so a test can keep a handle for inspection.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<StoredState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: StoredState) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn snapshot(&self) -> StoredState {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl StateStore for MemoryStore {
    fn get(&self) -> Result<StoredState> {
        Ok(self.snapshot())
    }

    fn set(&mut self, partial: &StoredState) -> Result<()> {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .merge(partial);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let store = MemoryStore::new();
        let mut writer = store.clone();
        writer
            .set(&StoredState {
                custom_message: Some("focus".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(store.get().unwrap().custom_message(), "focus");
    }
}
