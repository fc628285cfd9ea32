use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use tracing::trace;

use super::SessionStore;

/// Session storage kept in process memory.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    items: Mutex<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set_item(&self, key: &str, value: &str) {
        trace!("Session storage set '{}'", key);
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
    }

    fn remove_item(&self, key: &str) {
        trace!("Session storage remove '{}'", key);
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }
}
