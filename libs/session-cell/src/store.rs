// libs/session-cell/src/store.rs
use std::collections::HashMap;
use std::sync::RwLock;

use tracing::debug;

/// Key/value store surviving page navigation. Browser session storage is the
/// canonical backing; tests and native hosts use [`MemorySessionStore`].
///
/// Only one wizard stage is live at a time, so writers never race; the store
/// still has to be `Send + Sync` because payment verification tasks run on
/// the runtime alongside the wizard.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
    fn clear(&self);
}

#[derive(Default)]
pub struct MemorySessionStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .read()
            .ok()
            .and_then(|map| map.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) {
        if let Ok(mut map) = self.entries.write() {
            map.insert(key.to_string(), value.to_string());
        }
    }

    fn remove(&self, key: &str) {
        if let Ok(mut map) = self.entries.write() {
            map.remove(key);
        }
    }

    fn clear(&self) {
        debug!("Clearing session store");
        if let Ok(mut map) = self.entries.write() {
            map.clear();
        }
    }
}
