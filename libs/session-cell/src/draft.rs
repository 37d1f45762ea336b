// libs/session-cell/src/draft.rs
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::keys;
use crate::store::SessionStore;

/// Persist the whole draft under the `bookingDraft` key. The draft type lives
/// upstream; this only owns the key and the JSON encoding.
pub fn save_draft<T: Serialize>(store: &dyn SessionStore, draft: &T) {
    match serde_json::to_string(draft) {
        Ok(blob) => store.set(keys::BOOKING_DRAFT, &blob),
        Err(e) => warn!("Failed to persist booking draft: {}", e),
    }
}

/// Load the persisted draft, if any. An unreadable blob is discarded with a
/// warning so a corrupt entry never wedges the wizard.
pub fn load_draft<T: DeserializeOwned>(store: &dyn SessionStore) -> Option<T> {
    let blob = store.get(keys::BOOKING_DRAFT)?;
    match serde_json::from_str(&blob) {
        Ok(draft) => Some(draft),
        Err(e) => {
            warn!("Discarding unreadable persisted draft: {}", e);
            None
        }
    }
}

/// Drop the draft blob and every flat key written alongside it.
pub fn clear_draft(store: &dyn SessionStore) {
    for key in keys::ALL {
        store.remove(key);
    }
}
