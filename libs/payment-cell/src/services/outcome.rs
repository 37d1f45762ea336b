// libs/payment-cell/src/services/outcome.rs
use std::sync::Mutex;

use tokio::sync::Notify;

/// Single-assignment cell shared by the verification paths racing on one
/// payment session. The first settle wins; every later settle is discarded
/// and handed the already-settled value instead. Waiters are woken exactly
/// when the cell settles.
pub struct OutcomeCell<T> {
    slot: Mutex<Option<T>>,
    notify: Notify,
}

impl<T: Clone> OutcomeCell<T> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            notify: Notify::new(),
        }
    }

    /// Attempt to settle the cell. Returns the value the cell actually holds
    /// afterwards and whether this call was the one that placed it.
    pub fn settle(&self, value: T) -> (T, bool) {
        let mut slot = self.slot.lock().expect("outcome cell lock poisoned");
        match slot.as_ref() {
            Some(existing) => (existing.clone(), false),
            None => {
                *slot = Some(value.clone());
                drop(slot);
                self.notify.notify_waiters();
                (value, true)
            }
        }
    }

    pub fn get(&self) -> Option<T> {
        self.slot
            .lock()
            .expect("outcome cell lock poisoned")
            .clone()
    }

    pub fn is_settled(&self) -> bool {
        self.slot
            .lock()
            .expect("outcome cell lock poisoned")
            .is_some()
    }

    /// Wait until the cell settles, then return the winning value.
    pub async fn wait(&self) -> T {
        loop {
            let notified = self.notify.notified();
            if let Some(value) = self.get() {
                return value;
            }
            notified.await;
        }
    }

    /// Completes on the next settle signal. Callers re-check [`get`] after
    /// waking; used inside `select!` to abort sleeps early.
    pub async fn settled(&self) {
        let notified = self.notify.notified();
        if self.is_settled() {
            return;
        }
        notified.await;
    }
}

impl<T: Clone> Default for OutcomeCell<T> {
    fn default() -> Self {
        Self::new()
    }
}
