//! Duplicate-delivery guard for Slack events.
//!
//! Slack redelivers events it did not see acknowledged in time. The guard
//! remembers which `event_id`s were handled so a redelivery does not post a
//! second message.
//!
//! An event moves through two states: *claimed* while a handler is working
//! on it, *handled* once its side effect succeeded. A [`ClaimGuard`] releases
//! the claim when the handler fails or is dropped part way, so the next
//! redelivery can retry. Entries are never evicted.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Result of trying to claim an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim {
    /// The caller owns the event and must `confirm` or `release` it.
    Acquired,
    /// Another delivery of the same event is being handled right now.
    InFlight,
    /// The event was already handled successfully.
    Handled,
}

/// Storage for handled event IDs.
///
/// `try_claim` is the only way to start handling an event and must be a
/// single atomic check-and-insert.
pub trait DedupStore: Send + Sync {
    /// Claim `event_id` unless it is handled or already claimed.
    fn try_claim(&self, event_id: &str) -> Claim;

    /// Mark a claimed event as handled.
    fn confirm(&self, event_id: &str);

    /// Drop a claim without marking the event handled.
    fn release(&self, event_id: &str);
}

/// An acquired claim on one event.
///
/// Dropping the guard without calling [`ClaimGuard::confirm`] releases the
/// claim.
pub struct ClaimGuard {
    store: Arc<dyn DedupStore>,
    event_id: String,
    confirmed: bool,
}

impl ClaimGuard {
    /// Claim `event_id` in `store`.
    ///
    /// # Errors
    ///
    /// Returns the [`Claim`] state when the event is already handled or
    /// claimed by another delivery.
    pub fn acquire(store: &Arc<dyn DedupStore>, event_id: &str) -> Result<Self, Claim> {
        match store.try_claim(event_id) {
            Claim::Acquired => Ok(Self {
                store: Arc::clone(store),
                event_id: event_id.to_string(),
                confirmed: false,
            }),
            other => Err(other),
        }
    }

    /// Mark the event as handled.
    pub fn confirm(mut self) {
        self.store.confirm(&self.event_id);
        self.confirmed = true;
    }
}

impl Drop for ClaimGuard {
    fn drop(&mut self) {
        if !self.confirmed {
            self.store.release(&self.event_id);
        }
    }
}

impl std::fmt::Debug for ClaimGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaimGuard")
            .field("event_id", &self.event_id)
            .field("confirmed", &self.confirmed)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryState {
    Claimed,
    Handled,
}

/// Process-local [`DedupStore`].
#[derive(Debug, Default)]
pub struct InMemoryDedupStore {
    entries: Mutex<HashMap<String, EntryState>>,
}

impl InMemoryDedupStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, EntryState>> {
        // A panic while holding the lock cannot leave the map half-updated
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl DedupStore for InMemoryDedupStore {
    fn try_claim(&self, event_id: &str) -> Claim {
        let mut entries = self.lock();
        match entries.get(event_id) {
            Some(EntryState::Handled) => Claim::Handled,
            Some(EntryState::Claimed) => Claim::InFlight,
            None => {
                entries.insert(event_id.to_string(), EntryState::Claimed);
                Claim::Acquired
            }
        }
    }

    fn confirm(&self, event_id: &str) {
        self.lock()
            .insert(event_id.to_string(), EntryState::Handled);
    }

    fn release(&self, event_id: &str) {
        let mut entries = self.lock();
        if entries.get(event_id) == Some(&EntryState::Claimed) {
            entries.remove(event_id);
        }
    }
}
