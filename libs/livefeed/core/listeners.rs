use crate::core::channel::FeedChannel;
use crate::core::event::FeedEvent;
use parking_lot::RwLock;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::warn;

/// Callback invoked for every event delivered on a subscribed channel.
pub type Listener = Arc<dyn Fn(&FeedEvent) + Send + Sync>;

/// Per-channel registry of subscriber callbacks.
///
/// Listeners are keyed by a monotonically assigned id so a subscription can
/// later remove exactly the callback it registered (the Rust stand-in for
/// removal by reference equality). Dispatch is a synchronous fan-out in
/// insertion order; a panicking listener is caught and logged so it cannot
/// suppress delivery to its siblings.
pub struct ListenerDirectory {
    next_id: AtomicU64,
    sets: [RwLock<Vec<(u64, Listener)>>; FeedChannel::ALL.len()],
}

impl ListenerDirectory {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            sets: std::array::from_fn(|_| RwLock::new(Vec::new())),
        }
    }

    fn set(&self, channel: FeedChannel) -> &RwLock<Vec<(u64, Listener)>> {
        &self.sets[channel.index()]
    }

    /// Register a listener; returns the id to remove it with.
    pub fn add(&self, channel: FeedChannel, listener: Listener) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.set(channel).write().push((id, listener));
        id
    }

    /// Remove the listener registered under `id`. Returns `false` when it was
    /// already removed.
    pub fn remove(&self, channel: FeedChannel, id: u64) -> bool {
        let mut listeners = self.set(channel).write();
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() != before
    }

    pub fn is_empty(&self, channel: FeedChannel) -> bool {
        self.set(channel).read().is_empty()
    }

    pub fn count(&self, channel: FeedChannel) -> usize {
        self.set(channel).read().len()
    }

    /// Deliver an event to every listener currently registered for the
    /// channel, in insertion order.
    ///
    /// The lock is released before any callback runs, so a listener may
    /// subscribe or unsubscribe from within dispatch without deadlocking.
    pub fn notify(&self, channel: FeedChannel, event: &FeedEvent) {
        let snapshot: Vec<Listener> = self
            .set(channel)
            .read()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in snapshot {
            if catch_unwind(AssertUnwindSafe(|| listener(event))).is_err() {
                warn!(channel = %channel, "listener panicked during dispatch, continuing with remaining listeners");
            }
        }
    }
}

impl Default for ListenerDirectory {
    fn default() -> Self {
        Self::new()
    }
}
