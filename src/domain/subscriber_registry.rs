//! Per-user fan-out of live track updates.
//!
//! [`SubscriberRegistry`] maps each user ID to the set of open live
//! connections watching that user. Every connection owns a bounded
//! [`tokio::sync::mpsc`] queue; publishing uses `try_send`, so a viewer
//! whose queue is full simply misses that update. Ingestion is never
//! blocked by a slow viewer, and viewers never affect each other.
//!
//! # Concurrency
//!
//! A single reader/writer lock guards the map. [`SubscriberRegistry::publish`]
//! takes the read side, so concurrent publishes proceed in parallel.
//! Subscribing and unsubscribing take the write side. The lock is never
//! held across an `.await`.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use super::{LiveUpdate, SubscriberId};

/// Outcome of a single [`SubscriberRegistry::publish`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delivery {
    /// Subscribers whose queue accepted the update.
    pub delivered: usize,
    /// Subscribers that missed the update because their queue was full or
    /// their consumer had already gone away.
    pub dropped: usize,
}

#[derive(Debug)]
struct Slot {
    id: SubscriberId,
    sender: mpsc::Sender<Arc<LiveUpdate>>,
}

/// Registry of live listeners keyed by user ID.
#[derive(Debug)]
pub struct SubscriberRegistry {
    subscribers: RwLock<HashMap<String, Vec<Slot>>>,
    capacity: usize,
}

impl SubscriberRegistry {
    /// Creates an empty registry whose subscribers buffer up to `capacity`
    /// undelivered updates each. A capacity of zero is raised to one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Registers a new listener for `user_id`.
    ///
    /// The returned [`Subscription`] deregisters itself when dropped.
    #[must_use]
    pub fn subscribe(self: &Arc<Self>, user_id: &str) -> Subscription {
        let (sender, receiver) = mpsc::channel(self.capacity);
        let id = SubscriberId::new();
        self.subscribers
            .write()
            .entry(user_id.to_string())
            .or_default()
            .push(Slot { id, sender });
        tracing::debug!(user_id, subscriber = %id, "subscriber registered");

        Subscription {
            registry: Arc::clone(self),
            user_id: user_id.to_string(),
            id,
            receiver,
        }
    }

    /// Removes the listener `id` from `user_id`, closing its queue.
    ///
    /// The consumer still receives anything already buffered and then sees
    /// end-of-stream. Unknown or already removed handles are ignored.
    pub fn unsubscribe(&self, user_id: &str, id: SubscriberId) {
        let mut map = self.subscribers.write();
        let Some(slots) = map.get_mut(user_id) else {
            return;
        };
        let before = slots.len();
        slots.retain(|slot| slot.id != id);
        let removed = before != slots.len();
        if slots.is_empty() {
            map.remove(user_id);
        }
        if removed {
            tracing::debug!(user_id, subscriber = %id, "subscriber removed");
        }
    }

    /// Offers `update` to every listener of `update.user_id` without
    /// waiting.
    ///
    /// With no listeners this is a no-op returning an empty [`Delivery`].
    pub fn publish(&self, update: LiveUpdate) -> Delivery {
        let map = self.subscribers.read();
        let Some(slots) = map.get(&update.user_id) else {
            return Delivery::default();
        };

        let update = Arc::new(update);
        let mut delivery = Delivery::default();
        for slot in slots {
            match slot.sender.try_send(Arc::clone(&update)) {
                Ok(()) => delivery.delivered += 1,
                Err(TrySendError::Full(_)) => {
                    delivery.dropped += 1;
                    tracing::debug!(
                        user_id = %update.user_id,
                        subscriber = %slot.id,
                        "subscriber queue full, dropping update"
                    );
                }
                Err(TrySendError::Closed(_)) => delivery.dropped += 1,
            }
        }
        delivery
    }

    /// Returns the number of live listeners for `user_id`.
    #[must_use]
    pub fn subscriber_count(&self, user_id: &str) -> usize {
        self.subscribers.read().get(user_id).map_or(0, Vec::len)
    }

    /// Releases every listener. Each consumer drains its queue and then
    /// observes end-of-stream.
    pub fn shutdown(&self) {
        let mut map = self.subscribers.write();
        let released: usize = map.values().map(Vec::len).sum();
        map.clear();
        tracing::info!(released, "subscriber registry shut down");
    }
}

/// A registered listener's receiving end.
///
/// Owned by the task serving one live connection. Dropping it removes the
/// listener from its registry, whatever path the task exits by.
#[derive(Debug)]
pub struct Subscription {
    registry: Arc<SubscriberRegistry>,
    user_id: String,
    id: SubscriberId,
    receiver: mpsc::Receiver<Arc<LiveUpdate>>,
}

impl Subscription {
    /// Waits for the next update. Returns `None` once the listener has been
    /// unsubscribed or the registry shut down and the queue is drained.
    pub async fn recv(&mut self) -> Option<Arc<LiveUpdate>> {
        self.receiver.recv().await
    }

    /// Returns this listener's handle.
    #[must_use]
    pub const fn id(&self) -> SubscriberId {
        self.id
    }

    /// Returns the user ID this listener watches.
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.registry.unsubscribe(&self.user_id, self.id);
    }
}
