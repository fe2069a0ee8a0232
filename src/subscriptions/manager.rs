//! Subscription manager for broadcasting feed events.

use crate::types::{ItemId, LikeProjection};
use crossbeam_channel::{bounded, Sender};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use super::types::{
    DropReason, FeedEvent, SubscriptionConfig, SubscriptionHandle, SubscriptionId,
};

/// Internal subscription state.
struct Subscription {
    config: SubscriptionConfig,
    sender: Sender<FeedEvent>,
}

impl Subscription {
    /// Try to send an event. Returns false if the buffer is full or the
    /// receiver is gone (subscriber will be dropped).
    fn try_send(&self, event: FeedEvent) -> bool {
        self.sender.try_send(event).is_ok()
    }

    fn wants_projection(&self, item: &ItemId) -> bool {
        self.config.filter.include_projections && self.config.filter.matches_item(item)
    }

    fn wants_notice(&self, item: &ItemId) -> bool {
        self.config.filter.include_notices && self.config.filter.matches_item(item)
    }
}

/// Manages subscriptions and broadcasts events.
pub struct SubscriptionManager {
    /// Active subscriptions by ID.
    subscriptions: RwLock<HashMap<SubscriptionId, Subscription>>,
    /// Counter for generating subscription IDs.
    next_id: AtomicU64,
}

impl SubscriptionManager {
    pub fn new() -> Self {
        Self {
            subscriptions: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Create a new subscription and return a handle for receiving
    /// events.
    pub fn subscribe(&self, config: SubscriptionConfig) -> SubscriptionHandle {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let (sender, receiver) = bounded(config.buffer_size);

        self.subscriptions
            .write()
            .insert(id, Subscription { config, sender });

        SubscriptionHandle { id, receiver }
    }

    /// Unsubscribe and clean up.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        let mut subs = self.subscriptions.write();
        if let Some(sub) = subs.remove(&id) {
            // Send dropped event (best effort)
            let _ = sub.sender.try_send(FeedEvent::Dropped {
                reason: DropReason::Unsubscribed,
            });
        }
    }

    /// Drop every subscription, notifying each (best effort).
    pub fn shutdown(&self) {
        let mut subs = self.subscriptions.write();
        for (_, sub) in subs.drain() {
            let _ = sub.sender.try_send(FeedEvent::Dropped {
                reason: DropReason::ShuttingDown,
            });
        }
    }

    /// Get subscription count.
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.read().len()
    }

    // --- Broadcasting ---

    /// Broadcast a displayed-state change to matching subscriptions.
    pub fn broadcast_projection(&self, item: &ItemId, projection: LikeProjection) {
        let event = FeedEvent::Projection {
            item: item.clone(),
            liked: projection.liked,
            count: projection.count,
        };
        self.broadcast(|sub| sub.wants_projection(item), event);
    }

    /// Broadcast that a click was undone.
    pub fn broadcast_rollback(&self, item: &ItemId) {
        let event = FeedEvent::ToggleRolledBack { item: item.clone() };
        self.broadcast(|sub| sub.wants_notice(item), event);
    }

    /// Broadcast that an item vanished server-side.
    pub fn broadcast_stale(&self, item: &ItemId) {
        let event = FeedEvent::ItemStale { item: item.clone() };
        self.broadcast(|sub| sub.wants_notice(item), event);
    }

    /// Broadcast that an item's state was discarded.
    pub fn broadcast_retired(&self, item: &ItemId) {
        let event = FeedEvent::ItemRetired { item: item.clone() };
        self.broadcast(|sub| sub.wants_notice(item), event);
    }

    /// Send the current projection of one item directly to a single
    /// subscription (initial catch-up on subscribe). Returns false if
    /// the subscription is gone.
    pub fn send_projection_to(
        &self,
        id: SubscriptionId,
        item: &ItemId,
        projection: LikeProjection,
    ) -> bool {
        let subs = self.subscriptions.read();
        match subs.get(&id) {
            Some(sub) if sub.wants_projection(item) => sub.try_send(FeedEvent::Projection {
                item: item.clone(),
                liked: projection.liked,
                count: projection.count,
            }),
            Some(_) => true,
            None => false,
        }
    }

    /// Internal broadcast helper. Drops subscribers that fail to receive.
    fn broadcast<F>(&self, filter: F, event: FeedEvent)
    where
        F: Fn(&Subscription) -> bool,
    {
        let mut to_remove = Vec::new();

        {
            let subs = self.subscriptions.read();
            for (id, sub) in subs.iter() {
                if filter(sub) && !sub.try_send(event.clone()) {
                    to_remove.push(*id);
                }
            }
        }

        if !to_remove.is_empty() {
            let mut subs = self.subscriptions.write();
            for id in to_remove {
                if let Some(sub) = subs.remove(&id) {
                    // Try to notify about the drop (might fail, that's ok)
                    let _ = sub.sender.try_send(FeedEvent::Dropped {
                        reason: DropReason::BufferOverflow,
                    });
                }
            }
        }
    }
}

impl Default for SubscriptionManager {
    fn default() -> Self {
        Self::new()
    }
}
