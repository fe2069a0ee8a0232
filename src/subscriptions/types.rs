//! Subscription types for live feed updates.

use crate::types::ItemId;
use serde::{Deserialize, Serialize};

/// Configuration for a subscription.
#[derive(Clone, Debug)]
pub struct SubscriptionConfig {
    /// Max buffered events before dropping the subscriber.
    /// Default: 256
    pub buffer_size: usize,

    /// Filter criteria.
    pub filter: FeedFilter,
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            buffer_size: 256,
            filter: FeedFilter::default(),
        }
    }
}

/// Filter criteria for subscriptions.
#[derive(Clone, Debug, Default)]
pub struct FeedFilter {
    /// Restrict to specific items (None = all tracked items).
    pub items: Option<Vec<ItemId>>,

    /// Include projection updates.
    pub include_projections: bool,

    /// Include notices: rollbacks, stale items, retired state.
    pub include_notices: bool,
}

impl FeedFilter {
    /// Projection updates for every tracked item.
    pub fn projections() -> Self {
        Self {
            include_projections: true,
            ..Default::default()
        }
    }

    /// Projection updates for specific items.
    pub fn items(items: Vec<ItemId>) -> Self {
        Self {
            items: Some(items),
            include_projections: true,
            ..Default::default()
        }
    }

    /// Everything.
    pub fn all() -> Self {
        Self {
            items: None,
            include_projections: true,
            include_notices: true,
        }
    }

    pub(crate) fn matches_item(&self, item: &ItemId) -> bool {
        match &self.items {
            Some(items) => items.contains(item),
            None => true,
        }
    }
}

/// Events delivered to the feed renderer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedEvent {
    /// Displayed state changed for an item.
    Projection {
        item: ItemId,
        liked: bool,
        count: u64,
    },

    /// A click was undone after its toggle failed (recoverable).
    ToggleRolledBack { item: ItemId },

    /// The item no longer exists server-side; the renderer may remove it.
    ItemStale { item: ItemId },

    /// The engine discarded the item's state (explicit retire or
    /// eviction).
    ItemRetired { item: ItemId },

    /// Subscription terminated.
    Dropped { reason: DropReason },
}

/// Why a subscription was dropped.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// Send buffer overflowed (slow consumer).
    BufferOverflow,
    /// Explicitly unsubscribed.
    Unsubscribed,
    /// Engine is shutting down.
    ShuttingDown,
}

/// Unique identifier for a subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Handle to manage a subscription.
pub struct SubscriptionHandle {
    pub id: SubscriptionId,
    /// Channel to receive events.
    pub receiver: crossbeam_channel::Receiver<FeedEvent>,
}

impl SubscriptionHandle {
    /// Receive the next event (blocking).
    pub fn recv(&self) -> Result<FeedEvent, crossbeam_channel::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive an event (non-blocking).
    pub fn try_recv(&self) -> Result<FeedEvent, crossbeam_channel::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Receive with timeout.
    pub fn recv_timeout(
        &self,
        timeout: std::time::Duration,
    ) -> Result<FeedEvent, crossbeam_channel::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }
}
