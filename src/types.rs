//! Core types for the like engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of a likeable feed item.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemId(pub String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        ItemId(id.into())
    }
}

impl fmt::Debug for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ItemId({})", self.0)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of the viewer whose likes the engine reconciles.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ViewerId(pub String);

impl ViewerId {
    pub fn new(id: impl Into<String>) -> Self {
        ViewerId(id.into())
    }
}

impl fmt::Debug for ViewerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ViewerId({})", self.0)
    }
}

impl fmt::Display for ViewerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What the renderer shows for one item right now.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeProjection {
    pub liked: bool,
    pub count: u64,
}

/// The new truth returned by the store after a confirmed toggle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleReceipt {
    /// Whether the viewer likes the item after this flip.
    pub liked: bool,
    /// Aggregate like count after this flip.
    pub count: u64,
}

/// Point-in-time view of one item's full reconciliation state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeStateSnapshot {
    /// Last value confirmed by the store, `None` before the first read.
    pub server_liked: Option<bool>,
    /// Last aggregate count confirmed by the store.
    pub server_count: u64,
    /// What the renderer shows; may diverge while toggles are in flight.
    pub displayed_liked: bool,
    pub displayed_count: u64,
    /// Toggles sent but not yet confirmed or failed.
    pub pending_toggles: u32,
    /// The store reported the item gone.
    pub stale: bool,
}

/// Engine statistics.
#[derive(Clone, Debug, Default)]
pub struct EngineStats {
    pub tracked_items: usize,
    pub pending_toggles: u64,
    pub subscriptions: usize,
}
