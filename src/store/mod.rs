//! Authoritative store boundary.
//!
//! The engine never owns like truth; it mediates between user intent
//! and whatever implements [`LikeStore`]. Calls may fail or be delayed
//! arbitrarily and completions may arrive out of send order; the
//! engine tolerates both.

mod memory;

pub use memory::MemoryStore;

use crate::error::Result;
use crate::types::{ItemId, ToggleReceipt, ViewerId};

/// The authoritative source of truth for likes.
pub trait LikeStore: Send + Sync {
    /// Flip the per-(viewer, item) like relation and atomically adjust
    /// the item's aggregate count by one.
    ///
    /// Every call is one logical flip, safe to issue repeatedly: two
    /// calls are two flips, not a deduplicated retry. The receipt
    /// carries the state after this flip.
    fn toggle_like(&self, item: &ItemId, viewer: &ViewerId) -> Result<ToggleReceipt>;

    /// Point-in-time read of whether the viewer likes the item.
    ///
    /// Callers treat erroring or unauthenticated reads as not-liked.
    fn like_state(&self, item: &ItemId, viewer: &ViewerId) -> Result<bool>;
}
