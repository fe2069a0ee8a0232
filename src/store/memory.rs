//! In-memory reference implementation of the like store.

use crate::error::{EngineError, Result};
use crate::types::{ItemId, ToggleReceipt, ViewerId};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};

use super::LikeStore;

#[derive(Default)]
struct Inner {
    /// Aggregate like count per item.
    counts: HashMap<ItemId, u64>,
    /// The like relation, keyed by (viewer, item).
    likes: HashSet<(ViewerId, ItemId)>,
    /// Whether reads see an authenticated session.
    authenticated: bool,
}

/// In-process store with the same observable semantics as the hosted
/// backend: a likes relation plus a denormalized aggregate count per
/// item, decrements floored at zero, and unauthenticated reads
/// rejected.
///
/// Used by integration tests, examples, and benchmarks; also a handy
/// stand-in for offline development.
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                authenticated: true,
                ..Default::default()
            }),
        }
    }

    /// Create an item with a starting aggregate count.
    pub fn seed_item(&self, item: ItemId, count: u64) {
        self.inner.write().counts.insert(item, count);
    }

    /// Delete an item, simulating removal between read and toggle.
    pub fn remove_item(&self, item: &ItemId) {
        let mut inner = self.inner.write();
        inner.counts.remove(item);
        inner.likes.retain(|(_, liked_item)| liked_item != item);
    }

    /// Control whether calls see an authenticated session.
    pub fn set_authenticated(&self, authenticated: bool) {
        self.inner.write().authenticated = authenticated;
    }

    /// Current aggregate count for an item.
    pub fn count(&self, item: &ItemId) -> Option<u64> {
        self.inner.read().counts.get(item).copied()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LikeStore for MemoryStore {
    fn toggle_like(&self, item: &ItemId, viewer: &ViewerId) -> Result<ToggleReceipt> {
        let mut guard = self.inner.write();
        let inner = &mut *guard;

        if !inner.authenticated {
            return Err(EngineError::Unauthenticated);
        }

        let count = inner
            .counts
            .get_mut(item)
            .ok_or_else(|| EngineError::ItemNotFound(item.clone()))?;

        let key = (viewer.clone(), item.clone());
        let liked = if inner.likes.remove(&key) {
            *count = count.saturating_sub(1);
            false
        } else {
            inner.likes.insert(key);
            *count += 1;
            true
        };

        Ok(ToggleReceipt {
            liked,
            count: *count,
        })
    }

    fn like_state(&self, item: &ItemId, viewer: &ViewerId) -> Result<bool> {
        let inner = self.inner.read();
        if !inner.authenticated {
            return Err(EngineError::Unauthenticated);
        }
        Ok(inner.likes.contains(&(viewer.clone(), item.clone())))
    }
}
