//! The like engine: per-item reconciliation, dispatch, and fan-out.

use crate::dispatch::{Dispatcher, Job};
use crate::error::{EngineError, Result};
use crate::state::{LikeState, SettleEffect, SettleOutcome};
use crate::store::LikeStore;
use crate::subscriptions::{
    SubscriptionConfig, SubscriptionHandle, SubscriptionId, SubscriptionManager,
};
use crate::types::{EngineStats, ItemId, LikeProjection, LikeStateSnapshot, ViewerId};
use lru::LruCache;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Engine configuration.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Background workers performing store calls.
    pub workers: usize,

    /// Max tracked items before least-recently-used state is evicted.
    pub max_tracked_items: usize,

    /// Settle a toggle as failed if no completion arrives in time.
    /// `None` (the default, matching the backend's behavior) waits
    /// indefinitely.
    pub toggle_timeout: Option<std::time::Duration>,

    /// Fetch the viewer's like state in the background when an item is
    /// first tracked.
    pub prefetch_like_state: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            max_tracked_items: 1024,
            toggle_timeout: None,
            prefetch_like_state: true,
        }
    }
}

/// Per-item slot: the state machine plus timeout bookkeeping.
///
/// The mutex around each entry is the per-item serialization point: no
/// two mutations of the same item's state interleave, while distinct
/// items proceed independently.
struct ItemEntry {
    state: LikeState,
    /// Oldest-first deadlines for in-flight toggles (timeout enabled
    /// only). One deadline per pending toggle.
    deadlines: VecDeque<Instant>,
}

pub(crate) struct EngineInner {
    store: Arc<dyn LikeStore>,
    viewer: ViewerId,
    config: EngineConfig,
    items: Mutex<LruCache<ItemId, Arc<Mutex<ItemEntry>>>>,
    subscriptions: SubscriptionManager,
}

/// Owns the observable `{liked, count}` state for feed items.
///
/// Clicks are applied optimistically and visible before any network
/// call resolves; completions and concurrent reads reconcile against
/// the per-item pending counter, tolerating any arrival order.
pub struct LikeEngine {
    inner: Arc<EngineInner>,
    dispatcher: Dispatcher,
}

impl LikeEngine {
    pub fn new(store: Arc<dyn LikeStore>, viewer: ViewerId) -> Self {
        Self::with_config(store, viewer, EngineConfig::default())
    }

    pub fn with_config(store: Arc<dyn LikeStore>, viewer: ViewerId, config: EngineConfig) -> Self {
        let capacity = NonZeroUsize::new(config.max_tracked_items.max(1)).unwrap();
        let inner = Arc::new(EngineInner {
            store,
            viewer,
            config: config.clone(),
            items: Mutex::new(LruCache::new(capacity)),
            subscriptions: SubscriptionManager::new(),
        });
        let dispatcher = Dispatcher::spawn(Arc::clone(&inner), config.workers, config.toggle_timeout);
        Self { inner, dispatcher }
    }

    /// Start tracking an item as it enters the rendered set.
    ///
    /// `seed_count` is the aggregate count the feed query delivered;
    /// the viewer's own like relation is fetched in the background (if
    /// configured) and renders as not-liked until it arrives. Tracking
    /// an already-tracked item just re-emits its current projection.
    pub fn track(&self, item: ItemId, seed_count: u64) {
        let mut fresh = false;
        let projection;
        {
            let mut items = self.inner.items.lock();
            if let Some(entry) = items.get(&item) {
                projection = entry.lock().state.projection();
            } else {
                let state = LikeState::new(seed_count);
                projection = state.projection();
                let entry = Arc::new(Mutex::new(ItemEntry {
                    state,
                    deadlines: VecDeque::new(),
                }));
                if let Some((evicted, _)) = items.push(item.clone(), entry) {
                    debug!(item = %evicted, "evicting least-recently-used like state");
                    self.inner.subscriptions.broadcast_retired(&evicted);
                }
                fresh = true;
            }
        }

        self.inner.subscriptions.broadcast_projection(&item, projection);

        if fresh && self.inner.config.prefetch_like_state {
            self.dispatcher.submit(Job::Read(item));
        }
    }

    /// Apply one user click.
    ///
    /// The optimistic flip is applied and emitted synchronously, then
    /// exactly one toggle call is dispatched. Rapid clicks each
    /// dispatch their own call; nothing is deduplicated.
    pub fn on_user_toggle(&self, item: &ItemId) -> Result<()> {
        let entry = self
            .inner
            .entry(item)
            .ok_or_else(|| EngineError::ItemNotTracked(item.clone()))?;

        let projection = {
            let mut entry = entry.lock();
            if let Some(timeout) = self.inner.config.toggle_timeout {
                entry.deadlines.push_back(Instant::now() + timeout);
            }
            entry.state.user_toggle()
        };
        self.inner.subscriptions.broadcast_projection(item, projection);

        self.dispatcher.submit(Job::Toggle(item.clone()));
        Ok(())
    }

    /// Deliver an authoritative snapshot from a feed refresh.
    ///
    /// Server fields always update; displayed fields only when no
    /// toggle is in flight.
    pub fn on_server_state(&self, item: &ItemId, liked: bool, count: u64) -> Result<()> {
        let entry = self
            .inner
            .entry(item)
            .ok_or_else(|| EngineError::ItemNotTracked(item.clone()))?;

        let changed = entry.lock().state.server_state(liked, count);
        if let Some(projection) = changed {
            self.inner.subscriptions.broadcast_projection(item, projection);
        }
        Ok(())
    }

    /// Current `{liked, count}` projection for an item.
    pub fn projection(&self, item: &ItemId) -> Option<LikeProjection> {
        self.inner.entry(item).map(|e| e.lock().state.projection())
    }

    /// Full reconciliation snapshot for an item.
    pub fn like_state(&self, item: &ItemId) -> Option<LikeStateSnapshot> {
        self.inner.entry(item).map(|e| e.lock().state.snapshot())
    }

    /// Discard an item's state as it leaves the rendered set.
    ///
    /// Completions still in flight for the item are ignored on arrival.
    pub fn retire(&self, item: &ItemId) {
        let removed = self.inner.items.lock().pop(item);
        if removed.is_some() {
            debug!(item = %item, "retired like state");
            self.inner.subscriptions.broadcast_retired(item);
        }
    }

    /// Attach a renderer. Current projections of matching tracked items
    /// are delivered first, then live events.
    pub fn subscribe(&self, config: SubscriptionConfig) -> SubscriptionHandle {
        let handle = self.inner.subscriptions.subscribe(config);

        let current: Vec<(ItemId, LikeProjection)> = {
            let items = self.inner.items.lock();
            items
                .iter()
                .map(|(id, entry)| (id.clone(), entry.lock().state.projection()))
                .collect()
        };
        for (id, projection) in current {
            if !self.inner.subscriptions.send_projection_to(handle.id, &id, projection) {
                break;
            }
        }

        handle
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.inner.subscriptions.unsubscribe(id);
    }

    pub fn stats(&self) -> EngineStats {
        let items = self.inner.items.lock();
        let pending = items
            .iter()
            .map(|(_, entry)| u64::from(entry.lock().state.pending_toggles()))
            .sum();
        EngineStats {
            tracked_items: items.len(),
            pending_toggles: pending,
            subscriptions: self.inner.subscriptions.subscription_count(),
        }
    }
}

impl Drop for LikeEngine {
    fn drop(&mut self) {
        self.dispatcher.shutdown();
        self.inner.subscriptions.shutdown();
    }
}

impl EngineInner {
    /// Look up an item's entry, promoting its recency.
    fn entry(&self, item: &ItemId) -> Option<Arc<Mutex<ItemEntry>>> {
        self.items.lock().get(item).cloned()
    }

    pub(crate) fn perform_toggle(&self, item: &ItemId) {
        let outcome = match self.store.toggle_like(item, &self.viewer) {
            Ok(receipt) => SettleOutcome::Confirmed(receipt),
            Err(EngineError::ItemNotFound(_)) => SettleOutcome::Gone,
            Err(err) => {
                debug!(item = %item, error = %err, "toggle failed");
                SettleOutcome::Failed
            }
        };
        self.settle(item, outcome);
    }

    pub(crate) fn perform_read(&self, item: &ItemId) {
        let result = self.store.like_state(item, &self.viewer);
        let Some(entry) = self.entry(item) else {
            return;
        };

        let changed = {
            let mut entry = entry.lock();
            match result {
                Ok(liked) => entry.state.server_read(liked),
                Err(err) => {
                    debug!(item = %item, error = %err, "like read failed, defaulting to not liked");
                    entry.state.read_failed();
                    None
                }
            }
        };
        if let Some(projection) = changed {
            self.subscriptions.broadcast_projection(item, projection);
        }
    }

    /// Apply a toggle completion to the item's state.
    fn settle(&self, item: &ItemId, outcome: SettleOutcome) {
        let Some(entry) = self.entry(item) else {
            debug!(item = %item, "completion for untracked item ignored");
            return;
        };

        let effect = {
            let mut entry = entry.lock();
            let before = entry.state.pending_toggles();
            let effect = entry.state.settle(outcome);
            // A consumed pending toggle retires its (oldest) deadline;
            // swallowed completions had theirs popped by the sweeper.
            if entry.state.pending_toggles() < before {
                entry.deadlines.pop_front();
            }
            effect
        };
        self.apply_effect(item, effect);
    }

    /// Settle every overdue toggle as timed out.
    pub(crate) fn expire_overdue(&self, now: Instant) {
        let entries: Vec<(ItemId, Arc<Mutex<ItemEntry>>)> = {
            let items = self.items.lock();
            items
                .iter()
                .map(|(id, entry)| (id.clone(), Arc::clone(entry)))
                .collect()
        };

        for (item, entry) in entries {
            loop {
                let effect = {
                    let mut entry = entry.lock();
                    match entry.deadlines.front() {
                        Some(deadline) if *deadline <= now => {
                            entry.deadlines.pop_front();
                            Some(entry.state.settle(SettleOutcome::TimedOut))
                        }
                        _ => None,
                    }
                };
                match effect {
                    Some(effect) => {
                        warn!(item = %item, "toggle timed out");
                        self.apply_effect(&item, effect);
                    }
                    None => break,
                }
            }
        }
    }

    fn apply_effect(&self, item: &ItemId, effect: SettleEffect) {
        if let Some(projection) = effect.projection {
            self.subscriptions.broadcast_projection(item, projection);
        }
        if effect.rolled_back {
            warn!(item = %item, "toggle rolled back");
            self.subscriptions.broadcast_rollback(item);
        }
        if effect.stale {
            warn!(item = %item, "item vanished server-side");
            self.subscriptions.broadcast_stale(item);
        }
    }
}
