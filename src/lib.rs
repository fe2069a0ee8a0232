//! # Likewise
//!
//! Optimistic like/unlike reconciliation for feed clients.
//!
//! The engine owns the observable `{liked, count}` state per feed item
//! and mediates between instantaneous user intent, speculative local
//! state, and eventually-consistent server confirmation.
//!
//! ## Core Concepts
//!
//! - **LikeState**: per-item reconciliation state: what the server
//!   confirmed, what the user sees, and how many toggles are in flight
//! - **LikeEngine**: applies clicks optimistically, dispatches store
//!   calls in the background, reconciles completions in any order
//! - **LikeStore**: the authoritative backend boundary (toggle + read)
//! - **Subscriptions**: renderers receive `{liked, count}` projections
//!   on every displayed change
//!
//! ## Example
//!
//! ```
//! use likewise::{FeedFilter, ItemId, LikeEngine, MemoryStore, SubscriptionConfig, ViewerId};
//! use std::sync::Arc;
//!
//! let store = Arc::new(MemoryStore::new());
//! store.seed_item(ItemId::new("thread-1"), 10);
//!
//! let engine = LikeEngine::new(store, ViewerId::new("viewer-1"));
//! let _feed = engine.subscribe(SubscriptionConfig {
//!     filter: FeedFilter::projections(),
//!     ..Default::default()
//! });
//!
//! let item = ItemId::new("thread-1");
//! engine.track(item.clone(), 10);
//!
//! // Visible immediately, confirmed in the background.
//! engine.on_user_toggle(&item)?;
//! assert_eq!(engine.projection(&item).unwrap().count, 11);
//! # Ok::<(), likewise::EngineError>(())
//! ```

pub(crate) mod dispatch;
pub mod engine;
pub mod error;
pub mod state;
pub mod store;
pub mod subscriptions;
pub mod types;

// Re-exports
pub use engine::{EngineConfig, LikeEngine};
pub use error::{EngineError, Result};
pub use state::{LikeState, SettleEffect, SettleOutcome};
pub use store::{LikeStore, MemoryStore};
pub use subscriptions::{
    DropReason, FeedEvent, FeedFilter, SubscriptionConfig, SubscriptionHandle, SubscriptionId,
    SubscriptionManager,
};
pub use types::*;
