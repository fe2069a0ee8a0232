//! Subscription machinery for the feed renderer boundary.
//!
//! Renderers subscribe with a filter and receive [`FeedEvent`]s over a
//! bounded channel: `{liked, count}` projections on every displayed
//! change, plus notices for rollbacks, stale items, and retired state.
//! Slow consumers are dropped rather than blocked on.

mod manager;
mod types;

pub use manager::SubscriptionManager;
pub use types::{
    DropReason, FeedEvent, FeedFilter, SubscriptionConfig, SubscriptionHandle, SubscriptionId,
};
