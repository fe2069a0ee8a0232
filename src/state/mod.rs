//! Pure like-state machine.
//!
//! All reconciliation decisions live here, free of locks and I/O. The
//! engine wraps each [`LikeState`] in a per-item mutex and translates
//! the returned effects into renderer events.

mod machine;

pub use machine::{LikeState, SettleEffect, SettleOutcome};
