//! Like-state transitions.

use crate::types::{LikeProjection, LikeStateSnapshot, ToggleReceipt};

/// How a dispatched toggle ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SettleOutcome {
    /// The store confirmed the flip and returned the new truth.
    Confirmed(ToggleReceipt),
    /// The call failed (network error or server rejection).
    Failed,
    /// The optional timeout fired before any completion arrived.
    TimedOut,
    /// The store reports the item no longer exists.
    Gone,
}

/// What a settle did to the state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SettleEffect {
    /// New projection, if the displayed state changed.
    pub projection: Option<LikeProjection>,
    /// The last outstanding toggle failed and displayed state was
    /// reverted to server truth.
    pub rolled_back: bool,
    /// The item just became stale (vanished server-side).
    pub stale: bool,
}

/// Reconciliation state for one (item, viewer) pair.
///
/// `pending_toggles` is the single coordination counter: whether a
/// completion commits or rolls back, and whether a read overwrites the
/// displayed fields, depends only on it being zero at arrival time,
/// never on timestamps or on matching responses to requests.
#[derive(Clone, Debug)]
pub struct LikeState {
    server_liked: Option<bool>,
    server_count: u64,
    displayed_liked: bool,
    displayed_count: u64,
    pending_toggles: u32,
    /// Toggles settled by timeout whose real completion is still owed.
    /// Those completions must be swallowed when they eventually arrive.
    forfeited: u32,
    stale: bool,
}

impl LikeState {
    /// Fresh state seeded with the feed-supplied count.
    ///
    /// The viewer's own like relation is unknown until the first
    /// authoritative read and renders as not-liked.
    pub fn new(seed_count: u64) -> Self {
        Self {
            server_liked: None,
            server_count: seed_count,
            displayed_liked: false,
            displayed_count: seed_count,
            pending_toggles: 0,
            forfeited: 0,
            stale: false,
        }
    }

    /// What the renderer should show right now.
    pub fn projection(&self) -> LikeProjection {
        LikeProjection {
            liked: self.displayed_liked,
            count: self.displayed_count,
        }
    }

    pub fn pending_toggles(&self) -> u32 {
        self.pending_toggles
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn snapshot(&self) -> LikeStateSnapshot {
        LikeStateSnapshot {
            server_liked: self.server_liked,
            server_count: self.server_count,
            displayed_liked: self.displayed_liked,
            displayed_count: self.displayed_count,
            pending_toggles: self.pending_toggles,
            stale: self.stale,
        }
    }

    fn server_liked_or_default(&self) -> bool {
        self.server_liked.unwrap_or(false)
    }

    /// Apply one user click: flip the displayed state, adjust the count,
    /// one more toggle in flight.
    ///
    /// Rapid clicks are each independent toggles; they are never
    /// collapsed. Two clicks are two server flips and two local flips,
    /// a net no-op on both sides regardless of completion order.
    pub fn user_toggle(&mut self) -> LikeProjection {
        self.displayed_liked = !self.displayed_liked;
        if self.displayed_liked {
            self.displayed_count += 1;
        } else {
            self.displayed_count = self.displayed_count.saturating_sub(1);
        }
        self.pending_toggles += 1;
        self.projection()
    }

    /// Apply the completion (or timeout) of a dispatched toggle.
    pub fn settle(&mut self, outcome: SettleOutcome) -> SettleEffect {
        // A real completion owed to a timed-out attempt: the timeout
        // already settled it, swallow the response.
        if self.forfeited > 0 && !matches!(outcome, SettleOutcome::TimedOut) {
            self.forfeited -= 1;
            return SettleEffect::default();
        }

        // Nothing outstanding: a completion for a retired or already
        // reconciled attempt. Ignore rather than underflow.
        if self.pending_toggles == 0 {
            return SettleEffect::default();
        }
        self.pending_toggles -= 1;

        match outcome {
            SettleOutcome::Confirmed(receipt) => {
                // Server truth wins unconditionally; displayed fields
                // already carry the user's latest intent and are only
                // reconciled once nothing newer is in flight.
                self.server_liked = Some(receipt.liked);
                self.server_count = receipt.count;
                SettleEffect::default()
            }
            SettleOutcome::Failed => self.roll_back_if_settled(false),
            SettleOutcome::TimedOut => {
                self.forfeited += 1;
                self.roll_back_if_settled(false)
            }
            SettleOutcome::Gone => {
                let newly_stale = !self.stale;
                self.stale = true;
                self.roll_back_if_settled(newly_stale)
            }
        }
    }

    /// Revert displayed state to server truth, unless a newer toggle is
    /// still in flight (its completion decides).
    fn roll_back_if_settled(&mut self, stale: bool) -> SettleEffect {
        if self.pending_toggles > 0 {
            return SettleEffect {
                stale,
                ..Default::default()
            };
        }
        let before = self.projection();
        self.displayed_liked = self.server_liked_or_default();
        self.displayed_count = self.server_count;
        let after = self.projection();
        SettleEffect {
            projection: (after != before).then_some(after),
            rolled_back: true,
            stale,
        }
    }

    /// Authoritative snapshot from a background read or feed refresh.
    ///
    /// Server fields are overwritten unconditionally. Displayed fields
    /// follow only when no toggle is in flight: an in-flight user action
    /// takes visual precedence over a concurrent read.
    pub fn server_state(&mut self, liked: bool, count: u64) -> Option<LikeProjection> {
        self.server_liked = Some(liked);
        self.server_count = count;
        if self.pending_toggles > 0 {
            return None;
        }
        let before = self.projection();
        self.displayed_liked = liked;
        self.displayed_count = count;
        let after = self.projection();
        (after != before).then_some(after)
    }

    /// Result of the viewer-specific like read. That endpoint does not
    /// carry the aggregate count, which stays as last confirmed.
    pub fn server_read(&mut self, liked: bool) -> Option<LikeProjection> {
        let count = self.server_count;
        self.server_state(liked, count)
    }

    /// The like read failed or the viewer is unauthenticated: settle the
    /// unknown as not-liked without touching the displayed count.
    pub fn read_failed(&mut self) {
        if self.server_liked.is_none() {
            self.server_liked = Some(false);
        }
    }
}
