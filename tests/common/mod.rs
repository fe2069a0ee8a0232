//! Shared test doubles and helpers.

#![allow(dead_code)]

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use likewise::{EngineError, ItemId, LikeStore, Result, ToggleReceipt, ViewerId};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A toggle call waiting for the test to decide its fate.
pub struct PendingToggle {
    pub item: ItemId,
    verdict: Sender<Result<ToggleReceipt>>,
}

impl PendingToggle {
    pub fn confirm(self, liked: bool, count: u64) {
        let _ = self.verdict.send(Ok(ToggleReceipt { liked, count }));
    }

    pub fn fail(self) {
        let _ = self
            .verdict
            .send(Err(EngineError::Network("injected failure".into())));
    }

    pub fn gone(self) {
        let item = self.item.clone();
        let _ = self.verdict.send(Err(EngineError::ItemNotFound(item)));
    }
}

/// A store whose toggle calls block until the test completes them,
/// letting responses settle in any order the test chooses.
pub struct GatedStore {
    pending: Sender<PendingToggle>,
    toggle_calls: AtomicUsize,
    /// `Some(liked)` answers reads immediately; `None` errors them.
    read_result: Mutex<Option<bool>>,
}

impl GatedStore {
    pub fn new() -> (Arc<Self>, Receiver<PendingToggle>) {
        let (tx, rx) = unbounded();
        (
            Arc::new(Self {
                pending: tx,
                toggle_calls: AtomicUsize::new(0),
                read_result: Mutex::new(Some(false)),
            }),
            rx,
        )
    }

    pub fn toggle_calls(&self) -> usize {
        self.toggle_calls.load(Ordering::SeqCst)
    }

    pub fn set_read_result(&self, result: Option<bool>) {
        *self.read_result.lock() = result;
    }
}

impl LikeStore for GatedStore {
    fn toggle_like(&self, item: &ItemId, _viewer: &ViewerId) -> Result<ToggleReceipt> {
        self.toggle_calls.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = bounded(1);
        let call = PendingToggle {
            item: item.clone(),
            verdict: tx,
        };
        if self.pending.send(call).is_err() {
            return Err(EngineError::Network("test harness gone".into()));
        }
        rx.recv()
            .unwrap_or_else(|_| Err(EngineError::Network("verdict dropped".into())))
    }

    fn like_state(&self, _item: &ItemId, _viewer: &ViewerId) -> Result<bool> {
        match *self.read_result.lock() {
            Some(liked) => Ok(liked),
            None => Err(EngineError::Unauthenticated),
        }
    }
}

/// Receive the next gated toggle call, with a deadline.
pub fn next_toggle(calls: &Receiver<PendingToggle>) -> PendingToggle {
    calls
        .recv_timeout(Duration::from_secs(2))
        .expect("expected a toggle call to reach the store")
}

/// Poll until the condition holds or a deadline passes.
pub fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if condition() {
            return;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    panic!("condition not reached within deadline");
}
