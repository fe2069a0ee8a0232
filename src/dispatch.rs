//! Background dispatch of store calls.
//!
//! Workers drain a job queue and perform the blocking store calls off
//! the caller's thread; completions re-enter the engine through its
//! settle path. An optional sweeper settles overdue toggles as failed
//! so a hung call cannot leave an item's pending counter stuck.

use crate::engine::EngineInner;
use crate::types::ItemId;
use crossbeam_channel::{bounded, unbounded, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::debug;

/// A unit of background work.
pub(crate) enum Job {
    /// Issue one toggle against the store.
    Toggle(ItemId),
    /// Fetch the viewer's like state.
    Read(ItemId),
}

pub(crate) struct Dispatcher {
    jobs: Option<Sender<Job>>,
    sweeper_stop: Option<Sender<()>>,
    sweeper: Option<JoinHandle<()>>,
}

impl Dispatcher {
    pub(crate) fn spawn(
        inner: Arc<EngineInner>,
        workers: usize,
        toggle_timeout: Option<Duration>,
    ) -> Self {
        let (jobs_tx, jobs_rx) = unbounded::<Job>();

        for i in 0..workers.max(1) {
            let jobs = jobs_rx.clone();
            let inner = Arc::clone(&inner);
            thread::Builder::new()
                .name(format!("likewise-worker-{i}"))
                .spawn(move || {
                    while let Ok(job) = jobs.recv() {
                        match job {
                            Job::Toggle(item) => inner.perform_toggle(&item),
                            Job::Read(item) => inner.perform_read(&item),
                        }
                    }
                })
                .expect("Failed to spawn worker thread");
        }

        let (sweeper_stop, sweeper) = match toggle_timeout {
            Some(timeout) => {
                let (stop_tx, stop_rx) = bounded::<()>(0);
                let inner = Arc::clone(&inner);
                let interval = (timeout / 4).max(Duration::from_millis(5));
                let handle = thread::Builder::new()
                    .name("likewise-sweeper".into())
                    .spawn(move || loop {
                        match stop_rx.recv_timeout(interval) {
                            Err(RecvTimeoutError::Timeout) => {
                                inner.expire_overdue(Instant::now());
                            }
                            _ => break,
                        }
                    })
                    .expect("Failed to spawn sweeper thread");
                (Some(stop_tx), Some(handle))
            }
            None => (None, None),
        };

        Self {
            jobs: Some(jobs_tx),
            sweeper_stop,
            sweeper,
        }
    }

    /// Queue a job. The queue is unbounded; submission never blocks.
    pub(crate) fn submit(&self, job: Job) {
        if let Some(jobs) = &self.jobs {
            if jobs.send(job).is_err() {
                debug!("dispatch queue closed, dropping job");
            }
        }
    }

    /// Close the queue and stop the sweeper. Workers drain outstanding
    /// jobs and exit; a call still blocked in the store finishes in the
    /// background and its completion is ignored.
    pub(crate) fn shutdown(&mut self) {
        self.jobs.take();
        self.sweeper_stop.take();
        if let Some(handle) = self.sweeper.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}
