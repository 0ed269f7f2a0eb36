//! Single-slot, cancellable scheduled task used for trailing debounce.
//!
//! At most one timer is pending at any time. Scheduling a new one aborts the
//! previous one if it has not fired yet. Once a timer fires it *claims* the
//! slot, after which neither [`PendingTimer::schedule`] nor
//! [`PendingTimer::cancel`] can abort the work it started.
use std::{
    future::Future,
    sync::{Arc, Mutex},
    time::Duration,
};

use tokio::{runtime::Handle, task::JoinHandle};

use crate::lock;

#[derive(Debug, Default)]
struct Slot {
    generation: u64,
    handle: Option<JoinHandle<()>>,
}

#[derive(Debug)]
pub struct PendingTimer {
    slot: Arc<Mutex<Slot>>,
    runtime: Handle,
}

impl PendingTimer {
    /// Timers run on `runtime`, so [`Self::schedule`] may be called from any
    /// thread.
    pub fn new(runtime: Handle) -> Self {
        Self {
            slot: Arc::default(),
            runtime,
        }
    }

    /// Run `task` after `delay` unless another call to `schedule` or `cancel`
    /// happens first.
    pub fn schedule<F>(&self, delay: Duration, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut slot = lock(&self.slot);
        if let Some(previous) = slot.handle.take() {
            previous.abort();
        }

        slot.generation += 1;
        let generation = slot.generation;
        let shared = Arc::clone(&self.slot);

        // The spawned task cannot claim the slot before we store its handle:
        // claiming needs the lock we are holding.
        slot.handle = Some(self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if claim(&shared, generation) {
                task.await;
            }
        }));
    }

    /// Drop the pending timer, if any. Work that already fired keeps running.
    pub fn cancel(&self) {
        let mut slot = lock(&self.slot);
        slot.generation += 1;
        if let Some(pending) = slot.handle.take() {
            pending.abort();
        }
    }

    /// Whether a timer is waiting to fire.
    pub fn is_pending(&self) -> bool {
        lock(&self.slot).handle.is_some()
    }
}

impl Drop for PendingTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn claim(slot: &Mutex<Slot>, generation: u64) -> bool {
    let mut slot = lock(slot);
    if slot.generation != generation {
        return false;
    }
    // Detach: dropping the handle does not abort the task.
    slot.handle = None;
    true
}
