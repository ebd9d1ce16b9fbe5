//! Counted wait group for outstanding page sessions

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;

/// Tracks jobs that were admitted but have not finished.
///
/// `add` happens before a job is queued, `done` when it finishes or when
/// queueing fails. `wait_idle` resolves once the count is back at zero.
#[derive(Debug, Default)]
pub struct TaskGroup {
    pending: AtomicUsize,
    idle: Notify,
}

impl TaskGroup {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self) {
        self.pending.fetch_add(1, Ordering::SeqCst);
    }

    pub fn done(&self) {
        let previous = self.pending.fetch_sub(1, Ordering::SeqCst);
        debug_assert!(previous > 0, "TaskGroup::done without matching add");
        if previous == 1 {
            self.idle.notify_waiters();
        }
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Resolve once no job is pending
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            tokio::pin!(notified);
            // Register before checking so a concurrent `done` is not missed
            notified.as_mut().enable();
            if self.pending() == 0 {
                return;
            }
            notified.await;
        }
    }

    /// Guard that calls `done` on drop, so a panicking job still releases its slot
    #[must_use]
    pub fn guard(self: &Arc<Self>) -> TaskGuard {
        TaskGuard {
            group: Arc::clone(self),
        }
    }
}

#[derive(Debug)]
pub struct TaskGuard {
    group: Arc<TaskGroup>,
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        self.group.done();
    }
}
