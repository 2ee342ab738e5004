//! Per-state timeout timers.
//!
//! At most one timer is armed per instance. Leaving the state cancels it
//! under the execution gate; a timer that wakes up re-checks its flag and
//! generation under the same gate before firing, so a cancelled timer never
//! acts.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// A sleeping timer task and the flag used to stand it down.
#[derive(Debug)]
pub(crate) struct ArmedTimer {
    pub(crate) generation: u64,
    cancelled: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl ArmedTimer {
    pub(crate) fn new(generation: u64, cancelled: Arc<AtomicBool>, handle: JoinHandle<()>) -> Self {
        Self {
            generation,
            cancelled,
            handle,
        }
    }

    /// Whether the task woken for `generation` may still fire.
    pub(crate) fn is_live(&self, generation: u64) -> bool {
        self.generation == generation && !self.cancelled.load(Ordering::SeqCst)
    }

    /// Stand the timer down. Must be called with the gate held.
    pub(crate) fn cancel(self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn cancel_sets_flag_and_aborts_task() {
        let cancelled = Arc::new(AtomicBool::new(false));
        let handle = tokio::spawn(async {
            tokio::time::sleep(Duration::from_secs(60)).await;
        });
        let timer = ArmedTimer::new(3, cancelled.clone(), handle);

        assert!(timer.is_live(3));
        assert!(!timer.is_live(4));

        timer.cancel();
        assert!(cancelled.load(Ordering::SeqCst));
    }
}
