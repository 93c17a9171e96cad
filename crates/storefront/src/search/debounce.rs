//! Burst coalescing for state-change effects.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Coalesces bursts of triggers into one downstream effect.
///
/// Every call to [`Debouncer::schedule`] supersedes any pending one: of N
/// triggers within the quiet window, only the last one's task runs, and it
/// runs once the window has elapsed. The timer identity lives here, owned by
/// whoever owns the `Debouncer`, so cancellation and rescheduling are
/// unambiguous (no closure-per-trigger timers).
#[derive(Debug)]
pub(crate) struct Debouncer {
    generation: Arc<AtomicU64>,
    delay: Duration,
}

impl Debouncer {
    pub(crate) fn new(delay: Duration) -> Self {
        Self {
            generation: Arc::new(AtomicU64::new(0)),
            delay,
        }
    }

    /// Schedule `task` to run after the quiet window, superseding any
    /// previously scheduled task that has not fired yet.
    ///
    /// Must be called from within a tokio runtime.
    pub(crate) fn schedule<F, Fut>(&self, task: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let scheduled = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let generation = Arc::clone(&self.generation);
        let delay = self.delay;

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // A later trigger moved the generation on; this task is stale.
            if generation.load(Ordering::SeqCst) == scheduled {
                task().await;
            }
        });
    }
}
