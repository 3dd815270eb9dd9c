use std::{future::Future, time::Duration};

use tokio::task::JoinHandle;
use tracing::trace;

/// A cancellable timer with at most one outstanding action.
///
/// Scheduling aborts whatever was pending (including an action already past
/// its quiet window and still running) and restarts the clock.
#[derive(Debug)]
pub struct Debouncer {
    quiet: Duration,
    pending: Option<JoinHandle<()>>,
    generation: u64,
}

impl Debouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: None,
            generation: 0,
        }
    }

    pub fn quiet(&self) -> Duration {
        self.quiet
    }

    /// Run `action` once the quiet window passes without another call.
    ///
    /// `action` receives the generation of this schedule, which is also
    /// returned, so its output can be matched against the latest one.
    pub fn schedule<F, Fut>(&mut self, action: F) -> u64
    where
        F: FnOnce(u64) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        self.generation += 1;
        let generation = self.generation;
        let quiet = self.quiet;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(quiet).await;
            action(generation).await;
        }));
        trace!(generation, "Debounce timer armed");
        generation
    }

    /// Abort the pending action. Returns whether one was still outstanding.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(handle) if !handle.is_finished() => {
                handle.abort();
                true
            }
            _ => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
