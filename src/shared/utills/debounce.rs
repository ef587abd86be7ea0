//! Trailing-edge debounce
//!
//! Collapses bursts of calls into one invocation carrying the arguments of
//! the last call, fired `wait` after that call. Timers run on the Tokio
//! runtime the call is made from.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tracing::{debug, warn};

/// Debounced wrapper around `Fn(A)`. Use a tuple for several arguments
/// and `()` for none. Clones share the same timer.
pub struct Debounced<A> {
    wait: Duration,
    /// Bumped on every call and on cancel; a timer only fires if it still
    /// holds the latest value.
    generation: Arc<AtomicU64>,
    /// Generation that last fired or was cancelled.
    settled: Arc<AtomicU64>,
    action: Arc<dyn Fn(A) + Send + Sync>,
}

/// Wrap `f` so that it runs once per quiet period of `wait`.
pub fn debounce<A, F>(f: F, wait: Duration) -> Debounced<A>
where
    A: Send + 'static,
    F: Fn(A) + Send + Sync + 'static,
{
    Debounced {
        wait,
        generation: Arc::new(AtomicU64::new(0)),
        settled: Arc::new(AtomicU64::new(0)),
        action: Arc::new(f),
    }
}

impl<A: Send + 'static> Debounced<A> {
    /// Schedule `args`, superseding any call still waiting.
    pub fn call(&self, args: A) {
        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                warn!("Debounced call outside of a Tokio runtime dropped");
                return;
            }
        };

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let latest = self.generation.clone();
        let settled = self.settled.clone();
        let action = self.action.clone();
        let wait = self.wait;

        handle.spawn(async move {
            tokio::time::sleep(wait).await;
            if latest.load(Ordering::SeqCst) != generation {
                debug!(generation, "Debounced call superseded");
                return;
            }
            action(args);
            settled.fetch_max(generation, Ordering::SeqCst);
        });
    }

    /// Drop the pending call, if any.
    pub fn cancel(&self) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.settled.fetch_max(generation, Ordering::SeqCst);
    }

    /// Whether a call is waiting for its quiet period to end.
    pub fn is_pending(&self) -> bool {
        self.generation.load(Ordering::SeqCst) != self.settled.load(Ordering::SeqCst)
    }

    pub fn wait(&self) -> Duration {
        self.wait
    }
}

impl<A> Clone for Debounced<A> {
    fn clone(&self) -> Self {
        Self {
            wait: self.wait,
            generation: self.generation.clone(),
            settled: self.settled.clone(),
            action: self.action.clone(),
        }
    }
}
