//! Location port: the navigable URL a paginated list mirrors itself into

use tokio::sync::broadcast;
use tracing::warn;

use crate::domain::pagination::QueryMap;

/// A location after navigation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationChange {
    pub path: String,
    pub query: QueryMap,
}

/// Port over the router of the hosting application.
pub trait Location: Send + Sync {
    /// Current path, without the query string.
    fn path(&self) -> String;

    /// Current query parameters.
    fn query(&self) -> QueryMap;

    /// Replace the current entry. Must not add a history entry.
    fn replace(&self, path: &str, query: QueryMap);

    /// Observe navigation (back/forward, programmatic changes).
    fn subscribe(&self) -> LocationSubscription;
}

type UnsubscribeHook = Box<dyn FnOnce() + Send + Sync>;

/// Live subscription to location changes. Dropping it unsubscribes.
pub struct LocationSubscription {
    receiver: broadcast::Receiver<LocationChange>,
    on_drop: Option<UnsubscribeHook>,
}

impl LocationSubscription {
    pub fn new(receiver: broadcast::Receiver<LocationChange>) -> Self {
        Self {
            receiver,
            on_drop: None,
        }
    }

    /// Run `hook` once when the subscription is dropped.
    pub fn on_unsubscribe(mut self, hook: impl FnOnce() + Send + Sync + 'static) -> Self {
        self.on_drop = Some(Box::new(hook));
        self
    }

    /// Wait for the next change. `None` once the location is gone.
    pub async fn changed(&mut self) -> Option<LocationChange> {
        loop {
            match self.receiver.recv().await {
                Ok(change) => return Some(change),
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    warn!(missed = count, "Location subscriber lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

impl Drop for LocationSubscription {
    fn drop(&mut self) {
        if let Some(hook) = self.on_drop.take() {
            hook();
        }
    }
}
