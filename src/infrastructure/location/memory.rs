//! In-memory navigable location with a back/forward history
//!
//! Behaves like a browser router: `push` adds a history entry, `replace`
//! rewrites the current one, `back` / `forward` move through entries.
//! Every change is broadcast to subscribers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::broadcast;
use tracing::debug;

use crate::domain::pagination::QueryMap;
use crate::domain::ports::{Location, LocationChange, LocationSubscription};

const CHANNEL_CAPACITY: usize = 64;

struct History {
    entries: Vec<LocationChange>,
    index: usize,
}

impl History {
    fn current(&self) -> &LocationChange {
        &self.entries[self.index]
    }
}

/// Router stand-in for the CLI and tests
pub struct MemoryLocation {
    history: RwLock<History>,
    sender: broadcast::Sender<LocationChange>,
    subscribers: Arc<AtomicUsize>,
}

impl MemoryLocation {
    pub fn new(path: impl Into<String>) -> Self {
        Self::with_query(path, QueryMap::new())
    }

    pub fn with_query(path: impl Into<String>, query: QueryMap) -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            history: RwLock::new(History {
                entries: vec![LocationChange {
                    path: path.into(),
                    query,
                }],
                index: 0,
            }),
            sender,
            subscribers: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Current entry.
    pub fn current(&self) -> LocationChange {
        self.read(|history| history.current().clone())
    }

    /// Navigate to a new entry, dropping any forward history.
    pub fn push(&self, path: &str, query: QueryMap) {
        let change = LocationChange {
            path: path.to_string(),
            query,
        };
        self.write(|history| {
            let next = history.index + 1;
            history.entries.truncate(next);
            history.entries.push(change.clone());
            history.index = next;
        });
        debug!(path, "Location pushed");
        self.notify(change);
    }

    /// Step back one entry. Returns false at the start of the history.
    pub fn back(&self) -> bool {
        self.step(|index, _| index.checked_sub(1))
    }

    /// Step forward one entry. Returns false at the end of the history.
    pub fn forward(&self) -> bool {
        self.step(|index, len| (index + 1 < len).then_some(index + 1))
    }

    pub fn history_len(&self) -> usize {
        self.read(|history| history.entries.len())
    }

    /// Live subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.load(Ordering::SeqCst)
    }

    fn step(&self, target: impl FnOnce(usize, usize) -> Option<usize>) -> bool {
        let change = self.write(|history| {
            let index = target(history.index, history.entries.len())?;
            history.index = index;
            Some(history.current().clone())
        });
        match change {
            Some(change) => {
                self.notify(change);
                true
            }
            None => false,
        }
    }

    fn notify(&self, change: LocationChange) {
        // No receivers is fine
        let _ = self.sender.send(change);
    }

    fn read<R>(&self, f: impl FnOnce(&History) -> R) -> R {
        f(&self.history.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn write<R>(&self, f: impl FnOnce(&mut History) -> R) -> R {
        f(&mut self.history.write().unwrap_or_else(PoisonError::into_inner))
    }
}

impl Location for MemoryLocation {
    fn path(&self) -> String {
        self.read(|history| history.current().path.clone())
    }

    fn query(&self) -> QueryMap {
        self.read(|history| history.current().query.clone())
    }

    fn replace(&self, path: &str, query: QueryMap) {
        let change = LocationChange {
            path: path.to_string(),
            query,
        };
        self.write(|history| {
            let index = history.index;
            history.entries[index] = change.clone();
        });
        self.notify(change);
    }

    fn subscribe(&self) -> LocationSubscription {
        self.subscribers.fetch_add(1, Ordering::SeqCst);
        let subscribers = self.subscribers.clone();
        LocationSubscription::new(self.sender.subscribe()).on_unsubscribe(move || {
            subscribers.fetch_sub(1, Ordering::SeqCst);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::pagination::QueryValue;

    fn query(pairs: &[(&str, &str)]) -> QueryMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), QueryValue::from(*v)))
            .collect()
    }

    #[test]
    fn replace_does_not_grow_history() {
        let location = MemoryLocation::new("/items");
        location.replace("/items", query(&[("page", "2")]));

        assert_eq!(location.history_len(), 1);
        assert_eq!(location.query(), query(&[("page", "2")]));
    }

    #[test]
    fn back_and_forward_walk_history() {
        let location = MemoryLocation::new("/items");
        location.push("/items", query(&[("page", "2")]));
        location.push("/items", query(&[("page", "3")]));

        assert!(location.back());
        assert_eq!(location.query(), query(&[("page", "2")]));
        assert!(location.back());
        assert!(location.query().is_empty());
        assert!(!location.back());

        assert!(location.forward());
        assert!(location.forward());
        assert!(!location.forward());
        assert_eq!(location.query(), query(&[("page", "3")]));
    }

    #[test]
    fn push_drops_forward_entries() {
        let location = MemoryLocation::new("/items");
        location.push("/items", query(&[("page", "2")]));
        location.back();
        location.push("/items", query(&[("page", "7")]));

        assert_eq!(location.history_len(), 2);
        assert!(!location.forward());
    }

    #[tokio::test]
    async fn subscribers_see_changes_and_unsubscribe_on_drop() {
        let location = MemoryLocation::new("/items");
        let mut subscription = location.subscribe();
        assert_eq!(location.subscriber_count(), 1);

        location.replace("/items", query(&[("page", "4")]));
        let change = subscription.changed().await.unwrap();
        assert_eq!(change.query, query(&[("page", "4")]));

        drop(subscription);
        assert_eq!(location.subscriber_count(), 0);
    }
}
