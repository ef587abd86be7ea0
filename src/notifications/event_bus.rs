//! Event Bus for broadcasting list status to subscribers
//!
//! Uses tokio broadcast channel for pub/sub pattern.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::events::{ErrorChangedEvent, Event, EventMessage, LoadingChangedEvent};
use crate::domain::ports::StatusSink;

/// Default channel capacity
const DEFAULT_CAPACITY: usize = 256;

/// Event bus for broadcasting events to all subscribers
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EventMessage>,
    subscriber_count: Arc<AtomicUsize>,
}

impl EventBus {
    /// Create a new event bus with default capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a new event bus with custom capacity
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            subscriber_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Publish an event to all subscribers
    pub fn publish(&self, event: Event) {
        let message = EventMessage::new(event);
        let event_type = message.event.event_type();
        let list = message.event.list().to_string();

        match self.sender.send(message) {
            Ok(count) => {
                debug!(event_type, list = %list, subscribers = count, "Event published");
            }
            Err(_) => {
                // No subscribers - normal when nothing renders status
                debug!(event_type, list = %list, "Event published (no subscribers)");
            }
        }
    }

    /// Subscribe to receive events
    pub fn subscribe(&self) -> EventSubscriber {
        let receiver = self.sender.subscribe();
        let count = self.subscriber_count.fetch_add(1, Ordering::SeqCst) + 1;
        info!(total = count, "New event subscriber");

        EventSubscriber {
            receiver,
            subscriber_count: self.subscriber_count.clone(),
        }
    }

    /// Get current subscriber count
    pub fn subscriber_count(&self) -> usize {
        self.subscriber_count.load(Ordering::SeqCst)
    }

    /// Status sink that tags every event with `list`
    pub fn sink_for(self: &Arc<Self>, list: impl Into<String>) -> ListStatusSink {
        ListStatusSink {
            bus: self.clone(),
            list: list.into(),
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Event subscriber that receives events from the bus
pub struct EventSubscriber {
    receiver: broadcast::Receiver<EventMessage>,
    subscriber_count: Arc<AtomicUsize>,
}

impl EventSubscriber {
    /// Receive the next event
    pub async fn recv(&mut self) -> Option<EventMessage> {
        loop {
            match self.receiver.recv().await {
                Ok(msg) => return Some(msg),
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    warn!(missed = count, "Subscriber lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => {
                    return None;
                }
            }
        }
    }
}

impl Drop for EventSubscriber {
    fn drop(&mut self) {
        let prev = self.subscriber_count.fetch_sub(1, Ordering::SeqCst);
        info!(remaining = prev - 1, "Event subscriber disconnected");
    }
}

/// [`StatusSink`] publishing a list's transitions onto an [`EventBus`]
#[derive(Clone)]
pub struct ListStatusSink {
    bus: SharedEventBus,
    list: String,
}

impl StatusSink for ListStatusSink {
    fn loading_changed(&self, loading: bool) {
        self.bus.publish(Event::LoadingChanged(LoadingChangedEvent {
            list: self.list.clone(),
            loading,
            timestamp: Utc::now(),
        }));
    }

    fn error_changed(&self, error: Option<&str>) {
        self.bus.publish(Event::ErrorChanged(ErrorChangedEvent {
            list: self.list.clone(),
            error: error.map(String::from),
            timestamp: Utc::now(),
        }));
    }
}

/// Shared event bus type
pub type SharedEventBus = Arc<EventBus>;

/// Create a shared event bus
pub fn create_event_bus() -> SharedEventBus {
    Arc::new(EventBus::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_event_bus_publish_subscribe() {
        let bus = EventBus::new();
        let mut subscriber = bus.subscribe();

        bus.publish(Event::LoadingChanged(LoadingChangedEvent {
            list: "items".to_string(),
            loading: true,
            timestamp: Utc::now(),
        }));

        let received = tokio::time::timeout(Duration::from_millis(100), subscriber.recv())
            .await
            .expect("Timeout")
            .expect("No message");

        assert_eq!(received.event.event_type(), "loading_changed");
        assert_eq!(received.event.list(), "items");
    }

    #[test]
    fn test_subscriber_count() {
        let bus = EventBus::new();
        assert_eq!(bus.subscriber_count(), 0);

        let _sub1 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);

        let _sub2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        drop(_sub1);
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[tokio::test]
    async fn test_list_sink_tags_events() {
        let bus = create_event_bus();
        let mut subscriber = bus.subscribe();
        let sink = bus.sink_for("reviews");

        sink.error_changed(Some("Failed to load page: offline"));

        let received = subscriber.recv().await.expect("No message");
        match received.event {
            Event::ErrorChanged(e) => {
                assert_eq!(e.list, "reviews");
                assert_eq!(e.error.as_deref(), Some("Failed to load page: offline"));
            }
            other => panic!("unexpected event {}", other.event_type()),
        }
    }
}
