//! Notification events
//!
//! Status transitions of paginated lists, broadcast to whatever renders
//! spinners and error banners.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Event types for notifications
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Event {
    /// A list started or finished loading
    LoadingChanged(LoadingChangedEvent),
    /// A list's user-facing error was set or cleared
    ErrorChanged(ErrorChangedEvent),
}

impl Event {
    /// Get the event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::LoadingChanged(_) => "loading_changed",
            Event::ErrorChanged(_) => "error_changed",
        }
    }

    /// Name of the list the event belongs to
    pub fn list(&self) -> &str {
        match self {
            Event::LoadingChanged(e) => &e.list,
            Event::ErrorChanged(e) => &e.list,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadingChangedEvent {
    pub list: String,
    pub loading: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorChangedEvent {
    pub list: String,
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Envelope delivered to subscribers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: Event,
}

impl EventMessage {
    pub fn new(event: Event) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event,
        }
    }

    /// Wire form sent to UI observers.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
