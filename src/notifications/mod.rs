//! Notifications module
//!
//! Broadcasts loading/error transitions of paginated lists. Each engine
//! gets its own [`ListStatusSink`], so lists never share one global
//! loading flag.
//!
//! # Usage
//! ```ignore
//! use lot_pagination::notifications::create_event_bus;
//!
//! let bus = create_event_bus();
//! let mut subscriber = bus.subscribe();
//! let options = EngineOptions {
//!     status_sink: Some(Arc::new(bus.sink_for("items"))),
//!     ..EngineOptions::default()
//! };
//! ```

pub mod event_bus;
pub mod events;

pub use event_bus::{create_event_bus, EventBus, EventSubscriber, ListStatusSink, SharedEventBus};
pub use events::*;
