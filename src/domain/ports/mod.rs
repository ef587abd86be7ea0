//! Domain ports (hexagonal architecture boundaries)
//!
//! Ports define the interfaces between the pagination core and the outside
//! world: the data service, the router and the status display.

pub mod fetch;
pub mod location;
pub mod status;

pub use fetch::PageFetcher;
pub use location::{Location, LocationChange, LocationSubscription};
pub use status::{SharedStatusSink, StatusSink};
