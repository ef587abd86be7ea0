//! Domain layer: pagination math, URL codec, models and ports

pub mod models;
pub mod pagination;
pub mod ports;

pub use models::{Category, Item};
pub use ports::{Location, LocationChange, LocationSubscription, PageFetcher, StatusSink};
