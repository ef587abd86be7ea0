//! Infrastructure layer: in-memory adapters for the domain ports

pub mod catalog;
pub mod location;

pub use catalog::{CatalogFetcher, CatalogQuery, FailureMode, FlakyFetcher, InMemoryCatalog};
pub use location::MemoryLocation;
