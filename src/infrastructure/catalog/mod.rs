//! Catalog adapters implementing the fetch port

pub mod flaky;
pub mod memory;

pub use flaky::{CallLog, FailureMode, FlakyFetcher, ServiceUnavailable};
pub use memory::{CatalogFetcher, CatalogQuery, InMemoryCatalog};
