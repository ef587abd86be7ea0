//! Application layer: stateful pagination controllers

pub mod pagination;
pub mod url_sync;

pub use pagination::{EngineOptions, PaginationEngine, PaginationState};
pub use url_sync::{bind_engine, UrlPagination, UrlPosition, UrlSyncOptions};
