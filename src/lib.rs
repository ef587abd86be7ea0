//! # Lot Pagination
//!
//! Client-side pagination for the Library of Things catalog: page math,
//! a debounced fetch engine with retry and backoff, and a wrapper that
//! mirrors page and size into the URL query string.
//!
//! ## Architecture
//!
//! - **domain**: pagination math, URL parameter codec, models and ports
//! - **application**: the pagination engine and URL-synchronized wrapper
//! - **infrastructure**: in-memory catalog, failure injection, location
//! - **notifications**: loading/error events for UI observers
//! - **shared**: errors, response envelopes, retry and debounce helpers

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod notifications;
pub mod shared;

pub use config::{default_config_path, init_tracing, AppConfig};

pub use application::{
    bind_engine, EngineOptions, PaginationEngine, PaginationState, UrlPagination, UrlPosition,
    UrlSyncOptions,
};
pub use domain::ports::{Location, PageFetcher, StatusSink};
pub use notifications::{create_event_bus, Event, EventBus, SharedEventBus};
pub use shared::types::{
    FetchError, PageEnvelope, PaginatedResponse, PaginationError, PaginationMeta,
};
