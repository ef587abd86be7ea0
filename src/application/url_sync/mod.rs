//! URL-synchronized pagination

pub mod binding;
pub mod url;

pub use binding::bind_engine;
pub use url::{UrlPagination, UrlPosition, UrlSyncOptions, DEFAULT_URL_DEBOUNCE};
