pub mod debounce;
pub mod retry;

pub use debounce::{debounce, Debounced};
pub use retry::{retry_with_backoff, RetryConfig};
