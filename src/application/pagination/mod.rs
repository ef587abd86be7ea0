pub mod engine;
pub mod state;

pub use engine::{EngineOptions, PaginationEngine, DEFAULT_FETCH_DEBOUNCE};
pub use state::PaginationState;
