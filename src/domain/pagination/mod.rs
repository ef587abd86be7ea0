//! Pagination math and URL parameter codec

pub mod math;
pub mod params;

pub use math::*;
pub use params::*;
