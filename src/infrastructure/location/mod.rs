//! Location adapters

pub mod memory;

pub use memory::MemoryLocation;
