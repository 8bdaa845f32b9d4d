//! Session provider implementations

mod fixture;
mod memory;

pub use fixture::FixtureProvider;
pub use memory::MemoryProvider;
