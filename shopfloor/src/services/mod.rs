//! Service implementations
//!
//! Concrete implementations of the collaborator traits: the in-memory store,
//! document sources, clocks and the seed loader feeding the CLI.

pub mod clock;
pub mod documents;
pub mod memory_store;
pub mod seed;

#[cfg(test)]
mod tests;

// Re-export all service implementations
pub use clock::{FixedClock, SystemClock};
pub use documents::{NoDocuments, StaticDocumentSource};
pub use memory_store::InMemoryShopStore;
pub use seed::SeedData;
