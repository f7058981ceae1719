//! Common test utilities and infrastructure
//!
//! Shared fixtures and the floor builder used across the integration suites.

#![allow(dead_code)]

pub mod fixtures;
pub mod helpers;

// Re-export commonly used items for convenience
pub use fixtures::TestFixtures;
pub use helpers::{Floor, FloorBuilder, TestHelpers};
