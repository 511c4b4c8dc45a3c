//! Common test utilities and infrastructure
//!
//! Fakes for the node-facing capabilities plus a builder wiring them into a
//! coordinator.

#![allow(dead_code)]

pub mod fixtures;
pub mod helpers;

// Re-export commonly used items for convenience
pub use fixtures::TestFixtures;
pub use helpers::{CoordinatorBuilder, FakeExecutor, FakeInventory, FakeVersions, TestCoordinator};
