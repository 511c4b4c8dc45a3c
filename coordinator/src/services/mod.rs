//! Real service implementations
//!
//! Each service implements one trait from `traits` against docker and the
//! server's own tooling.

pub mod compose_inventory;
pub mod docker_executor;
pub mod postgres_catalog;
pub mod version_source;

#[cfg(test)]
mod tests;

pub use compose_inventory::ComposeInventory;
pub use docker_executor::DockerExecutor;
pub use postgres_catalog::{CatalogSettings, PostgresCatalog, POSTGRES_PORT};
pub use version_source::{parse_version_document, ServerVersionSource};
