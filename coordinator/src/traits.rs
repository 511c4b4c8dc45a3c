//! Trait definitions with mockall annotations for testing
//!
//! These are the external capabilities the coordinator drives. Real
//! implementations live in `services`; tests inject mocks or fakes.

use shared::{CommandOutput, NodeCommand, NodeHandle, NodeRole, SoftwareVersion};

use crate::error::SetupResult;

/// Runs commands on nodes
///
/// Blocking from the caller's point of view; any timeout belongs to the
/// implementation. A non-zero exit status is the only failure signal the
/// coordinator consumes, `Err` means the command could not be run at all.
#[mockall::automock]
#[async_trait::async_trait]
pub trait CommandExecutor: Send + Sync {
    async fn run(&self, node: &NodeHandle, command: &NodeCommand) -> SetupResult<CommandOutput>;
}

/// Resolves role instances to nodes
#[mockall::automock]
#[async_trait::async_trait]
pub trait NodeInventory: Send + Sync {
    /// Resolve the node serving `role` instance `instance` (1-based), hostname included
    async fn resolve(&self, role: NodeRole, instance: u32) -> SetupResult<NodeHandle>;

    /// Instance numbers currently running for `role`
    async fn available_instances(&self, role: NodeRole) -> SetupResult<Vec<u32>>;
}

/// Reports which server version a node runs
#[mockall::automock]
#[async_trait::async_trait]
pub trait VersionSource: Send + Sync {
    async fn server_version(&self, node: &NodeHandle) -> SetupResult<SoftwareVersion>;
}

/// Prepares the catalog database a provider connects to
#[mockall::automock]
#[async_trait::async_trait]
pub trait CatalogDatabase: Send + Sync {
    /// Port the database server listens on
    fn server_port(&self) -> u16;

    /// Create the catalog on `node`; a non-zero exit status fails the zone
    async fn setup_catalog(&self, node: &NodeHandle) -> SetupResult<CommandOutput>;
}
