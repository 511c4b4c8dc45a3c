//! Zone setup library for multi-node catalog deployments
//!
//! This library turns a zone topology (one catalog database, one catalog
//! provider and any number of consumers per zone) into configured servers:
//! it renders the setup script's answers for each node's server version,
//! dispatches setup across zones and consumers concurrently, and waits for
//! the servers to start answering.

pub mod config;
pub mod coordinator;
pub mod core;
pub mod error;
pub mod pool;
pub mod readiness;
pub mod services;
pub mod traits;

// Re-export commonly used types
pub use config::{CoordinatorConfig, ReadinessSettings, ServerLayout};
pub use coordinator::SetupCoordinator;
pub use core::{
    make_negotiation_key, make_zone_key, plan_zones, select, BatchOutcome, ConsumerSelection, NodeOutcome,
    SetupField, SetupInput, SetupInputBuilder, SetupOverrides, ZoneReport, ZoneState, ZoneTopology,
};
pub use error::{NodeFailure, SetupError, SetupPhase, SetupResult};
pub use readiness::{ReadinessPoller, ReadinessReport, ReadinessSpec};
pub use traits::{CatalogDatabase, CommandExecutor, NodeInventory, VersionSource};
