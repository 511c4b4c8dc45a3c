//! Service-specific tests
//!
//! Services that talk to nodes are exercised through mocked executors; the
//! docker-facing pieces are tested on their argument building.

mod docker;
mod version_source;

pub mod common {
    use shared::{NodeHandle, NodeRole};

    pub fn database_node() -> NodeHandle {
        NodeHandle::new("proj_irods-catalog_1", "icat-1", NodeRole::DatabaseServer, 1)
    }

    pub fn provider_node() -> NodeHandle {
        NodeHandle::new("proj_irods-catalog-provider_1", "csp-1", NodeRole::CatalogProvider, 1)
    }
}
