//! Test fixtures for zone setup tests

use coordinator::services::ComposeInventory;
use coordinator::{make_negotiation_key, make_zone_key, ConsumerSelection, ZoneTopology};
use shared::{NodeRole, ZoneIdentity};

pub struct TestFixtures;

impl TestFixtures {
    pub const PROJECT: &'static str = "test";
    pub const DB_PORT: u16 = 5432;

    /// Zone with its own keys, database and provider instance `instance`
    pub fn zone(name: &str, instance: u32, consumers: impl IntoIterator<Item = u32>) -> ZoneTopology {
        let identity = ZoneIdentity::new(name, make_zone_key(name), make_negotiation_key(name, ""))
            .expect("fixture zone identity is valid");
        ZoneTopology::new(identity)
            .with_instances(instance, instance)
            .with_consumers(ConsumerSelection::instances(consumers))
    }

    /// Zone without consumers
    pub fn lone_zone(name: &str, instance: u32) -> ZoneTopology {
        Self::zone(name, instance, Vec::new())
    }

    pub fn node_name(role: NodeRole, instance: u32) -> String {
        ComposeInventory::container_name(Self::PROJECT, role, instance)
    }

    pub fn hostname(role: NodeRole, instance: u32) -> String {
        format!("{}-{}.test", role.service_name(), instance)
    }
}
