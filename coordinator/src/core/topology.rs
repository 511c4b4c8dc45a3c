//! Zone topology planning
//!
//! Assigns database, provider and consumer instances to zones. Pure logic; the
//! caller supplies whatever consumer instances its inventory reports.

use shared::{ZoneIdentity, NEGOTIATION_KEY_LEN};
use std::collections::BTreeSet;

use crate::error::SetupResult;

/// Which consumer instances belong to a zone
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsumerSelection {
    /// Every consumer instance the inventory reports
    All,
    /// Exactly these instances, where available. Empty means no consumers.
    Instances(BTreeSet<u32>),
}

impl ConsumerSelection {
    pub fn instances(instances: impl IntoIterator<Item = u32>) -> Self {
        ConsumerSelection::Instances(instances.into_iter().collect())
    }

    pub fn none() -> Self {
        ConsumerSelection::Instances(BTreeSet::new())
    }

    /// Resolve against the instances currently available, in ascending order
    pub fn resolve(&self, available: &[u32]) -> Vec<u32> {
        let available: BTreeSet<u32> = available.iter().copied().collect();
        match self {
            ConsumerSelection::All => available.into_iter().collect(),
            ConsumerSelection::Instances(wanted) => wanted.intersection(&available).copied().collect(),
        }
    }
}

/// One zone's identity and the instances that serve it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneTopology {
    pub zone: ZoneIdentity,
    pub database_instance: u32,
    pub provider_instance: u32,
    pub consumers: ConsumerSelection,
}

impl ZoneTopology {
    /// Single-zone topology on the first instance of every role
    pub fn new(zone: ZoneIdentity) -> Self {
        Self {
            zone,
            database_instance: 1,
            provider_instance: 1,
            consumers: ConsumerSelection::All,
        }
    }

    /// Use the given database and provider instances (fluent API)
    pub fn with_instances(mut self, database_instance: u32, provider_instance: u32) -> Self {
        self.database_instance = database_instance;
        self.provider_instance = provider_instance;
        self
    }

    /// Use the given consumer selection (fluent API)
    pub fn with_consumers(mut self, consumers: ConsumerSelection) -> Self {
        self.consumers = consumers;
        self
    }

    pub fn name(&self) -> &str {
        self.zone.name()
    }
}

/// Zone key derived from the zone name
pub fn make_zone_key(zone_name: &str) -> String {
    format!("ZONE_KEY_FOR_{zone_name}")
}

/// Negotiation key shared by a pair of zones
///
/// Every zone currently shares one filler key; the names are accepted so
/// federated pairs can be given distinct keys without changing callers.
pub fn make_negotiation_key(_local_zone_name: &str, _remote_zone_name: &str) -> String {
    "_".repeat(NEGOTIATION_KEY_LEN)
}

/// Plan one topology per zone name
///
/// Zone `i` (0-based) gets database and provider instance `i + 1` and the
/// available consumers numbered `(i * per_zone, (i + 1) * per_zone]`.
pub fn plan_zones<S: AsRef<str>>(
    zone_names: &[S],
    consumers_per_zone: u32,
    available_consumers: &[u32],
) -> SetupResult<Vec<ZoneTopology>> {
    let per_zone = u64::from(consumers_per_zone);

    zone_names
        .iter()
        .enumerate()
        .map(|(i, name)| -> SetupResult<ZoneTopology> {
            let name = name.as_ref();
            let lower = i as u64 * per_zone;
            let upper = (i as u64 + 1) * per_zone;

            let consumers = ConsumerSelection::instances(
                available_consumers
                    .iter()
                    .copied()
                    .filter(|&instance| u64::from(instance) > lower && u64::from(instance) <= upper),
            );

            let zone = ZoneIdentity::new(name, make_zone_key(name), make_negotiation_key(name, ""))?;
            let instance = i as u32 + 1;

            Ok(ZoneTopology::new(zone)
                .with_instances(instance, instance)
                .with_consumers(consumers))
        })
        .collect()
}
