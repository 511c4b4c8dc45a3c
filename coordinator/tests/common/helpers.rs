//! Fakes and builder for coordinator tests

use async_trait::async_trait;
use coordinator::traits::MockCatalogDatabase;
use coordinator::{
    CommandExecutor, CoordinatorConfig, NodeInventory, ReadinessSettings, SetupCoordinator, SetupError, SetupResult,
    VersionSource,
};
use shared::{CommandOutput, NodeCommand, NodeHandle, NodeRole, SoftwareVersion};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::fixtures::TestFixtures;

pub type TestCoordinator = SetupCoordinator<FakeExecutor, FakeInventory, FakeVersions, MockCatalogDatabase>;

/// Records every command and fails the ones matching a configured rule
#[derive(Default)]
pub struct FakeExecutor {
    calls: Mutex<Vec<(String, NodeCommand)>>,
    failures: Vec<(String, String, i32)>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands on `node` containing `pattern` exit with `exit_status`
    pub fn failing_on(mut self, node: impl Into<String>, pattern: impl Into<String>, exit_status: i32) -> Self {
        self.failures.push((node.into(), pattern.into(), exit_status));
        self
    }

    pub fn calls(&self) -> Vec<(String, NodeCommand)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn commands_for(&self, node: &str) -> Vec<NodeCommand> {
        self.calls()
            .into_iter()
            .filter(|(name, _)| name == node)
            .map(|(_, command)| command)
            .collect()
    }

    pub fn count_for(&self, node: &str, pattern: &str) -> usize {
        self.commands_for(node)
            .iter()
            .filter(|c| c.command.contains(pattern))
            .count()
    }
}

#[async_trait]
impl CommandExecutor for FakeExecutor {
    async fn run(&self, node: &NodeHandle, command: &NodeCommand) -> SetupResult<CommandOutput> {
        self.calls.lock().unwrap().push((node.name.clone(), command.clone()));

        let failure = self
            .failures
            .iter()
            .find(|(name, pattern, _)| *name == node.name && command.command.contains(pattern.as_str()));
        Ok(match failure {
            Some((_, _, exit_status)) => CommandOutput::failure(*exit_status),
            None => CommandOutput::success(),
        })
    }
}

/// Inventory over a fixed set of running consumers
pub struct FakeInventory {
    consumers: Vec<u32>,
    unresolvable: HashSet<(NodeRole, u32)>,
    listings: Arc<AtomicUsize>,
}

impl FakeInventory {
    pub fn new(consumers: impl IntoIterator<Item = u32>) -> Self {
        Self {
            consumers: consumers.into_iter().collect(),
            unresolvable: HashSet::new(),
            listings: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn unresolvable(mut self, role: NodeRole, instance: u32) -> Self {
        self.unresolvable.insert((role, instance));
        self
    }

    /// Counts how many times consumers get listed
    pub fn listing_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.listings)
    }
}

#[async_trait]
impl NodeInventory for FakeInventory {
    async fn resolve(&self, role: NodeRole, instance: u32) -> SetupResult<NodeHandle> {
        if self.unresolvable.contains(&(role, instance)) {
            return Err(SetupError::inventory(format!("no container for {role} {instance}")));
        }
        Ok(NodeHandle::new(
            TestFixtures::node_name(role, instance),
            TestFixtures::hostname(role, instance),
            role,
            instance,
        ))
    }

    async fn available_instances(&self, _role: NodeRole) -> SetupResult<Vec<u32>> {
        self.listings.fetch_add(1, Ordering::SeqCst);
        Ok(self.consumers.clone())
    }
}

/// Every node runs `default` unless told otherwise
pub struct FakeVersions {
    default: SoftwareVersion,
    per_node: HashMap<String, SoftwareVersion>,
}

impl FakeVersions {
    pub fn new(default: SoftwareVersion) -> Self {
        Self {
            default,
            per_node: HashMap::new(),
        }
    }

    pub fn with_node(mut self, node: impl Into<String>, version: SoftwareVersion) -> Self {
        self.per_node.insert(node.into(), version);
        self
    }
}

#[async_trait]
impl VersionSource for FakeVersions {
    async fn server_version(&self, node: &NodeHandle) -> SetupResult<SoftwareVersion> {
        Ok(self.per_node.get(&node.name).copied().unwrap_or(self.default))
    }
}

/// Database whose setup always succeeds
pub fn healthy_database() -> MockCatalogDatabase {
    let mut database = MockCatalogDatabase::new();
    database.expect_server_port().return_const(TestFixtures::DB_PORT);
    database
        .expect_setup_catalog()
        .returning(|_| Ok(CommandOutput::success()));
    database
}

/// Builder for coordinators over fakes, defaulting to a healthy 4.2 deployment
pub struct CoordinatorBuilder {
    executor: Arc<FakeExecutor>,
    inventory: FakeInventory,
    versions: FakeVersions,
    database: MockCatalogDatabase,
    config: CoordinatorConfig,
}

impl CoordinatorBuilder {
    pub fn new() -> Self {
        Self {
            executor: Arc::new(FakeExecutor::new()),
            inventory: FakeInventory::new(Vec::new()),
            versions: FakeVersions::new(SoftwareVersion::new(4, 2, 11)),
            database: healthy_database(),
            config: CoordinatorConfig::default()
                .with_workers(4, 4)
                .with_readiness(ReadinessSettings {
                    max_retries: 2,
                    delay: Duration::ZERO,
                    ..ReadinessSettings::default()
                }),
        }
    }

    pub fn with_executor(mut self, executor: FakeExecutor) -> Self {
        self.executor = Arc::new(executor);
        self
    }

    pub fn with_inventory(mut self, inventory: FakeInventory) -> Self {
        self.inventory = inventory;
        self
    }

    pub fn with_versions(mut self, versions: FakeVersions) -> Self {
        self.versions = versions;
        self
    }

    pub fn with_database(mut self, database: MockCatalogDatabase) -> Self {
        self.database = database;
        self
    }

    pub fn with_config(mut self, config: CoordinatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the coordinator, keeping a handle on the executor for assertions
    pub fn build(self) -> (TestCoordinator, Arc<FakeExecutor>) {
        let executor = Arc::clone(&self.executor);
        let coordinator = SetupCoordinator::new(self.executor, self.inventory, self.versions, self.database, self.config);
        (coordinator, executor)
    }
}
