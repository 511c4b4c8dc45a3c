//! Zone setup coordinator
//!
//! Walks each zone through database, provider and consumer setup in that
//! order. Zones run concurrently with each other, and so do the consumers of
//! one zone once its provider is configured. A failed unit never stops its
//! siblings; every failure ends up in the zone's report.

use shared::{
    logging, zone_debug, zone_error, zone_info, zone_warn, CommandOutput, NodeCommand, NodeHandle, NodeRole,
    ZoneIdentity,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::CoordinatorConfig;
use crate::core::{
    select, BatchOutcome, ConsumerSelection, NodeOutcome, SetupFamily, SetupField, SetupInput, SetupOverrides,
    ZoneReport, ZoneState, ZoneTopology,
};
use crate::error::{NodeFailure, SetupError, SetupPhase, SetupResult};
use crate::pool::WorkerPool;
use crate::readiness::{NodeReadiness, ReadinessPoller, ReadinessReport, ReadinessSpec};
use crate::traits::{CatalogDatabase, CommandExecutor, NodeInventory, VersionSource};

struct Inner<E, I, V, D>
where
    E: CommandExecutor,
{
    executor: Arc<E>,
    inventory: I,
    versions: V,
    database: D,
    poller: ReadinessPoller<E>,
    zone_pool: WorkerPool,
    node_pool: WorkerPool,
    config: CoordinatorConfig,
}

/// Sets up zones through injected capabilities
pub struct SetupCoordinator<E, I, V, D>
where
    E: CommandExecutor + 'static,
    I: NodeInventory + 'static,
    V: VersionSource + 'static,
    D: CatalogDatabase + 'static,
{
    inner: Arc<Inner<E, I, V, D>>,
}

impl<E, I, V, D> Clone for SetupCoordinator<E, I, V, D>
where
    E: CommandExecutor + 'static,
    I: NodeInventory + 'static,
    V: VersionSource + 'static,
    D: CatalogDatabase + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E, I, V, D> SetupCoordinator<E, I, V, D>
where
    E: CommandExecutor + 'static,
    I: NodeInventory + 'static,
    V: VersionSource + 'static,
    D: CatalogDatabase + 'static,
{
    /// Create coordinator with injected dependencies
    pub fn new(executor: Arc<E>, inventory: I, versions: V, database: D, config: CoordinatorConfig) -> Self {
        let inner = Inner {
            poller: ReadinessPoller::new(Arc::clone(&executor)),
            executor,
            inventory,
            versions,
            database,
            zone_pool: WorkerPool::new(config.max_parallel_zones),
            node_pool: WorkerPool::new(config.max_parallel_nodes),
            config,
        };
        Self { inner: Arc::new(inner) }
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.inner.config
    }

    /// Set up one zone, failing with every failed node named
    pub async fn setup_zone(&self, topology: &ZoneTopology, overrides: &SetupOverrides) -> SetupResult<ZoneReport> {
        self.run_zone(topology, overrides).await.into_result()
    }

    /// Set up every zone concurrently, failing with every failed node named
    pub async fn setup_zones(
        &self,
        topologies: &[ZoneTopology],
        overrides: &SetupOverrides,
    ) -> SetupResult<BatchOutcome> {
        self.run_zones(topologies, overrides).await.into_result()
    }

    /// Set up every zone concurrently and report each one
    pub async fn run_zones(&self, topologies: &[ZoneTopology], overrides: &SetupOverrides) -> BatchOutcome {
        let run_id = Uuid::new_v4();
        logging::log_progress(
            "Setting up zones",
            &format!("{} zone(s), run {}", topologies.len(), run_id),
        );

        let this = self.clone();
        let shared_overrides = overrides.clone();
        let results = self
            .inner
            .zone_pool
            .run_all(topologies.to_vec(), move |topology| {
                let this = this.clone();
                let overrides = shared_overrides.clone();
                async move { this.run_zone(&topology, &overrides).await }
            })
            .await;

        let zones = results
            .into_iter()
            .map(|(topology, report)| report.unwrap_or_else(|| dead_zone_report(&topology)))
            .collect::<Vec<_>>();

        for report in &zones {
            if report.is_ready() {
                zone_debug!(report.zone, "zone setup completed successfully");
            } else {
                zone_error!(report.zone, "❌ zone setup failed ({} failed node(s))", report.failures().count());
            }
        }

        BatchOutcome::from_zones(run_id, zones)
    }

    /// Drive one zone through its setup states
    ///
    /// Never returns early with an error: the report says how far the zone
    /// got and which nodes failed.
    pub async fn run_zone(&self, topology: &ZoneTopology, overrides: &SetupOverrides) -> ZoneReport {
        let zone = &topology.zone;
        let mut report = ZoneReport::new(zone.name());

        zone_info!(zone.name(), "🗄️ setting up catalog database [{}]", topology.database_instance);
        let database = match self.resolve(zone, NodeRole::DatabaseServer, topology.database_instance).await {
            Ok(node) => node,
            Err(failure) => {
                report.fail(NodeRole::DatabaseServer, failure);
                return report;
            }
        };
        if let Err(failure) = self.setup_database(zone, &database).await {
            zone_error!(zone.name(), "catalog database setup failed [{}]: {}", database, failure.reason);
            report.fail(NodeRole::DatabaseServer, failure);
            return report;
        }
        report.record(NodeOutcome::succeeded(&database.name, NodeRole::DatabaseServer));
        report.transition(ZoneState::DatabaseConfigured);

        zone_info!(
            zone.name(),
            "🏗️ setting up catalog provider [{}] [{}]",
            topology.provider_instance,
            topology.database_instance
        );
        let provider = match self.resolve(zone, NodeRole::CatalogProvider, topology.provider_instance).await {
            Ok(node) => node,
            Err(failure) => {
                report.fail(NodeRole::CatalogProvider, failure);
                return report;
            }
        };
        let provider_fields = vec![
            SetupField::DatabaseServerHostname(database.hostname.clone()),
            SetupField::DatabaseServerPort(self.inner.database.server_port()),
        ];
        if let Err(failure) = self
            .configure_node(zone, &provider, NodeRole::CatalogProvider, overrides, provider_fields)
            .await
        {
            zone_error!(zone.name(), "catalog provider setup failed [{}]: {}", provider, failure.reason);
            report.fail(NodeRole::CatalogProvider, failure);
            return report;
        }
        report.record(NodeOutcome::succeeded(&provider.name, NodeRole::CatalogProvider));
        report.transition(ZoneState::ProviderConfigured);

        let instances = match self.consumer_instances(topology).await {
            Ok(instances) => instances,
            Err(e) => {
                let label = format!("{} consumers", zone.name());
                report.fail(
                    NodeRole::CatalogConsumer,
                    node_failure(zone.name(), &label, SetupPhase::NodeResolution, &e),
                );
                return report;
            }
        };
        zone_info!(
            zone.name(),
            "setting up catalog consumers [{}] {:?}",
            topology.provider_instance,
            instances
        );
        report.transition(ZoneState::ConsumersDispatched);

        let dispatched = instances.len();
        let this = self.clone();
        let zone_identity = zone.clone();
        let provider_node = provider.clone();
        let consumer_overrides = overrides.clone();
        let results = self
            .inner
            .node_pool
            .run_all(instances, move |instance| {
                let this = this.clone();
                let zone = zone_identity.clone();
                let provider = provider_node.clone();
                let overrides = consumer_overrides.clone();
                async move { this.setup_consumer(&zone, instance, &provider, &overrides).await }
            })
            .await;

        let mut failed = 0usize;
        for (instance, outcome) in results {
            let outcome = outcome.unwrap_or_else(|| {
                NodeOutcome::failed(
                    NodeRole::CatalogConsumer,
                    NodeFailure {
                        zone: zone.name().to_string(),
                        node: unresolved_label(NodeRole::CatalogConsumer, instance),
                        phase: SetupPhase::Worker,
                        exit_status: None,
                        reason: "consumer worker terminated before reporting".to_string(),
                    },
                )
            });

            match outcome.failure() {
                Some(failure) => {
                    failed += 1;
                    zone_error!(zone.name(), "exception raised while setting up [{}]: {}", failure.node, failure.reason);
                }
                None => {
                    zone_debug!(zone.name(), "setup completed successfully [{}]", outcome.node);
                }
            }
            report.record(outcome);
        }

        if failed == 0 {
            report.transition(ZoneState::Ready);
            zone_info!(zone.name(), "✅ zone ready ({} consumer(s))", dispatched);
        } else {
            zone_error!(zone.name(), "failed to set up {} of {} catalog consumer(s)", failed, dispatched);
            report.transition(ZoneState::Failed);
        }

        report
    }

    /// Poll every provider and consumer of the given zones until each answers
    ///
    /// Nodes that never converge are reported, not raised.
    pub async fn await_topology_ready(&self, topologies: &[ZoneTopology]) -> SetupResult<ReadinessReport> {
        let settings = &self.inner.config.readiness;
        let probe = NodeCommand::new(settings.probe.clone()).as_user(self.inner.config.layout.service_account.clone());

        let spec_for = |node: NodeHandle, required: u32| {
            ReadinessSpec::new(node, probe.clone())
                .with_required_successes(required)
                .with_max_retries(settings.max_retries)
                .with_delay(settings.delay)
        };

        let mut targets: Vec<(String, ReadinessSpec)> = Vec::new();
        let mut unresolved: Vec<NodeReadiness> = Vec::new();
        for topology in topologies {
            let zone = topology.name();

            match self.resolve(&topology.zone, NodeRole::CatalogProvider, topology.provider_instance).await {
                Ok(provider) => targets.push((zone.to_string(), spec_for(provider, settings.provider_successes))),
                Err(failure) => unresolved.push(unreachable_node(NodeRole::CatalogProvider, failure)),
            }

            let instances = match self.consumer_instances(topology).await {
                Ok(instances) => instances,
                Err(e) => {
                    let label = format!("{zone} consumers");
                    let failure = node_failure(zone, &label, SetupPhase::NodeResolution, &e);
                    unresolved.push(unreachable_node(NodeRole::CatalogConsumer, failure));
                    continue;
                }
            };
            for instance in instances {
                match self.resolve(&topology.zone, NodeRole::CatalogConsumer, instance).await {
                    Ok(consumer) => targets.push((zone.to_string(), spec_for(consumer, settings.consumer_successes))),
                    Err(failure) => unresolved.push(unreachable_node(NodeRole::CatalogConsumer, failure)),
                }
            }
        }
        for (_, spec) in &targets {
            spec.validate()?;
        }

        let poller = self.inner.poller.clone();
        let results = self
            .inner
            .node_pool
            .run_all(targets, move |(_, spec)| {
                let poller = poller.clone();
                async move { poller.await_ready(&spec).await }
            })
            .await;

        let nodes = results
            .into_iter()
            .map(|((zone, spec), result)| {
                let ready = match result {
                    Some(Ok(ready)) => ready,
                    Some(Err(e)) => {
                        zone_warn!(zone, "readiness check failed [{}]: {}", spec.node, e);
                        false
                    }
                    None => false,
                };
                if !ready {
                    zone_warn!(zone, "[{}] did not become ready", spec.node);
                }
                NodeReadiness {
                    zone,
                    node: spec.node.name.clone(),
                    role: spec.node.role,
                    ready,
                }
            })
            .chain(unresolved)
            .collect();

        Ok(ReadinessReport { nodes })
    }

    async fn resolve(&self, zone: &ZoneIdentity, role: NodeRole, instance: u32) -> Result<NodeHandle, NodeFailure> {
        self.inner
            .inventory
            .resolve(role, instance)
            .await
            .map_err(|e| node_failure(zone.name(), &unresolved_label(role, instance), SetupPhase::NodeResolution, &e))
    }

    async fn consumer_instances(&self, topology: &ZoneTopology) -> SetupResult<Vec<u32>> {
        if let ConsumerSelection::Instances(wanted) = &topology.consumers {
            if wanted.is_empty() {
                zone_warn!(topology.name(), "empty list of catalog consumers to set up");
                return Ok(Vec::new());
            }
        }
        let available = self.inner.inventory.available_instances(NodeRole::CatalogConsumer).await?;
        Ok(topology.consumers.resolve(&available))
    }

    async fn setup_database(&self, zone: &ZoneIdentity, node: &NodeHandle) -> Result<(), NodeFailure> {
        self.inner
            .database
            .setup_catalog(node)
            .await
            .and_then(|output| require_success(node, SetupPhase::CatalogDatabase, output))
            .map(|_| ())
            .map_err(|e| node_failure(zone.name(), &node.name, SetupPhase::CatalogDatabase, &e))
    }

    async fn setup_consumer(
        &self,
        zone: &ZoneIdentity,
        instance: u32,
        provider: &NodeHandle,
        overrides: &SetupOverrides,
    ) -> NodeOutcome {
        let node = match self.resolve(zone, NodeRole::CatalogConsumer, instance).await {
            Ok(node) => node,
            Err(failure) => return NodeOutcome::failed(NodeRole::CatalogConsumer, failure),
        };

        let fields = vec![SetupField::CatalogServiceProviderHost(provider.hostname.clone())];
        match self
            .configure_node(zone, &node, NodeRole::CatalogConsumer, overrides, fields)
            .await
        {
            Ok(()) => NodeOutcome::succeeded(&node.name, NodeRole::CatalogConsumer),
            Err(failure) => NodeOutcome::failed(NodeRole::CatalogConsumer, failure),
        }
    }

    /// Build this node's setup input and run the setup sequence with it
    ///
    /// Caller overrides go on first; zone identity and topology-derived
    /// fields are applied after them and win.
    async fn configure_node(
        &self,
        zone: &ZoneIdentity,
        node: &NodeHandle,
        role: NodeRole,
        overrides: &SetupOverrides,
        derived: Vec<SetupField>,
    ) -> Result<(), NodeFailure> {
        let fail = |phase: SetupPhase, e: SetupError| node_failure(zone.name(), &node.name, phase, &e);

        let version = self
            .inner
            .versions
            .server_version(node)
            .await
            .map_err(|e| fail(SetupPhase::VersionDiscovery, e))?;

        let mut builder = select(version).map_err(|e| fail(SetupPhase::BuildSetupInput, e))?;
        builder.apply(overrides).set_zone(zone).set_role(role);
        for field in derived {
            builder.set(field);
        }
        let input = builder.render().map_err(|e| fail(SetupPhase::BuildSetupInput, e))?;

        zone_info!(zone.name(), "setting up catalog {} [{}] (server {})", role, node, version);
        zone_debug!(zone.name(), "setup input for [{}] has {} line(s)", node, input.lines().len());

        self.dispatch(zone, node, builder.family(), &input).await
    }

    /// Stop, feed the setup script, and restart
    async fn dispatch(
        &self,
        zone: &ZoneIdentity,
        node: &NodeHandle,
        family: SetupFamily,
        input: &SetupInput,
    ) -> Result<(), NodeFailure> {
        let layout = &self.inner.config.layout;
        let control = layout.control_script();

        // the server may not be running yet
        let stop = NodeCommand::new(format!("{control} stop")).as_user(layout.service_account.clone());
        match self.inner.executor.run(node, &stop).await {
            Ok(output) if output.is_success() => {}
            Ok(output) => {
                zone_debug!(zone.name(), "failed to stop server before setup [{}] ({})", node, output.exit_status);
            }
            Err(e) => {
                zone_debug!(zone.name(), "failed to stop server before setup [{}]: {}", node, e);
            }
        }

        let write = NodeCommand::new(write_input_command(&layout.input_path, input));
        self.run_step(zone, node, SetupPhase::WriteSetupInput, &write).await?;

        let setup = NodeCommand::new(format!(
            "{} {} < {}",
            family.interpreter(),
            layout.setup_script(),
            layout.input_path
        ));
        self.run_step(zone, node, SetupPhase::RunSetupScript, &setup).await?;

        let restart = NodeCommand::new(format!("{control} restart")).as_user(layout.service_account.clone());
        self.run_step(zone, node, SetupPhase::RestartService, &restart).await
    }

    async fn run_step(
        &self,
        zone: &ZoneIdentity,
        node: &NodeHandle,
        phase: SetupPhase,
        command: &NodeCommand,
    ) -> Result<(), NodeFailure> {
        self.inner
            .executor
            .run(node, command)
            .await
            .and_then(|output| require_success(node, phase, output))
            .map(|_| ())
            .map_err(|e| node_failure(zone.name(), &node.name, phase, &e))
    }
}

fn require_success(node: &NodeHandle, phase: SetupPhase, output: CommandOutput) -> SetupResult<CommandOutput> {
    if output.is_success() {
        return Ok(output);
    }
    Err(SetupError::NodeSetupFailed {
        node: node.name.clone(),
        phase,
        exit_status: output.exit_status,
    })
}

fn node_failure(zone: &str, node: &str, phase: SetupPhase, error: &SetupError) -> NodeFailure {
    NodeFailure {
        zone: zone.to_string(),
        node: node.to_string(),
        phase,
        exit_status: error.exit_status(),
        reason: error.to_string(),
    }
}

/// Readiness entry for a node that could not be resolved, never polled
fn unreachable_node(role: NodeRole, failure: NodeFailure) -> NodeReadiness {
    zone_warn!(failure.zone, "[{}] cannot be checked for readiness: {}", failure.node, failure.reason);
    NodeReadiness {
        zone: failure.zone,
        node: failure.node,
        role,
        ready: false,
    }
}

/// Report for a zone whose worker died before reporting
///
/// The failure names the zone, not any one of its nodes.
fn dead_zone_report(topology: &ZoneTopology) -> ZoneReport {
    let mut report = ZoneReport::new(topology.name());
    report.fail(
        NodeRole::DatabaseServer,
        NodeFailure {
            zone: topology.name().to_string(),
            node: format!("{} zone", topology.name()),
            phase: SetupPhase::Worker,
            exit_status: None,
            reason: "zone worker terminated before reporting".to_string(),
        },
    );
    report
}

/// Label for a node that could not be resolved
fn unresolved_label(role: NodeRole, instance: u32) -> String {
    format!("{role} #{instance}")
}

/// Shell command writing the setup input verbatim, newline-terminated
pub(crate) fn write_input_command(path: &str, input: &SetupInput) -> String {
    format!("printf '%s\\n' {} > {}", shell_quote(&input.to_text()), path)
}

/// Single-quote `value` for `sh`
pub(crate) fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}
