//! Main entry point for the zone setup binary
//!
//! Sets up every zone of a running compose project: catalog databases,
//! providers and consumers, then waits for the servers to answer.

use anyhow::Context;
use clap::Parser;
use shared::{logging, NodeRole};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use coordinator::services::{CatalogSettings, ComposeInventory, DockerExecutor, PostgresCatalog, ServerVersionSource};
use coordinator::traits::NodeInventory;
use coordinator::{plan_zones, CoordinatorConfig, ReadinessSettings, ServerLayout, SetupCoordinator, SetupOverrides};

/// Configure catalog zones in a running compose project
#[derive(Parser)]
#[command(name = "zone-setup")]
#[command(about = "Sets up catalog databases, providers and consumers for one or more zones")]
pub struct Args {
    /// Compose project name (falls back to COMPOSE_PROJECT_NAME)
    #[arg(long)]
    pub project: Option<String>,

    /// Zone to set up; repeat for several zones
    #[arg(long = "zone-name", default_value = "tempZone")]
    pub zone_names: Vec<String>,

    /// Consumers assigned to each zone
    #[arg(long, default_value = "0")]
    pub consumers_per_zone: u32,

    /// Maximum zones and nodes set up at once (defaults to cores + 4, max 32)
    #[arg(long)]
    pub workers: Option<usize>,

    /// Server home directory on every node
    #[arg(long, default_value = "/var/lib/irods")]
    pub home: String,

    /// Drop and recreate existing catalogs
    #[arg(long)]
    pub force_recreate: bool,

    /// Failed probes tolerated per node while waiting for readiness
    #[arg(long, default_value = "10")]
    pub readiness_retries: u32,

    /// Seconds between readiness probes
    #[arg(long, default_value = "1")]
    pub readiness_delay: u64,

    /// Skip waiting for servers to answer after setup
    #[arg(long)]
    pub no_wait: bool,

    /// Write the setup report as JSON to this file
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    logging::init_tracing_with_level(Some(&args.log_level));
    logging::log_startup("zone setup");

    let project = args
        .project
        .clone()
        .or_else(|| std::env::var("COMPOSE_PROJECT_NAME").ok())
        .context("no compose project given (use --project or COMPOSE_PROJECT_NAME)")?;

    let delay = Duration::from_secs(args.readiness_delay);
    let mut config = CoordinatorConfig::default().with_readiness(ReadinessSettings {
        max_retries: args.readiness_retries,
        delay,
        ..ReadinessSettings::default()
    });
    if let Some(workers) = args.workers {
        config = config.with_workers(workers, workers);
    }
    config.layout = ServerLayout {
        home: args.home.clone(),
        ..ServerLayout::default()
    };

    let executor = Arc::new(DockerExecutor::new());
    let inventory = ComposeInventory::new(project.clone());
    let available = inventory
        .available_instances(NodeRole::CatalogConsumer)
        .await
        .with_context(|| format!("listing consumers of project {project}"))?;

    let topologies = plan_zones(&args.zone_names, args.consumers_per_zone, &available)?;
    tracing::debug!(project = %project, zones = topologies.len(), consumers = available.len(), "planned zones");

    let versions = ServerVersionSource::new(Arc::clone(&executor), &config.layout);
    let database = PostgresCatalog::new(
        Arc::clone(&executor),
        CatalogSettings {
            force_recreate: args.force_recreate,
            max_retries: args.readiness_retries,
            delay,
            ..CatalogSettings::default()
        },
    );
    let coordinator = SetupCoordinator::new(executor, inventory, versions, database, config);

    let outcome = coordinator.run_zones(&topologies, &SetupOverrides::default()).await;
    if let Some(path) = &args.report {
        let report = serde_json::to_string_pretty(&outcome)?;
        tokio::fs::write(path, report)
            .await
            .with_context(|| format!("writing report to {}", path.display()))?;
    }

    if let Err(e) = outcome.into_result() {
        logging::log_error("Zone setup", &e);
        return Err(e.into());
    }

    if !args.no_wait {
        let readiness = coordinator.await_topology_ready(&topologies).await?;
        if !readiness.all_ready() {
            anyhow::bail!("servers did not become ready: {}", readiness.not_ready().join(", "));
        }
    }

    logging::log_success(&format!("{} zone(s) set up", topologies.len()));
    Ok(())
}
