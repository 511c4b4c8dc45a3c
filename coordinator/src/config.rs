//! Coordinator configuration

use std::time::Duration;

/// Where the server keeps its tooling on every node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerLayout {
    /// Server home directory
    pub home: String,
    /// Account that owns and runs the server
    pub service_account: String,
    /// File the setup script reads its answers from
    pub input_path: String,
}

impl Default for ServerLayout {
    fn default() -> Self {
        Self {
            home: "/var/lib/irods".to_string(),
            service_account: "irods".to_string(),
            input_path: "/input".to_string(),
        }
    }
}

impl ServerLayout {
    pub fn control_script(&self) -> String {
        format!("{}/irodsctl", self.home)
    }

    pub fn setup_script(&self) -> String {
        format!("{}/scripts/setup_irods.py", self.home)
    }

    pub fn version_file(&self) -> String {
        format!("{}/version.json", self.home)
    }
}

/// How long to wait for servers to start answering after setup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadinessSettings {
    /// Probe run as the service account
    pub probe: String,
    pub provider_successes: u32,
    pub consumer_successes: u32,
    pub max_retries: u32,
    pub delay: Duration,
}

impl Default for ReadinessSettings {
    fn default() -> Self {
        Self {
            probe: "ils".to_string(),
            provider_successes: 5,
            consumer_successes: 1,
            max_retries: 10,
            delay: Duration::from_secs(1),
        }
    }
}

/// Everything the coordinator needs besides its capabilities
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Zones set up at the same time
    pub max_parallel_zones: usize,
    /// Consumer nodes set up at the same time, across all zones
    pub max_parallel_nodes: usize,
    pub layout: ServerLayout,
    pub readiness: ReadinessSettings,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        let workers = default_worker_count();
        Self {
            max_parallel_zones: workers,
            max_parallel_nodes: workers,
            layout: ServerLayout::default(),
            readiness: ReadinessSettings::default(),
        }
    }
}

impl CoordinatorConfig {
    /// Set both worker limits (fluent API)
    pub fn with_workers(mut self, zones: usize, nodes: usize) -> Self {
        self.max_parallel_zones = zones;
        self.max_parallel_nodes = nodes;
        self
    }

    /// Set readiness settings (fluent API)
    pub fn with_readiness(mut self, readiness: ReadinessSettings) -> Self {
        self.readiness = readiness;
        self
    }
}

/// Available cores plus four, capped at 32
pub fn default_worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get() + 4)
        .unwrap_or(8)
        .min(32)
}
