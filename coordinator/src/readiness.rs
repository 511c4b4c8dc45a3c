//! Readiness polling
//!
//! Probes a node until a command succeeds a required number of times in a
//! row, or until the retry budget runs out. Not converging is a normal
//! outcome reported as `false`, never an error.

use serde::{Deserialize, Serialize};
use shared::{NodeCommand, NodeHandle, NodeRole};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{SetupError, SetupResult};
use crate::traits::CommandExecutor;

/// What to probe and how patiently
#[derive(Debug, Clone)]
pub struct ReadinessSpec {
    pub node: NodeHandle,
    pub probe: NodeCommand,
    /// Must be at least 1
    pub required_consecutive_successes: u32,
    /// Failed probes tolerated before giving up
    pub max_retries: u32,
    /// Pause between probes
    pub delay: Duration,
}

impl ReadinessSpec {
    pub fn new(node: NodeHandle, probe: NodeCommand) -> Self {
        Self {
            node,
            probe,
            required_consecutive_successes: 1,
            max_retries: 0,
            delay: Duration::ZERO,
        }
    }

    pub fn with_required_successes(mut self, required: u32) -> Self {
        self.required_consecutive_successes = required;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn validate(&self) -> SetupResult<()> {
        if self.required_consecutive_successes == 0 {
            return Err(SetupError::invalid_argument(
                "required_consecutive_successes",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Runs readiness probes through the execution capability
pub struct ReadinessPoller<E: CommandExecutor> {
    executor: Arc<E>,
}

impl<E: CommandExecutor> Clone for ReadinessPoller<E> {
    fn clone(&self) -> Self {
        Self {
            executor: Arc::clone(&self.executor),
        }
    }
}

impl<E: CommandExecutor> ReadinessPoller<E> {
    pub fn new(executor: Arc<E>) -> Self {
        Self { executor }
    }

    /// Probe until `required_consecutive_successes` in a row, or until more
    /// than `max_retries` probes have failed
    ///
    /// Any failure resets the streak to zero. Successes never consume the
    /// retry budget, so the loop ends after at most
    /// `(max_retries + 1) * required_consecutive_successes` probes.
    pub async fn await_ready(&self, spec: &ReadinessSpec) -> SetupResult<bool> {
        spec.validate()?;

        let mut streak = 0u32;
        let mut retries = 0u32;
        let mut attempts = 0u32;

        loop {
            attempts += 1;

            let succeeded = match self.executor.run(&spec.node, &spec.probe).await {
                Ok(output) => output.is_success(),
                Err(e) => {
                    tracing::debug!(node = %spec.node, error = %e, "readiness probe could not run");
                    false
                }
            };

            if succeeded {
                streak += 1;
                if streak >= spec.required_consecutive_successes {
                    tracing::debug!(node = %spec.node, attempts, "node is ready");
                    return Ok(true);
                }
            } else {
                streak = 0;
                if retries >= spec.max_retries {
                    tracing::debug!(node = %spec.node, attempts, "node did not become ready");
                    return Ok(false);
                }
                retries += 1;
                tracing::debug!(node = %spec.node, retries, "node is not ready, sleeping");
            }

            if !spec.delay.is_zero() {
                tokio::time::sleep(spec.delay).await;
            }
        }
    }
}

/// Readiness of one node after polling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeReadiness {
    pub zone: String,
    pub node: String,
    pub role: NodeRole,
    pub ready: bool,
}

/// Readiness of every node in a set of zones
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadinessReport {
    pub nodes: Vec<NodeReadiness>,
}

impl ReadinessReport {
    pub fn all_ready(&self) -> bool {
        self.nodes.iter().all(|n| n.ready)
    }

    pub fn not_ready(&self) -> Vec<&str> {
        self.nodes
            .iter()
            .filter(|n| !n.ready)
            .map(|n| n.node.as_str())
            .collect()
    }
}
