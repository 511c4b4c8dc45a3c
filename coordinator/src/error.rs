//! Coordinator error types

use serde::{Deserialize, Serialize};
use shared::{NodeRole, SharedError, SoftwareVersion};
use std::fmt;
use thiserror::Error;

/// Named step of node setup, reported alongside every failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SetupPhase {
    CatalogDatabase,
    NodeResolution,
    VersionDiscovery,
    BuildSetupInput,
    WriteSetupInput,
    RunSetupScript,
    RestartService,
    Worker,
}

impl fmt::Display for SetupPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SetupPhase::CatalogDatabase => "catalog database setup",
            SetupPhase::NodeResolution => "node resolution",
            SetupPhase::VersionDiscovery => "version discovery",
            SetupPhase::BuildSetupInput => "setup input build",
            SetupPhase::WriteSetupInput => "setup input write",
            SetupPhase::RunSetupScript => "setup script",
            SetupPhase::RestartService => "service restart",
            SetupPhase::Worker => "worker",
        };
        f.write_str(name)
    }
}

/// One failed node, with enough context to re-run setup for just that node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeFailure {
    pub zone: String,
    pub node: String,
    pub phase: SetupPhase,
    pub exit_status: Option<i32>,
    pub reason: String,
}

impl fmt::Display for NodeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} failed during {}: {}", self.zone, self.node, self.phase, self.reason)
    }
}

#[derive(Error, Debug)]
pub enum SetupError {
    #[error("Unsupported server version: {version}")]
    UnsupportedVersion { version: SoftwareVersion },

    #[error("Unsupported role for setup input: {}", role.map(|r| r.to_string()).unwrap_or_else(|| "<unset>".to_string()))]
    UnsupportedRole { role: Option<NodeRole> },

    #[error("Invalid argument {field}: {reason}")]
    InvalidArgument { field: String, reason: String },

    #[error("{phase} failed on {node} with exit status {exit_status}")]
    NodeSetupFailed { node: String, phase: SetupPhase, exit_status: i32 },

    #[error("Setup failed on {} node(s): {}", failures.len(), summarize(failures))]
    AggregateSetupFailed { failures: Vec<NodeFailure> },

    #[error("Failed to execute command on {node}: {message}")]
    Execution { node: String, message: String },

    #[error("Node inventory error: {message}")]
    Inventory { message: String },

    #[error("Version discovery failed on {node}: {message}")]
    VersionDiscovery { node: String, message: String },

    #[error("Shared component error: {0}")]
    Shared(#[from] SharedError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

fn summarize(failures: &[NodeFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{} ({})", f.node, f.phase))
        .collect::<Vec<_>>()
        .join(", ")
}

impl SetupError {
    pub fn invalid_argument(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn execution(node: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Execution {
            node: node.into(),
            message: message.into(),
        }
    }

    pub fn inventory(message: impl Into<String>) -> Self {
        Self::Inventory {
            message: message.into(),
        }
    }

    /// Exit status carried by the error, if it came from a node command
    pub fn exit_status(&self) -> Option<i32> {
        match self {
            SetupError::NodeSetupFailed { exit_status, .. } => Some(*exit_status),
            _ => None,
        }
    }

    /// Failures named by this error, flattening aggregates
    pub fn failures(&self) -> &[NodeFailure] {
        match self {
            SetupError::AggregateSetupFailed { failures } => failures,
            _ => &[],
        }
    }
}

pub type SetupResult<T> = Result<T, SetupError>;
