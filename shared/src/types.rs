//! Core types used throughout the zone setup system

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{SharedError, SharedResult};

/// Exact size of a server negotiation key
pub const NEGOTIATION_KEY_LEN: usize = 32;

/// Role a node plays inside a zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeRole {
    /// Hosts the catalog database
    DatabaseServer,
    /// Holds the catalog connection for the zone
    CatalogProvider,
    /// Joins the zone through the provider
    CatalogConsumer,
}

impl NodeRole {
    /// Compose service name used for nodes of this role
    pub fn service_name(&self) -> &'static str {
        match self {
            NodeRole::DatabaseServer => "irods-catalog",
            NodeRole::CatalogProvider => "irods-catalog-provider",
            NodeRole::CatalogConsumer => "irods-catalog-consumer",
        }
    }
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeRole::DatabaseServer => write!(f, "database"),
            NodeRole::CatalogProvider => write!(f, "provider"),
            NodeRole::CatalogConsumer => write!(f, "consumer"),
        }
    }
}

impl std::str::FromStr for NodeRole {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "database" | "catalog" => Ok(NodeRole::DatabaseServer),
            "provider" => Ok(NodeRole::CatalogProvider),
            "consumer" => Ok(NodeRole::CatalogConsumer),
            _ => Err(SharedError::UnknownRole { input: s.to_string() }),
        }
    }
}

/// Resolved reference to a runtime endpoint
///
/// Owned by whoever resolved it; the coordinator only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeHandle {
    /// Logical name (container name for compose deployments)
    pub name: String,
    /// Network-resolvable hostname
    pub hostname: String,
    pub role: NodeRole,
    /// 1-based index within the role group
    pub instance: u32,
}

impl NodeHandle {
    pub fn new(name: impl Into<String>, hostname: impl Into<String>, role: NodeRole, instance: u32) -> Self {
        Self {
            name: name.into(),
            hostname: hostname.into(),
            role,
            instance,
        }
    }
}

impl fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Name and shared secrets of a zone
#[derive(Clone, PartialEq, Eq)]
pub struct ZoneIdentity {
    name: String,
    zone_key: String,
    negotiation_key: String,
}

impl ZoneIdentity {
    /// Validate and build a zone identity
    pub fn new(
        name: impl Into<String>,
        zone_key: impl Into<String>,
        negotiation_key: impl Into<String>,
    ) -> SharedResult<Self> {
        let name = name.into();
        let zone_key = zone_key.into();
        let negotiation_key = negotiation_key.into();

        if name.is_empty() {
            return Err(SharedError::InvalidZoneIdentity {
                field: "zone_name".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if zone_key.is_empty() {
            return Err(SharedError::InvalidZoneIdentity {
                field: "zone_key".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if negotiation_key.len() != NEGOTIATION_KEY_LEN {
            return Err(SharedError::InvalidZoneIdentity {
                field: "negotiation_key".to_string(),
                reason: format!(
                    "must be exactly {NEGOTIATION_KEY_LEN} bytes, got {}",
                    negotiation_key.len()
                ),
            });
        }

        Ok(Self {
            name,
            zone_key,
            negotiation_key,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn zone_key(&self) -> &str {
        &self.zone_key
    }

    pub fn negotiation_key(&self) -> &str {
        &self.negotiation_key
    }
}

impl Default for ZoneIdentity {
    fn default() -> Self {
        Self {
            name: "tempZone".to_string(),
            zone_key: "TEMPORARY_ZONE_KEY".to_string(),
            negotiation_key: "32_byte_server_negotiation_key__".to_string(),
        }
    }
}

// Keys stay out of logs
impl fmt::Debug for ZoneIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZoneIdentity")
            .field("name", &self.name)
            .field("zone_key", &"<redacted>")
            .field("negotiation_key", &"<redacted>")
            .finish()
    }
}

/// Deployed server version triple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SoftwareVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl SoftwareVersion {
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self { major, minor, patch }
    }
}

impl fmt::Display for SoftwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl std::str::FromStr for SoftwareVersion {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SharedError::InvalidVersion { input: s.to_string() };

        let mut parts = s.trim().split('.');
        let mut next = || -> SharedResult<u32> {
            parts
                .next()
                .ok_or_else(invalid)?
                .parse::<u32>()
                .map_err(|_| invalid())
        };

        let version = SoftwareVersion::new(next()?, next()?, next()?);
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(version)
    }
}

/// Command to run on a node, optionally as a specific account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeCommand {
    pub command: String,
    pub user: Option<String>,
}

impl NodeCommand {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            user: None,
        }
    }

    /// Run as the given account instead of the node's default (fluent API)
    pub fn as_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }
}

/// Captured result of a command run on a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutput {
    pub exit_status: i32,
    pub output: String,
}

impl CommandOutput {
    pub fn new(exit_status: i32, output: impl Into<String>) -> Self {
        Self {
            exit_status,
            output: output.into(),
        }
    }

    pub fn success() -> Self {
        Self::new(0, "")
    }

    pub fn failure(exit_status: i32) -> Self {
        Self::new(exit_status, "")
    }

    pub fn is_success(&self) -> bool {
        self.exit_status == 0
    }
}
