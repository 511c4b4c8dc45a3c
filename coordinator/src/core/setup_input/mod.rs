//! Setup script input builders
//!
//! The external setup script reads its answers positionally from stdin, so
//! every supported server family renders a fixed sequence of lines. A builder
//! is selected once from the node's reported version, accumulates values on
//! top of documented defaults, and renders for the role it was given.

mod v4_2;
mod v4_3;

use shared::{NodeRole, SoftwareVersion, ZoneIdentity};
use std::fmt;
use std::ops::RangeInclusive;

use crate::error::{SetupError, SetupResult};

/// Only one major server version is supported
pub const SUPPORTED_MAJOR: u32 = 4;

/// Supported minor versions of [`SUPPORTED_MAJOR`]
pub const SUPPORTED_MINORS: RangeInclusive<u32> = 2..=3;

/// Server family whose setup script prompts share one answer layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SetupFamily {
    V4_2,
    V4_3,
}

impl SetupFamily {
    /// Map a reported version onto its family
    pub fn for_version(version: SoftwareVersion) -> SetupResult<Self> {
        if version.major != SUPPORTED_MAJOR || !SUPPORTED_MINORS.contains(&version.minor) {
            return Err(SetupError::UnsupportedVersion { version });
        }

        match version.minor {
            2 => Ok(SetupFamily::V4_2),
            3 => Ok(SetupFamily::V4_3),
            _ => Err(SetupError::UnsupportedVersion { version }),
        }
    }

    /// Interpreter used to run this family's setup script
    pub fn interpreter(&self) -> &'static str {
        match self {
            SetupFamily::V4_2 => v4_2::INTERPRETER,
            SetupFamily::V4_3 => v4_3::INTERPRETER,
        }
    }

    fn render(&self, role: NodeRole, values: &SetupValues) -> SetupResult<Vec<String>> {
        let lines = match (self, role) {
            (SetupFamily::V4_2, NodeRole::CatalogProvider) => v4_2::render_provider(values),
            (SetupFamily::V4_2, NodeRole::CatalogConsumer) => v4_2::render_consumer(values),
            (SetupFamily::V4_3, NodeRole::CatalogProvider) => v4_3::render_provider(values),
            (SetupFamily::V4_3, NodeRole::CatalogConsumer) => v4_3::render_consumer(values),
            (_, NodeRole::DatabaseServer) => {
                return Err(SetupError::UnsupportedRole { role: Some(role) });
            }
        };
        Ok(lines)
    }
}

/// Select the builder for a node's reported version
///
/// The version is checked before anything is accumulated.
pub fn select(version: SoftwareVersion) -> SetupResult<SetupInputBuilder> {
    let family = SetupFamily::for_version(version)?;
    Ok(SetupInputBuilder::new(family))
}

/// Every answer the setup script asks for
///
/// Defaults match a stock single-zone deployment, so a builder holding only
/// defaults still renders valid input.
#[derive(Clone, PartialEq, Eq)]
pub struct SetupValues {
    /// Linux account that runs the server (blank accepts the script default)
    pub service_account_name: String,
    pub service_account_group: String,

    /// Driver used to reach the catalog database
    pub odbc_driver: String,
    pub database_server_hostname: String,
    pub database_server_port: u16,
    pub database_name: String,
    pub database_username: String,
    pub database_password: String,
    /// Obfuscates passwords stored in the catalog
    pub stored_passwords_salt: String,

    pub zone_name: String,
    /// Provider a consumer attaches to; ignored for providers
    pub catalog_service_provider_host: String,
    pub zone_port: u16,
    pub parallel_port_range_begin: u16,
    pub parallel_port_range_end: u16,
    pub control_plane_port: u16,
    /// Location of configuration schemas (4.2 only)
    pub schema_validation_base_uri: String,
    pub admin_username: String,

    pub zone_key: String,
    /// Must be exactly 32 bytes
    pub negotiation_key: String,
    pub control_plane_key: String,
    pub admin_password: String,

    /// Name of the resource created during setup (4.3 only)
    pub default_resource_name: String,
    /// Storage path of the default resource
    pub vault_directory: String,
}

impl Default for SetupValues {
    fn default() -> Self {
        Self {
            service_account_name: String::new(),
            service_account_group: String::new(),
            odbc_driver: String::new(),
            database_server_hostname: "localhost".to_string(),
            database_server_port: 5432,
            database_name: "ICAT".to_string(),
            database_username: "irods".to_string(),
            database_password: "testpassword".to_string(),
            stored_passwords_salt: String::new(),
            zone_name: "tempZone".to_string(),
            catalog_service_provider_host: "localhost".to_string(),
            zone_port: 1247,
            parallel_port_range_begin: 20000,
            parallel_port_range_end: 20199,
            control_plane_port: 1248,
            schema_validation_base_uri: String::new(),
            admin_username: "rods".to_string(),
            zone_key: "TEMPORARY_ZONE_KEY".to_string(),
            negotiation_key: "32_byte_server_negotiation_key__".to_string(),
            control_plane_key: "32_byte_server_control_plane_key".to_string(),
            admin_password: "rods".to_string(),
            default_resource_name: String::new(),
            vault_directory: String::new(),
        }
    }
}

impl SetupValues {
    /// Overwrite a single value
    pub fn set(&mut self, field: SetupField) {
        match field {
            SetupField::ServiceAccountName(v) => self.service_account_name = v,
            SetupField::ServiceAccountGroup(v) => self.service_account_group = v,
            SetupField::OdbcDriver(v) => self.odbc_driver = v,
            SetupField::DatabaseServerHostname(v) => self.database_server_hostname = v,
            SetupField::DatabaseServerPort(v) => self.database_server_port = v,
            SetupField::DatabaseName(v) => self.database_name = v,
            SetupField::DatabaseUsername(v) => self.database_username = v,
            SetupField::DatabasePassword(v) => self.database_password = v,
            SetupField::StoredPasswordsSalt(v) => self.stored_passwords_salt = v,
            SetupField::ZoneName(v) => self.zone_name = v,
            SetupField::CatalogServiceProviderHost(v) => self.catalog_service_provider_host = v,
            SetupField::ZonePort(v) => self.zone_port = v,
            SetupField::ParallelPortRangeBegin(v) => self.parallel_port_range_begin = v,
            SetupField::ParallelPortRangeEnd(v) => self.parallel_port_range_end = v,
            SetupField::ControlPlanePort(v) => self.control_plane_port = v,
            SetupField::SchemaValidationBaseUri(v) => self.schema_validation_base_uri = v,
            SetupField::AdminUsername(v) => self.admin_username = v,
            SetupField::ZoneKey(v) => self.zone_key = v,
            SetupField::NegotiationKey(v) => self.negotiation_key = v,
            SetupField::ControlPlaneKey(v) => self.control_plane_key = v,
            SetupField::AdminPassword(v) => self.admin_password = v,
            SetupField::DefaultResourceName(v) => self.default_resource_name = v,
            SetupField::VaultDirectory(v) => self.vault_directory = v,
        }
    }
}

impl fmt::Debug for SetupValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetupValues")
            .field("zone_name", &self.zone_name)
            .field("zone_port", &self.zone_port)
            .field("database_server_hostname", &self.database_server_hostname)
            .field("database_server_port", &self.database_server_port)
            .field("catalog_service_provider_host", &self.catalog_service_provider_host)
            .field("admin_username", &self.admin_username)
            .finish_non_exhaustive()
    }
}

/// A single setup value
#[derive(Clone, PartialEq, Eq)]
pub enum SetupField {
    ServiceAccountName(String),
    ServiceAccountGroup(String),
    OdbcDriver(String),
    DatabaseServerHostname(String),
    DatabaseServerPort(u16),
    DatabaseName(String),
    DatabaseUsername(String),
    DatabasePassword(String),
    StoredPasswordsSalt(String),
    ZoneName(String),
    CatalogServiceProviderHost(String),
    ZonePort(u16),
    ParallelPortRangeBegin(u16),
    ParallelPortRangeEnd(u16),
    ControlPlanePort(u16),
    SchemaValidationBaseUri(String),
    AdminUsername(String),
    ZoneKey(String),
    NegotiationKey(String),
    ControlPlaneKey(String),
    AdminPassword(String),
    DefaultResourceName(String),
    VaultDirectory(String),
}

/// Caller-supplied values; only the fields that are set get applied
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SetupOverrides {
    pub service_account_name: Option<String>,
    pub service_account_group: Option<String>,
    pub odbc_driver: Option<String>,
    pub database_name: Option<String>,
    pub database_username: Option<String>,
    pub database_password: Option<String>,
    pub stored_passwords_salt: Option<String>,
    pub zone_port: Option<u16>,
    pub parallel_port_range_begin: Option<u16>,
    pub parallel_port_range_end: Option<u16>,
    pub control_plane_port: Option<u16>,
    pub schema_validation_base_uri: Option<String>,
    pub admin_username: Option<String>,
    pub control_plane_key: Option<String>,
    pub admin_password: Option<String>,
    pub default_resource_name: Option<String>,
    pub vault_directory: Option<String>,
}

impl SetupOverrides {
    /// Fields the caller actually specified
    pub fn fields(&self) -> Vec<SetupField> {
        let strings: [(&Option<String>, fn(String) -> SetupField); 13] = [
            (&self.service_account_name, SetupField::ServiceAccountName),
            (&self.service_account_group, SetupField::ServiceAccountGroup),
            (&self.odbc_driver, SetupField::OdbcDriver),
            (&self.database_name, SetupField::DatabaseName),
            (&self.database_username, SetupField::DatabaseUsername),
            (&self.database_password, SetupField::DatabasePassword),
            (&self.stored_passwords_salt, SetupField::StoredPasswordsSalt),
            (&self.schema_validation_base_uri, SetupField::SchemaValidationBaseUri),
            (&self.admin_username, SetupField::AdminUsername),
            (&self.control_plane_key, SetupField::ControlPlaneKey),
            (&self.admin_password, SetupField::AdminPassword),
            (&self.default_resource_name, SetupField::DefaultResourceName),
            (&self.vault_directory, SetupField::VaultDirectory),
        ];
        let ports: [(Option<u16>, fn(u16) -> SetupField); 4] = [
            (self.zone_port, SetupField::ZonePort),
            (self.parallel_port_range_begin, SetupField::ParallelPortRangeBegin),
            (self.parallel_port_range_end, SetupField::ParallelPortRangeEnd),
            (self.control_plane_port, SetupField::ControlPlanePort),
        ];

        strings
            .into_iter()
            .filter_map(|(value, field)| value.clone().map(field))
            .chain(ports.into_iter().filter_map(|(value, field)| value.map(field)))
            .collect()
    }

    /// Apply the specified fields on top of `values`
    pub fn merge_into(&self, values: &mut SetupValues) {
        for field in self.fields() {
            values.set(field);
        }
    }
}

impl fmt::Debug for SetupOverrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetupOverrides")
            .field("fields_set", &self.fields().len())
            .finish()
    }
}

/// Accumulates setup values for one node of one server family
#[derive(Debug, Clone)]
pub struct SetupInputBuilder {
    family: SetupFamily,
    role: Option<NodeRole>,
    values: SetupValues,
}

impl SetupInputBuilder {
    pub fn new(family: SetupFamily) -> Self {
        Self {
            family,
            role: None,
            values: SetupValues::default(),
        }
    }

    pub fn family(&self) -> SetupFamily {
        self.family
    }

    pub fn values(&self) -> &SetupValues {
        &self.values
    }

    pub fn set_role(&mut self, role: NodeRole) -> &mut Self {
        self.role = Some(role);
        self
    }

    pub fn set(&mut self, field: SetupField) -> &mut Self {
        self.values.set(field);
        self
    }

    pub fn apply(&mut self, overrides: &SetupOverrides) -> &mut Self {
        overrides.merge_into(&mut self.values);
        self
    }

    /// Apply a zone's name and keys
    pub fn set_zone(&mut self, zone: &ZoneIdentity) -> &mut Self {
        self.set(SetupField::ZoneName(zone.name().to_string()))
            .set(SetupField::ZoneKey(zone.zone_key().to_string()))
            .set(SetupField::NegotiationKey(zone.negotiation_key().to_string()))
    }

    /// Render the answers for the configured role
    pub fn render(&self) -> SetupResult<SetupInput> {
        let role = self.role.ok_or(SetupError::UnsupportedRole { role: None })?;
        let lines = self.family.render(role, &self.values)?;
        Ok(SetupInput { lines })
    }
}

/// Rendered, ordered answers for the setup script
#[derive(Clone, PartialEq, Eq)]
pub struct SetupInput {
    lines: Vec<String>,
}

impl SetupInput {
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Newline-joined text exactly as the setup script should read it
    pub fn to_text(&self) -> String {
        self.lines.join("\n")
    }
}

// Rendered input carries every secret of the zone
impl fmt::Debug for SetupInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetupInput")
            .field("lines", &self.lines.len())
            .finish()
    }
}
