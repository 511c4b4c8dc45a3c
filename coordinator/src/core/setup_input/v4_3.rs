//! Setup script answers for the 4.3 server family
//!
//! 4.3 dropped the schema validation prompt and asks for the default
//! resource name ahead of the vault directory.

use super::SetupValues;

const CONSUMER_ROLE_SELECTOR: &str = "2";

/// Interpreter that runs the 4.3 setup script
pub(super) const INTERPRETER: &str = "python3";

pub(super) fn render_provider(values: &SetupValues) -> Vec<String> {
    vec![
        values.service_account_name.clone(),
        values.service_account_group.clone(),
        String::new(),
        values.odbc_driver.clone(),
        values.database_server_hostname.clone(),
        values.database_server_port.to_string(),
        values.database_name.clone(),
        values.database_username.clone(),
        "y".to_string(),
        values.database_password.clone(),
        values.stored_passwords_salt.clone(),
        values.zone_name.clone(),
        values.zone_port.to_string(),
        values.parallel_port_range_begin.to_string(),
        values.parallel_port_range_end.to_string(),
        values.control_plane_port.to_string(),
        values.admin_username.clone(),
        "y".to_string(),
        values.zone_key.clone(),
        values.negotiation_key.clone(),
        values.control_plane_key.clone(),
        values.admin_password.clone(),
        String::new(),
        values.default_resource_name.clone(),
        values.vault_directory.clone(),
        String::new(),
    ]
}

pub(super) fn render_consumer(values: &SetupValues) -> Vec<String> {
    vec![
        values.service_account_name.clone(),
        values.service_account_group.clone(),
        CONSUMER_ROLE_SELECTOR.to_string(),
        values.zone_name.clone(),
        values.catalog_service_provider_host.clone(),
        values.zone_port.to_string(),
        values.parallel_port_range_begin.to_string(),
        values.parallel_port_range_end.to_string(),
        values.control_plane_port.to_string(),
        values.admin_username.clone(),
        "y".to_string(),
        values.zone_key.clone(),
        values.negotiation_key.clone(),
        values.control_plane_key.clone(),
        values.admin_password.clone(),
        String::new(),
        values.default_resource_name.clone(),
        values.vault_directory.clone(),
        String::new(),
    ]
}
