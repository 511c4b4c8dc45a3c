//! Server version discovery from the installed version file

use async_trait::async_trait;
use serde::Deserialize;
use shared::{NodeCommand, NodeHandle, SoftwareVersion};
use std::sync::Arc;

use crate::config::ServerLayout;
use crate::error::{SetupError, SetupResult};
use crate::traits::{CommandExecutor, VersionSource};

#[derive(Debug, Deserialize)]
struct VersionDocument {
    irods_version: String,
}

/// Reads `version.json` from the server home on each node
pub struct ServerVersionSource<E: CommandExecutor> {
    executor: Arc<E>,
    version_file: String,
}

impl<E: CommandExecutor> ServerVersionSource<E> {
    pub fn new(executor: Arc<E>, layout: &ServerLayout) -> Self {
        Self {
            executor,
            version_file: layout.version_file(),
        }
    }

    pub fn version_file(&self) -> &str {
        &self.version_file
    }
}

/// Parse the contents of a server version file
pub fn parse_version_document(node: &str, document: &str) -> SetupResult<SoftwareVersion> {
    let parsed: VersionDocument = serde_json::from_str(document).map_err(|e| SetupError::VersionDiscovery {
        node: node.to_string(),
        message: format!("unreadable version file: {e}"),
    })?;
    Ok(parsed.irods_version.trim().parse()?)
}

#[async_trait]
impl<E: CommandExecutor> VersionSource for ServerVersionSource<E> {
    async fn server_version(&self, node: &NodeHandle) -> SetupResult<SoftwareVersion> {
        let command = NodeCommand::new(format!("cat {}", self.version_file));
        let output = self.executor.run(node, &command).await?;
        if !output.is_success() {
            return Err(SetupError::VersionDiscovery {
                node: node.name.clone(),
                message: format!("reading {} exited with status {}", self.version_file, output.exit_status),
            });
        }

        let version = parse_version_document(&node.name, &output.output)?;
        tracing::debug!(node = %node, %version, "discovered server version");
        Ok(version)
    }
}
