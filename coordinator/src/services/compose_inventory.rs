//! Node inventory backed by a docker compose project
//!
//! Containers follow compose's `<project>_<service>_<n>` naming, with one
//! service per role.

use async_trait::async_trait;
use shared::{NodeHandle, NodeRole};
use std::process::Stdio;
use tokio::process::Command;

use crate::error::{SetupError, SetupResult};
use crate::traits::NodeInventory;

/// Resolves nodes by inspecting a compose project's containers
#[derive(Debug, Clone)]
pub struct ComposeInventory {
    project: String,
    docker: String,
}

impl ComposeInventory {
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            docker: "docker".to_string(),
        }
    }

    /// Use a different docker binary (fluent API)
    pub fn with_binary(mut self, docker: impl Into<String>) -> Self {
        self.docker = docker.into();
        self
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn container_name(project: &str, role: NodeRole, instance: u32) -> String {
        format!("{}_{}_{}", project, role.service_name(), instance)
    }

    /// Instance number of a container name belonging to `role`, if any
    pub fn parse_instance(project: &str, role: NodeRole, container: &str) -> Option<u32> {
        let prefix = format!("{}_{}_", project, role.service_name());
        container.strip_prefix(&prefix)?.parse().ok()
    }

    async fn docker(&self, args: &[&str]) -> SetupResult<String> {
        let output = Command::new(&self.docker)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| SetupError::inventory(format!("failed to run docker {}: {e}", args.join(" "))))?;

        if !output.status.success() {
            return Err(SetupError::inventory(format!(
                "docker {} failed: {}",
                args.first().copied().unwrap_or_default(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl NodeInventory for ComposeInventory {
    async fn resolve(&self, role: NodeRole, instance: u32) -> SetupResult<NodeHandle> {
        if instance == 0 {
            return Err(SetupError::invalid_argument("instance", "instances are numbered from 1"));
        }

        let name = Self::container_name(&self.project, role, instance);
        let hostname = self
            .docker(&["inspect", "--format", "{{.Config.Hostname}}", &name])
            .await?
            .trim()
            .to_string();

        if hostname.is_empty() {
            return Err(SetupError::inventory(format!("container {name} reports no hostname")));
        }

        Ok(NodeHandle::new(name, hostname, role, instance))
    }

    async fn available_instances(&self, role: NodeRole) -> SetupResult<Vec<u32>> {
        let project_filter = format!("label=com.docker.compose.project={}", self.project);
        let service_filter = format!("label=com.docker.compose.service={}", role.service_name());
        let listing = self
            .docker(&[
                "ps",
                "--filter",
                &project_filter,
                "--filter",
                &service_filter,
                "--format",
                "{{.Names}}",
            ])
            .await?;

        let mut instances: Vec<u32> = listing
            .lines()
            .filter_map(|line| Self::parse_instance(&self.project, role, line.trim()))
            .collect();
        instances.sort_unstable();
        instances.dedup();
        Ok(instances)
    }
}
