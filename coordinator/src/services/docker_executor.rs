//! Command execution inside containers through the docker CLI

use async_trait::async_trait;
use shared::{CommandOutput, NodeCommand, NodeHandle};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use crate::error::{SetupError, SetupResult};
use crate::traits::CommandExecutor;

/// Runs node commands with `docker exec`
#[derive(Debug, Clone)]
pub struct DockerExecutor {
    docker: String,
    timeout: Option<Duration>,
}

impl Default for DockerExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl DockerExecutor {
    pub fn new() -> Self {
        Self {
            docker: "docker".to_string(),
            timeout: None,
        }
    }

    /// Use a different docker binary (fluent API)
    pub fn with_binary(mut self, docker: impl Into<String>) -> Self {
        self.docker = docker.into();
        self
    }

    /// Give up on commands running longer than `timeout` (fluent API)
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Arguments passed to the docker binary for `command` on `node`
    pub fn docker_args(node: &NodeHandle, command: &NodeCommand) -> Vec<String> {
        let mut args = vec!["exec".to_string()];
        if let Some(user) = &command.user {
            args.push("-u".to_string());
            args.push(user.clone());
        }
        args.push(node.name.clone());
        args.push("sh".to_string());
        args.push("-c".to_string());
        args.push(command.command.clone());
        args
    }
}

#[async_trait]
impl CommandExecutor for DockerExecutor {
    async fn run(&self, node: &NodeHandle, command: &NodeCommand) -> SetupResult<CommandOutput> {
        let mut cmd = Command::new(&self.docker);
        cmd.args(Self::docker_args(node, command))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let pending = cmd.output();
        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, pending)
                .await
                .map_err(|_| SetupError::execution(&node.name, format!("command timed out after {limit:?}")))?,
            None => pending.await,
        }
        .map_err(|e| SetupError::execution(&node.name, format!("failed to run docker exec: {e}")))?;

        // killed by a signal
        let exit_status = output.status.code().unwrap_or(-1);

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));

        tracing::trace!(node = %node, exit_status, "docker exec finished");
        Ok(CommandOutput::new(exit_status, text))
    }
}
