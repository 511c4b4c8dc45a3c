//! Tests for the docker executor and compose inventory

use shared::{NodeCommand, NodeRole};

use super::common::provider_node;
use crate::services::{ComposeInventory, DockerExecutor};

#[test]
fn test_docker_args_without_user() {
    let args = DockerExecutor::docker_args(&provider_node(), &NodeCommand::new("ils"));
    assert_eq!(args, vec!["exec", "proj_irods-catalog-provider_1", "sh", "-c", "ils"]);
}

#[test]
fn test_docker_args_with_user() {
    let command = NodeCommand::new("/var/lib/irods/irodsctl restart").as_user("irods");
    let args = DockerExecutor::docker_args(&provider_node(), &command);
    assert_eq!(
        args,
        vec![
            "exec",
            "-u",
            "irods",
            "proj_irods-catalog-provider_1",
            "sh",
            "-c",
            "/var/lib/irods/irodsctl restart"
        ]
    );
}

#[test]
fn test_container_names_follow_compose_convention() {
    assert_eq!(
        ComposeInventory::container_name("proj", NodeRole::DatabaseServer, 2),
        "proj_irods-catalog_2"
    );
    assert_eq!(
        ComposeInventory::container_name("proj", NodeRole::CatalogConsumer, 10),
        "proj_irods-catalog-consumer_10"
    );
}

#[test]
fn test_parse_instance_only_matches_own_service() {
    let role = NodeRole::CatalogConsumer;
    assert_eq!(ComposeInventory::parse_instance("proj", role, "proj_irods-catalog-consumer_3"), Some(3));
    assert_eq!(ComposeInventory::parse_instance("proj", role, "proj_irods-catalog-provider_3"), None);
    assert_eq!(ComposeInventory::parse_instance("other", role, "proj_irods-catalog-consumer_3"), None);
    assert_eq!(ComposeInventory::parse_instance("proj", role, "proj_irods-catalog-consumer_x"), None);
}

#[cfg(unix)]
#[tokio::test]
async fn test_executor_reports_exit_status_and_output() {
    use crate::traits::CommandExecutor;
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("fake-docker");
    std::fs::write(&script, "#!/bin/sh\necho \"$@\"\nexit 3\n").unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

    let executor = DockerExecutor::new().with_binary(script.to_string_lossy());
    let output = executor
        .run(&provider_node(), &NodeCommand::new("ils").as_user("irods"))
        .await
        .unwrap();

    assert_eq!(output.exit_status, 3);
    assert!(!output.is_success());
    assert!(output.output.contains("exec -u irods proj_irods-catalog-provider_1 sh -c ils"));
}

#[tokio::test]
async fn test_executor_missing_binary_is_an_execution_error() {
    use crate::error::SetupError;
    use crate::traits::CommandExecutor;

    let executor = DockerExecutor::new().with_binary("/nonexistent/docker");
    let err = executor
        .run(&provider_node(), &NodeCommand::new("ils"))
        .await
        .unwrap_err();
    assert!(matches!(err, SetupError::Execution { ref node, .. } if node == "proj_irods-catalog-provider_1"));
}
