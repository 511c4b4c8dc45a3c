//! Tests for version discovery

use mockall::predicate::*;
use shared::{CommandOutput, SoftwareVersion};
use std::sync::Arc;

use super::common::provider_node;
use crate::config::ServerLayout;
use crate::error::SetupError;
use crate::services::{parse_version_document, ServerVersionSource};
use crate::traits::{MockCommandExecutor, VersionSource};

#[test]
fn test_parse_version_document() {
    let document = r#"{"catalog_schema_version": 10, "irods_version": "4.2.11", "commit_id": "abc"}"#;
    assert_eq!(parse_version_document("csp_1", document).unwrap(), SoftwareVersion::new(4, 2, 11));
}

#[test]
fn test_parse_version_document_rejects_garbage() {
    let err = parse_version_document("csp_1", "not json").unwrap_err();
    assert!(matches!(err, SetupError::VersionDiscovery { ref node, .. } if node == "csp_1"));

    let err = parse_version_document("csp_1", r#"{"irods_version": "4.2"}"#).unwrap_err();
    assert!(matches!(err, SetupError::Shared(_)));
}

#[tokio::test]
async fn test_reads_version_file_from_server_home() {
    let mut executor = MockCommandExecutor::new();
    executor
        .expect_run()
        .withf(|_, command| command.command == "cat /var/lib/irods/version.json" && command.user.is_none())
        .times(1)
        .returning(|_, _| Ok(CommandOutput::new(0, r#"{"irods_version": "4.3.1"}"#)));

    let source = ServerVersionSource::new(Arc::new(executor), &ServerLayout::default());
    let version = source.server_version(&provider_node()).await.unwrap();
    assert_eq!(version, SoftwareVersion::new(4, 3, 1));
}

#[tokio::test]
async fn test_missing_version_file_fails_discovery() {
    let mut executor = MockCommandExecutor::new();
    executor
        .expect_run()
        .with(eq(provider_node()), always())
        .times(1)
        .returning(|_, _| Ok(CommandOutput::failure(1)));

    let source = ServerVersionSource::new(Arc::new(executor), &ServerLayout::default());
    let err = source.server_version(&provider_node()).await.unwrap_err();
    assert!(matches!(err, SetupError::VersionDiscovery { .. }));
}
