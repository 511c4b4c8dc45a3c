//! PostgreSQL catalog database preparation

use async_trait::async_trait;
use shared::{CommandOutput, NodeCommand, NodeHandle};
use std::sync::Arc;
use std::time::Duration;

use crate::coordinator::shell_quote;
use crate::error::{SetupError, SetupResult};
use crate::readiness::{ReadinessPoller, ReadinessSpec};
use crate::traits::{CatalogDatabase, CommandExecutor};

pub const POSTGRES_PORT: u16 = 5432;

/// Catalog the provider will be pointed at
#[derive(Clone, PartialEq, Eq)]
pub struct CatalogSettings {
    pub database_name: String,
    pub username: String,
    pub password: String,
    /// Drop any existing catalog and user first
    pub force_recreate: bool,
    /// Failed `pg_isready` probes tolerated before giving up
    pub max_retries: u32,
    pub delay: Duration,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            database_name: "ICAT".to_string(),
            username: "irods".to_string(),
            password: "testpassword".to_string(),
            force_recreate: false,
            max_retries: 10,
            delay: Duration::from_secs(1),
        }
    }
}

impl std::fmt::Debug for CatalogSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogSettings")
            .field("database_name", &self.database_name)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("force_recreate", &self.force_recreate)
            .field("max_retries", &self.max_retries)
            .field("delay", &self.delay)
            .finish()
    }
}

/// Creates the catalog database on a PostgreSQL container
pub struct PostgresCatalog<E: CommandExecutor> {
    executor: Arc<E>,
    poller: ReadinessPoller<E>,
    settings: CatalogSettings,
}

impl<E: CommandExecutor> PostgresCatalog<E> {
    pub fn new(executor: Arc<E>, settings: CatalogSettings) -> Self {
        Self {
            poller: ReadinessPoller::new(Arc::clone(&executor)),
            executor,
            settings,
        }
    }

    pub fn settings(&self) -> &CatalogSettings {
        &self.settings
    }

    /// SQL statements run in order, each in its own `psql` call
    pub fn statements(&self) -> Vec<String> {
        let database = quote_identifier(&self.settings.database_name);
        let user = quote_identifier(&self.settings.username);

        let mut statements = Vec::new();
        if self.settings.force_recreate {
            statements.push(format!("DROP DATABASE IF EXISTS {database};"));
            statements.push(format!("DROP USER IF EXISTS {user};"));
        }
        statements.push(format!(
            "CREATE USER {user} WITH PASSWORD '{}';",
            self.settings.password.replace('\'', "''")
        ));
        statements.push(format!("CREATE DATABASE {database};"));
        statements.push(format!("GRANT ALL PRIVILEGES ON DATABASE {database} TO {user};"));
        statements
    }
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn psql(statement: &str) -> NodeCommand {
    NodeCommand::new(format!("psql -c {}", shell_quote(statement))).as_user("postgres")
}

#[async_trait]
impl<E: CommandExecutor> CatalogDatabase for PostgresCatalog<E> {
    fn server_port(&self) -> u16 {
        POSTGRES_PORT
    }

    async fn setup_catalog(&self, node: &NodeHandle) -> SetupResult<CommandOutput> {
        let probe = NodeCommand::new("pg_isready").as_user("postgres");
        let spec = ReadinessSpec::new(node.clone(), probe)
            .with_max_retries(self.settings.max_retries)
            .with_delay(self.settings.delay);
        if !self.poller.await_ready(&spec).await? {
            return Err(SetupError::execution(&node.name, "database server did not become ready"));
        }

        let mut last = CommandOutput::success();
        for statement in self.statements() {
            last = self.executor.run(node, &psql(&statement)).await?;
            if !last.is_success() {
                tracing::warn!(node = %node, exit_status = last.exit_status, "catalog statement failed");
                return Ok(last);
            }
        }

        tracing::info!(node = %node, database = %self.settings.database_name, "catalog database created");
        Ok(last)
    }
}
