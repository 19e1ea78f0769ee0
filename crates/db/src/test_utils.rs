//! Test utilities for database operations.
//!
//! [`TestDatabase::in_memory`] gives every test its own migrated SQLite
//! database and needs the `sqlite` feature. The `PostgreSQL` helpers target
//! a disposable server configured through `TEST_DB_*` variables.

use std::sync::Arc;

use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, DbErr,
    Statement,
};
use sea_orm_migration::MigratorTrait;
use tracing::info;

use crate::migrations::Migrator;

/// Test database configuration.
#[derive(Debug, Clone)]
pub struct TestDbConfig {
    /// Database host.
    pub host: String,
    /// Database port.
    pub port: u16,
    /// Database username.
    pub username: String,
    /// Database password.
    pub password: String,
    /// Database name.
    pub database: String,
}

impl Default for TestDbConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("TEST_DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: std::env::var("TEST_DB_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5433),
            username: std::env::var("TEST_DB_USER").unwrap_or_else(|_| "polls_test".to_string()),
            password: std::env::var("TEST_DB_PASSWORD")
                .unwrap_or_else(|_| "polls_test".to_string()),
            database: std::env::var("TEST_DB_NAME").unwrap_or_else(|_| "polls_test".to_string()),
        }
    }
}

impl TestDbConfig {
    /// Get the database URL.
    #[must_use]
    pub fn database_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database
        )
    }
}

/// A migrated database owned by one test.
pub struct TestDatabase {
    conn: Arc<DatabaseConnection>,
    backend: DatabaseBackend,
}

impl TestDatabase {
    /// Fresh in-memory SQLite database with all migrations applied.
    ///
    /// The pool holds exactly one connection: each in-memory SQLite
    /// connection is its own database.
    pub async fn in_memory() -> Result<Self, DbErr> {
        let mut opt = ConnectOptions::new("sqlite::memory:");
        opt.max_connections(1)
            .min_connections(1)
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;
        Migrator::up(&conn, None).await?;

        Ok(Self {
            conn: Arc::new(conn),
            backend: DatabaseBackend::Sqlite,
        })
    }

    /// Connect to the configured `PostgreSQL` test database and migrate it.
    pub async fn postgres(config: &TestDbConfig) -> Result<Self, DbErr> {
        let conn = Database::connect(&config.database_url()).await?;
        Migrator::up(&conn, None).await?;

        info!(database = %config.database, "Connected to test database");

        Ok(Self {
            conn: Arc::new(conn),
            backend: DatabaseBackend::Postgres,
        })
    }

    /// Get the database connection.
    #[must_use]
    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// Shared handle, as the repositories take it.
    #[must_use]
    pub fn shared(&self) -> Arc<DatabaseConnection> {
        Arc::clone(&self.conn)
    }

    /// Delete every row, children first.
    pub async fn cleanup(&self) -> Result<(), DbErr> {
        for table in ["vote", "choice", "question", "user"] {
            let sql = format!("DELETE FROM \"{table}\"");
            self.conn
                .execute(Statement::from_string(self.backend, sql))
                .await?;
        }

        info!("Cleaned up test database");
        Ok(())
    }
}
