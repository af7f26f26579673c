//! Database abstraction layer.
//!
//! Provides a trait-based interface for the query service, allowing the
//! pipeline to run against a real server or the in-memory mock
//! interchangeably.

mod mock;
mod postgres;
mod types;

pub use mock::MockDatabaseClient;
pub use postgres::PostgresClient;
pub use types::{Row, TableResult, Value};

use crate::config::ConnectionConfig;
use crate::error::{PipelineError, Result};
use async_trait::async_trait;

/// Supported database backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    #[default]
    Postgres,
    // Future: MySQL, Trino, etc.
}

impl DatabaseBackend {
    /// Returns the backend as a string for display and persistence.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
        }
    }

    /// Parses a backend from a string.
    ///
    /// Unknown names mean no driver was built for that backend, so callers
    /// should surface `None` as a driver error rather than a config error.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" => Some(Self::Postgres),
            _ => None,
        }
    }

    /// Returns the default port for this backend.
    pub fn default_port(&self) -> u16 {
        match self {
            Self::Postgres => 5432,
        }
    }

    /// Returns the URL scheme for this backend.
    pub fn url_scheme(&self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
        }
    }
}

/// Opens a connection for the configured backend.
///
/// This is the central factory function for database connections. At most
/// one connection is opened per run; the returned client owns it until
/// `close` is called.
pub async fn connect(config: &ConnectionConfig) -> Result<Box<dyn DatabaseClient>> {
    match config.backend {
        DatabaseBackend::Postgres => {
            let client = PostgresClient::connect(config).await?;
            Ok(Box::new(client))
        }
    }
}

/// Interface to the query service.
///
/// All operations are async and return Results with PipelineError.
/// Execution failures are reported as `Query` errors carrying the server
/// diagnostic; stage code reclassifies them where a more specific category
/// applies.
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// Executes a statement that returns no rows (DDL or DML).
    async fn execute_statement(&self, sql: &str) -> Result<()>;

    /// Executes a query and eagerly materializes the full result set.
    async fn execute_query(&self, sql: &str) -> Result<TableResult>;

    /// Closes the connection. Further calls on the client are invalid.
    async fn close(&self) -> Result<()>;
}

/// Convenience for count queries: runs the query and reads the single
/// integer cell of the first row.
pub async fn fetch_scalar_i64(db: &dyn DatabaseClient, sql: &str) -> Result<i64> {
    let result = db.execute_query(sql).await?;
    match result.rows.first().and_then(|row| row.first()) {
        Some(Value::Int(n)) => Ok(*n),
        Some(other) => Err(PipelineError::query(format!(
            "expected integer scalar from '{sql}', got {other:?}"
        ))),
        None => Err(PipelineError::query(format!(
            "expected one row from '{sql}', got none"
        ))),
    }
}
