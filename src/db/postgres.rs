//! PostgreSQL client implementation.
//!
//! Implements the `DatabaseClient` trait using sqlx. The pool is capped at
//! a single connection: one run of the pipeline holds exactly one session
//! with the server.

use crate::config::ConnectionConfig;
use crate::db::{DatabaseClient, Row, TableResult, Value};
use crate::error::{Diagnostic, PipelineError, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Column as SqlxColumn, Row as SqlxRow, TypeInfo};
use std::time::Duration;
use tracing::debug;

/// Statement timeout in seconds.
const STATEMENT_TIMEOUT_SECS: u64 = 30;

/// PostgreSQL client.
#[derive(Debug)]
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Opens a connection using the given configuration.
    ///
    /// No retries: a failed attempt is reported immediately as a
    /// connection error.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let conn_str = config.to_connection_string()?;

        debug!("Connecting to {}", config.display_string());

        let pool = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(10))
            .connect(&conn_str)
            .await
            .map_err(|e| map_connection_error(e, config))?;

        debug!("Connected to {}", config.display_string());
        Ok(Self { pool })
    }

    /// Creates a client from an existing pool, primarily for tests.
    #[allow(dead_code)]
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn with_timeout<T>(
        &self,
        fut: impl std::future::Future<Output = std::result::Result<T, sqlx::Error>>,
    ) -> Result<T> {
        tokio::time::timeout(Duration::from_secs(STATEMENT_TIMEOUT_SECS), fut)
            .await
            .map_err(|_| {
                PipelineError::query(format!(
                    "Statement timed out after {STATEMENT_TIMEOUT_SECS} seconds"
                ))
            })?
            .map_err(|e| PipelineError::Query(statement_diagnostic(e)))
    }
}

#[async_trait]
impl DatabaseClient for PostgresClient {
    async fn execute_statement(&self, sql: &str) -> Result<()> {
        debug!(sql, "Executing statement");
        self.with_timeout(sqlx::query(sql).execute(&self.pool))
            .await?;
        Ok(())
    }

    async fn execute_query(&self, sql: &str) -> Result<TableResult> {
        debug!(sql, "Executing query");
        let fetched = self
            .with_timeout(sqlx::query(sql).fetch_all(&self.pool))
            .await?;

        // Column metadata comes from the first row; an empty result set
        // renders as a bare row count downstream.
        let columns: Vec<String> = fetched
            .first()
            .map(|row| row.columns().iter().map(|c| c.name().to_string()).collect())
            .unwrap_or_default();

        let rows: Vec<Row> = fetched.iter().map(convert_row).collect();

        Ok(TableResult::with_data(columns, rows))
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}

/// Converts a sqlx PgRow to our Row type.
fn convert_row(row: &PgRow) -> Row {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, col)| convert_value(row, i, col.type_info().name()))
        .collect()
}

/// Converts a single column value from a PgRow to our Value type.
fn convert_value(row: &PgRow, index: usize, type_name: &str) -> Value {
    match type_name.to_uppercase().as_str() {
        "BOOL" | "BOOLEAN" => row
            .try_get::<Option<bool>, _>(index)
            .ok()
            .flatten()
            .map(Value::Bool)
            .unwrap_or(Value::Null),

        "INT2" | "SMALLINT" => row
            .try_get::<Option<i16>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::Int(v as i64))
            .unwrap_or(Value::Null),

        "INT4" | "INT" | "INTEGER" => row
            .try_get::<Option<i32>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::Int(v as i64))
            .unwrap_or(Value::Null),

        "INT8" | "BIGINT" => row
            .try_get::<Option<i64>, _>(index)
            .ok()
            .flatten()
            .map(Value::Int)
            .unwrap_or(Value::Null),

        "FLOAT4" | "REAL" => row
            .try_get::<Option<f32>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::Float(v as f64))
            .unwrap_or(Value::Null),

        "FLOAT8" | "DOUBLE PRECISION" => row
            .try_get::<Option<f64>, _>(index)
            .ok()
            .flatten()
            .map(Value::Float)
            .unwrap_or(Value::Null),

        "NUMERIC" | "DECIMAL" => row
            .try_get::<Option<Decimal>, _>(index)
            .ok()
            .flatten()
            .map(Value::Decimal)
            .unwrap_or(Value::Null),

        "DATE" => row
            .try_get::<Option<NaiveDate>, _>(index)
            .ok()
            .flatten()
            .map(Value::Date)
            .unwrap_or(Value::Null),

        // For all other types, try to get as string
        _ => row
            .try_get::<Option<String>, _>(index)
            .ok()
            .flatten()
            .map(Value::String)
            .unwrap_or(Value::Null),
    }
}

/// Builds a diagnostic from a failed statement, pulling SQLSTATE and detail
/// from the server error when present.
fn statement_diagnostic(error: sqlx::Error) -> Diagnostic {
    if let Some(db_error) = error.as_database_error() {
        let state = db_error.code().map(|c| c.to_string());
        let detail = db_error
            .try_downcast_ref::<sqlx::postgres::PgDatabaseError>()
            .and_then(|pg| pg.detail().map(String::from));

        Diagnostic {
            state,
            detail,
            message: db_error.message().to_string(),
        }
    } else {
        Diagnostic::message_only(error.to_string())
    }
}

/// Maps sqlx connection errors to user-friendly messages.
fn map_connection_error(error: sqlx::Error, config: &ConnectionConfig) -> PipelineError {
    let host = config.host.as_deref().unwrap_or("localhost");
    let port = config.port;
    let user = config.user.as_deref().unwrap_or("unknown");
    let database = config.database.as_deref().unwrap_or("unknown");

    let error_str = error.to_string().to_lowercase();

    if error_str.contains("connection refused") || error_str.contains("could not connect") {
        PipelineError::connection(format!(
            "Cannot connect to {host}:{port}. Check that the server is running."
        ))
    } else if error_str.contains("password authentication failed")
        || error_str.contains("authentication failed")
    {
        PipelineError::connection(format!(
            "Authentication failed for user '{user}'. Check your credentials."
        ))
    } else if error_str.contains("does not exist") && error_str.contains("database") {
        PipelineError::connection(format!("Database '{database}' does not exist."))
    } else if error_str.contains("ssl") || error_str.contains("tls") {
        PipelineError::connection(
            "Server requires SSL. Add '?sslmode=require' to connection string.".to_string(),
        )
    } else if error_str.contains("timed out") || error_str.contains("timeout") {
        PipelineError::connection(format!(
            "Connection to {host}:{port} timed out. The server may be overloaded or unreachable."
        ))
    } else {
        PipelineError::connection(error.to_string())
    }
}
