//! Pipeline orchestration.
//!
//! One pass per process: open a connection, ensure the table, seed it when
//! empty, run the report query, render, and close. The connection is
//! released on every exit path, whichever stage failed. A close failure is
//! reported but never displaces an earlier stage failure.

pub mod query;
pub mod render;
pub mod schema;
pub mod seed;

use std::fmt;
use std::io::Write;

use crate::config::ConnectionConfig;
use crate::db::{self, DatabaseClient};
use crate::error::Result;
use tracing::{debug, warn};

use seed::SeedOutcome;

/// Stages of a single pipeline pass, in order. `Error` is implicit: any
/// stage failure aborts the remaining stages and proceeds to close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Connected,
    SchemaReady,
    Seeded,
    Queried,
    Rendered,
    Closed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Idle => "idle",
            Stage::Connected => "connected",
            Stage::SchemaReady => "schema-ready",
            Stage::Seeded => "seeded",
            Stage::Queried => "queried",
            Stage::Rendered => "rendered",
            Stage::Closed => "closed",
        };
        write!(f, "{name}")
    }
}

/// Runs the full pipeline: connect, stages, close.
pub async fn run<W: Write>(config: &ConnectionConfig, out: &mut W) -> Result<()> {
    writeln!(out, "Connecting to: {}", config.display_string())?;
    let client = db::connect(config).await?;
    writeln!(out, "Connected successfully!")?;

    run_with_client(client.as_ref(), out).await
}

/// Runs every stage after connection against an already-open client, then
/// closes it. The close happens exactly once on every exit path.
pub async fn run_with_client<W: Write>(db: &dyn DatabaseClient, out: &mut W) -> Result<()> {
    let outcome = run_stages(db, out).await;

    let close_error = match db.close().await {
        Ok(()) => {
            let _ = writeln!(out, "\nDatabase connection closed.");
            debug!(stage = %Stage::Closed, "Connection released");
            None
        }
        Err(e) => {
            warn!("Error closing database connection: {e}");
            Some(e)
        }
    };

    match outcome {
        Ok(stage) => {
            debug!(%stage, "Pipeline complete");
            // A close failure only becomes the result when nothing earlier failed.
            match close_error {
                None => Ok(()),
                Some(e) => Err(e),
            }
        }
        Err(e) => Err(e),
    }
}

/// The sequential stages between connect and close. Returns the last stage
/// reached on success.
async fn run_stages<W: Write>(db: &dyn DatabaseClient, out: &mut W) -> Result<Stage> {
    let mut stage = Stage::Connected;
    debug!(%stage, "Pipeline started");

    writeln!(out, "Creating sales table if not exists...")?;
    schema::ensure_table(db).await?;
    writeln!(out, "Sales table created/verified successfully")?;
    stage = Stage::SchemaReady;
    debug!(%stage, "Stage complete");

    match seed::seed_if_empty(db).await? {
        SeedOutcome::Inserted(rows) => {
            writeln!(out, "Inserting sample data into sales table...")?;
            writeln!(out, "Sample data inserted successfully ({rows} rows)")?;
        }
        SeedOutcome::AlreadySeeded(rows) => {
            writeln!(out, "Sales table already contains data ({rows} rows)")?;
        }
    }
    stage = Stage::Seeded;
    debug!(%stage, "Stage complete");

    writeln!(out, "\nQuerying sales table...")?;
    let result = query::run_query(db, query::SALES_REPORT_QUERY).await?;
    stage = Stage::Queried;
    debug!(%stage, "Stage complete");

    writeln!(out, "\nSales Table Results:")?;
    writeln!(out, "===================")?;
    render::render(&result, out)?;
    stage = Stage::Rendered;
    debug!(%stage, "Stage complete");

    Ok(stage)
}
