//! Report query stage.
//!
//! Executes the read query and eagerly materializes the full result set.
//! No pagination: the datasets this pipeline targets are small by design.

use std::time::Instant;

use crate::db::{DatabaseClient, TableResult};
use crate::error::Result;
use tracing::debug;

/// The report query run on every pass.
pub const SALES_REPORT_QUERY: &str = "SELECT * FROM sales ORDER BY sale_date DESC";

/// Runs a read query and returns the buffered result.
pub async fn run_query(db: &dyn DatabaseClient, sql: &str) -> Result<TableResult> {
    let start = Instant::now();
    let result = db.execute_query(sql).await?;
    debug!(
        rows = result.row_count(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Query complete"
    );
    Ok(result)
}
