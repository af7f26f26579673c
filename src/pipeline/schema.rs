//! Table creation stage.
//!
//! Issues an idempotent create so repeated runs never fail or duplicate
//! the table.

use crate::db::DatabaseClient;
use crate::error::{PipelineError, Result};
use tracing::debug;

/// Name of the table the pipeline works against.
pub const SALES_TABLE: &str = "sales";

/// Column layout of the sales table.
const CREATE_SALES_TABLE: &str = "CREATE TABLE IF NOT EXISTS sales (\
    id INT, \
    product_name TEXT, \
    sale_date DATE, \
    amount DECIMAL(10,2), \
    customer_id INT)";

/// Creates the sales table when absent. Safe to call on every run.
pub async fn ensure_table(db: &dyn DatabaseClient) -> Result<()> {
    debug!("Ensuring {SALES_TABLE} table exists");
    db.execute_statement(CREATE_SALES_TABLE)
        .await
        .map_err(PipelineError::into_schema)
}
