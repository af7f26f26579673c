//! Sample-data loading stage.
//!
//! Counts existing rows and inserts the fixed sample batch only into an
//! empty table, so re-runs never duplicate data. The batch is not
//! transactional: a mid-batch failure leaves earlier inserts in place and
//! is reported as-is.

use crate::db::{fetch_scalar_i64, DatabaseClient};
use crate::error::{PipelineError, Result};
use crate::pipeline::schema::SALES_TABLE;
use tracing::{debug, warn};

/// One fixed sample row. Amounts are kept as source literals so the insert
/// statements carry exact decimals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedRow {
    pub id: i32,
    pub product_name: &'static str,
    pub sale_date: &'static str,
    pub amount: &'static str,
    pub customer_id: i32,
}

impl SeedRow {
    /// Renders the row as an INSERT statement.
    pub fn insert_statement(&self) -> String {
        format!(
            "INSERT INTO {SALES_TABLE} VALUES ({}, '{}', '{}', {}, {})",
            self.id, self.product_name, self.sale_date, self.amount, self.customer_id
        )
    }
}

/// The fixed sample batch, inserted in this order.
pub const SEED_ROWS: [SeedRow; 8] = [
    SeedRow { id: 1, product_name: "Laptop", sale_date: "2024-01-15", amount: "999.99", customer_id: 101 },
    SeedRow { id: 2, product_name: "Mouse", sale_date: "2024-01-16", amount: "29.99", customer_id: 102 },
    SeedRow { id: 3, product_name: "Keyboard", sale_date: "2024-01-17", amount: "79.99", customer_id: 103 },
    SeedRow { id: 4, product_name: "Monitor", sale_date: "2024-01-18", amount: "299.99", customer_id: 101 },
    SeedRow { id: 5, product_name: "Headphones", sale_date: "2024-01-19", amount: "149.99", customer_id: 104 },
    SeedRow { id: 6, product_name: "Laptop", sale_date: "2024-01-20", amount: "1099.99", customer_id: 105 },
    SeedRow { id: 7, product_name: "Mouse", sale_date: "2024-01-21", amount: "39.99", customer_id: 102 },
    SeedRow { id: 8, product_name: "Tablet", sale_date: "2024-01-22", amount: "499.99", customer_id: 106 },
];

/// Outcome of the seeding stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    /// The table was empty; this many rows were inserted.
    Inserted(usize),

    /// The table already held this many rows; nothing was inserted.
    AlreadySeeded(i64),
}

/// Inserts the sample batch when the table is empty.
pub async fn seed_if_empty(db: &dyn DatabaseClient) -> Result<SeedOutcome> {
    let existing = fetch_scalar_i64(db, "SELECT COUNT(*) FROM sales")
        .await
        .map_err(PipelineError::into_seed)?;

    if existing > 0 {
        debug!(rows = existing, "Sales table already seeded");
        return Ok(SeedOutcome::AlreadySeeded(existing));
    }

    for (inserted, row) in SEED_ROWS.iter().enumerate() {
        if let Err(e) = db.execute_statement(&row.insert_statement()).await {
            // No rollback: earlier inserts stay in place.
            warn!(
                inserted,
                total = SEED_ROWS.len(),
                "Seed batch aborted partway; inserted rows are not rolled back"
            );
            return Err(e.into_seed());
        }
    }

    debug!(rows = SEED_ROWS.len(), "Inserted sample data");
    Ok(SeedOutcome::Inserted(SEED_ROWS.len()))
}
