//! End-to-end pipeline tests against the in-memory mock client.

use pretty_assertions::assert_eq;
use salespipe::db::MockDatabaseClient;
use salespipe::pipeline;

async fn run_pipeline(db: &MockDatabaseClient) -> (salespipe::error::Result<()>, String) {
    let mut out = Vec::new();
    let result = pipeline::run_with_client(db, &mut out).await;
    (result, String::from_utf8(out).unwrap())
}

/// Data rows of the rendered table: everything between the dash separator
/// and the blank line before the row count.
fn rendered_data_rows(output: &str) -> Vec<&str> {
    let lines: Vec<&str> = output.lines().collect();
    let separator = lines
        .iter()
        .position(|l| l.starts_with("---------------"))
        .expect("rendered output has a separator line");
    lines[separator + 1..]
        .iter()
        .take_while(|l| !l.is_empty())
        .copied()
        .collect()
}

#[tokio::test]
async fn fresh_table_renders_eight_rows_descending() {
    let db = MockDatabaseClient::new();
    let (result, output) = run_pipeline(&db).await;
    result.unwrap();

    assert!(output.contains("Total rows returned: 8"));

    let header = format!(
        "{:<15}{:<15}{:<15}{:<15}{:<15}",
        "id", "product_name", "sale_date", "amount", "customer_id"
    );
    assert!(output.contains(&header));

    let rows = rendered_data_rows(&output);
    assert_eq!(rows.len(), 8);

    // id=8 / 2024-01-22 first, id=1 / 2024-01-15 last.
    assert!(rows[0].starts_with("8"));
    assert!(rows[0].contains("2024-01-22"));
    assert!(rows[0].contains("Tablet"));
    assert!(rows[7].starts_with("1"));
    assert!(rows[7].contains("2024-01-15"));

    // Dates strictly descending down the rendered table.
    let dates: Vec<&str> = rows
        .iter()
        .map(|row| row[30..40].trim_end())
        .collect();
    let mut sorted = dates.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(dates, sorted);
}

#[tokio::test]
async fn every_rendered_cell_sits_on_a_fifteen_char_boundary() {
    let db = MockDatabaseClient::new();
    let (result, output) = run_pipeline(&db).await;
    result.unwrap();

    for row in rendered_data_rows(&output) {
        // None of the seeded values overflow a cell, so every row spans the
        // full five-column grid.
        assert_eq!(row.len(), 5 * 15, "row not padded to grid: {row:?}");
        // sale_date occupies the third cell, starting at offset 30.
        assert!(row[30..].starts_with("2024-01-"), "row off grid: {row:?}");
    }
}

#[tokio::test]
async fn rerun_leaves_table_unchanged() {
    let db = MockDatabaseClient::new();
    let (first, _) = run_pipeline(&db).await;
    first.unwrap();

    let (second, output) = run_pipeline(&db).await;
    second.unwrap();

    assert!(output.contains("Sales table already contains data (8 rows)"));
    assert!(output.contains("Total rows returned: 8"));
    assert_eq!(db.table_rows("sales"), 8);
    assert_eq!(db.close_calls(), 2);
}

#[tokio::test]
async fn seed_batch_matches_fixture_statements() {
    let db = MockDatabaseClient::new();
    let (result, _) = run_pipeline(&db).await;
    result.unwrap();

    let inserts: Vec<String> = db
        .statement_log()
        .into_iter()
        .filter(|sql| sql.starts_with("INSERT"))
        .collect();

    assert_eq!(
        inserts,
        vec![
            "INSERT INTO sales VALUES (1, 'Laptop', '2024-01-15', 999.99, 101)",
            "INSERT INTO sales VALUES (2, 'Mouse', '2024-01-16', 29.99, 102)",
            "INSERT INTO sales VALUES (3, 'Keyboard', '2024-01-17', 79.99, 103)",
            "INSERT INTO sales VALUES (4, 'Monitor', '2024-01-18', 299.99, 101)",
            "INSERT INTO sales VALUES (5, 'Headphones', '2024-01-19', 149.99, 104)",
            "INSERT INTO sales VALUES (6, 'Laptop', '2024-01-20', 1099.99, 105)",
            "INSERT INTO sales VALUES (7, 'Mouse', '2024-01-21', 39.99, 102)",
            "INSERT INTO sales VALUES (8, 'Tablet', '2024-01-22', 499.99, 106)",
        ]
    );
}

#[tokio::test]
async fn connection_closes_exactly_once_whichever_stage_fails() {
    let cases = [
        ("CREATE TABLE", "Schema Error"),
        ("INSERT INTO", "Seed Error"),
        ("ORDER BY", "Query Error"),
    ];

    for (fragment, expected_category) in cases {
        let db = MockDatabaseClient::failing_on(fragment);
        let (result, _) = run_pipeline(&db).await;

        let err = result.unwrap_err();
        assert_eq!(err.category(), expected_category, "fragment {fragment:?}");
        assert_eq!(db.close_calls(), 1, "fragment {fragment:?}");
    }
}

#[tokio::test]
async fn close_failure_is_reported_but_not_dominant() {
    // Only close fails: the close error is the result.
    let db = MockDatabaseClient::failing_on_close();
    let (result, output) = run_pipeline(&db).await;
    assert_eq!(result.unwrap_err().category(), "Close Error");
    assert!(output.contains("Total rows returned: 8"));

    // A stage failure and a close failure: the stage failure wins.
    let db = MockDatabaseClient::failing_on("ORDER BY").with_failing_close();
    let (result, _) = run_pipeline(&db).await;
    assert_eq!(result.unwrap_err().category(), "Query Error");
    assert_eq!(db.close_calls(), 1);
}
