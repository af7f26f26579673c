//! Pipeline tests against a real PostgreSQL database.
//!
//! These tests require a running PostgreSQL database and mutate a `sales`
//! table in it. Set DATABASE_URL to run them; they are skipped otherwise.

use salespipe::config::ConnectionConfig;
use salespipe::db::{DatabaseClient, PostgresClient, Value};
use salespipe::pipeline;

async fn get_test_client() -> Option<PostgresClient> {
    let url = std::env::var("DATABASE_URL").ok()?;
    let config = ConnectionConfig::from_connection_string(&url).ok()?;
    PostgresClient::connect(&config).await.ok()
}

#[tokio::test]
async fn full_pipeline_against_postgres() {
    let Some(client) = get_test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    // Start from a clean slate so the seed path is exercised.
    client
        .execute_statement("DROP TABLE IF EXISTS sales")
        .await
        .unwrap();

    let mut out = Vec::new();
    pipeline::run_with_client(&client, &mut out).await.unwrap();

    let output = String::from_utf8(out).unwrap();
    assert!(output.contains("Sample data inserted successfully"));
    assert!(output.contains("Total rows returned: 8"));
}

#[tokio::test]
async fn second_run_skips_seeding() {
    let Some(client) = get_test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    client
        .execute_statement("DROP TABLE IF EXISTS sales")
        .await
        .unwrap();

    let mut first = Vec::new();
    pipeline::run_with_client(&client, &mut first).await.unwrap();

    // The first run closed its client; open a fresh one for the second pass.
    let client = get_test_client().await.expect("reconnect");
    let mut second = Vec::new();
    pipeline::run_with_client(&client, &mut second).await.unwrap();

    let output = String::from_utf8(second).unwrap();
    assert!(output.contains("Sales table already contains data (8 rows)"));
    assert!(output.contains("Total rows returned: 8"));
}

#[tokio::test]
async fn decimal_and_date_columns_decode() {
    let Some(client) = get_test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let result = client
        .execute_query("SELECT DATE '2024-01-22' AS d, 499.99::DECIMAL(10,2) AS amount")
        .await
        .unwrap();

    assert_eq!(result.columns, vec!["d", "amount"]);
    match &result.rows[0][0] {
        Value::Date(d) => assert_eq!(d.to_string(), "2024-01-22"),
        other => panic!("expected Date, got {other:?}"),
    }
    match &result.rows[0][1] {
        Value::Decimal(d) => assert_eq!(d.to_string(), "499.99"),
        other => panic!("expected Decimal, got {other:?}"),
    }

    client.close().await.unwrap();
}
