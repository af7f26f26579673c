//! In-memory database client for testing and `--mock-db` runs.
//!
//! Understands just enough SQL for the pipeline: `CREATE TABLE IF NOT
//! EXISTS`, `INSERT INTO ... VALUES (...)`, `SELECT COUNT(*)`, and
//! `SELECT * ... ORDER BY <col> [DESC]`. Failures can be injected per
//! statement fragment, and close calls are counted so tests can assert the
//! connection is released exactly once.

use super::{DatabaseClient, Row, TableResult, Value};
use crate::error::{Diagnostic, PipelineError, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Mutex;

#[derive(Debug, Default, Clone)]
struct MockTable {
    columns: Vec<String>,
    rows: Vec<Row>,
}

#[derive(Debug, Default)]
struct MockState {
    tables: HashMap<String, MockTable>,
    statements: Vec<String>,
}

/// An in-memory stand-in for the query service.
#[derive(Debug, Default)]
pub struct MockDatabaseClient {
    state: Mutex<MockState>,
    close_calls: AtomicUsize,
    fail_on: Option<String>,
    fail_on_close: bool,
}

impl MockDatabaseClient {
    /// Creates an empty mock client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock client that fails any statement or query whose SQL
    /// contains the given fragment.
    pub fn failing_on(sql_fragment: impl Into<String>) -> Self {
        Self {
            fail_on: Some(sql_fragment.into()),
            ..Self::default()
        }
    }

    /// Creates a mock client whose `close` call fails.
    pub fn failing_on_close() -> Self {
        Self::default().with_failing_close()
    }

    /// Makes `close` fail on an already-configured client.
    pub fn with_failing_close(mut self) -> Self {
        self.fail_on_close = true;
        self
    }

    /// Number of times `close` has been invoked.
    pub fn close_calls(&self) -> usize {
        self.close_calls.load(AtomicOrdering::SeqCst)
    }

    /// Number of rows currently held by the named table.
    pub fn table_rows(&self, table: &str) -> usize {
        self.lock()
            .tables
            .get(table)
            .map(|t| t.rows.len())
            .unwrap_or(0)
    }

    /// Every SQL text passed to this client, in execution order.
    pub fn statement_log(&self) -> Vec<String> {
        self.lock().statements.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().expect("mock state lock poisoned")
    }

    fn check_injected_failure(&self, sql: &str) -> Result<()> {
        if let Some(fragment) = &self.fail_on {
            if sql.contains(fragment.as_str()) {
                return Err(PipelineError::Query(Diagnostic {
                    state: Some("58000".to_string()),
                    detail: None,
                    message: format!("injected failure on '{fragment}'"),
                }));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    async fn execute_statement(&self, sql: &str) -> Result<()> {
        self.lock().statements.push(sql.to_string());
        self.check_injected_failure(sql)?;

        let trimmed = sql.trim();
        let upper = trimmed.to_uppercase();

        if upper.starts_with("CREATE TABLE IF NOT EXISTS") {
            let (name, columns) = parse_create_table(trimmed)?;
            // Idempotent: an existing table is left untouched.
            self.lock()
                .tables
                .entry(name)
                .or_insert_with(|| MockTable {
                    columns,
                    rows: Vec::new(),
                });
            Ok(())
        } else if upper.starts_with("INSERT INTO") {
            let (name, row) = parse_insert(trimmed)?;
            let mut state = self.lock();
            let table = state.tables.get_mut(&name).ok_or_else(|| {
                PipelineError::Query(Diagnostic {
                    state: Some("42P01".to_string()),
                    detail: None,
                    message: format!("relation \"{name}\" does not exist"),
                })
            })?;
            table.rows.push(row);
            Ok(())
        } else {
            Err(PipelineError::query(format!(
                "mock client does not understand statement: {trimmed}"
            )))
        }
    }

    async fn execute_query(&self, sql: &str) -> Result<TableResult> {
        self.lock().statements.push(sql.to_string());
        self.check_injected_failure(sql)?;

        let trimmed = sql.trim();
        let upper = trimmed.to_uppercase();

        if upper.starts_with("SELECT COUNT(*)") {
            let name = table_after_from(trimmed)?;
            let count = self.table_rows(&name) as i64;
            return Ok(TableResult::with_data(
                vec!["count".to_string()],
                vec![vec![Value::Int(count)]],
            ));
        }

        if upper.starts_with("SELECT *") {
            let name = table_after_from(trimmed)?;
            let table = self.lock().tables.get(&name).cloned().ok_or_else(|| {
                PipelineError::Query(Diagnostic {
                    state: Some("42P01".to_string()),
                    detail: None,
                    message: format!("relation \"{name}\" does not exist"),
                })
            })?;

            let mut rows = table.rows;
            if let Some((column, descending)) = parse_order_by(trimmed) {
                let index = table
                    .columns
                    .iter()
                    .position(|c| c.eq_ignore_ascii_case(&column))
                    .ok_or_else(|| {
                        PipelineError::query(format!("unknown ORDER BY column '{column}'"))
                    })?;
                rows.sort_by(|a, b| {
                    let ord = compare_values(&a[index], &b[index]);
                    if descending {
                        ord.reverse()
                    } else {
                        ord
                    }
                });
            }

            return Ok(TableResult::with_data(table.columns, rows));
        }

        Err(PipelineError::query(format!(
            "mock client does not understand query: {trimmed}"
        )))
    }

    async fn close(&self) -> Result<()> {
        self.close_calls.fetch_add(1, AtomicOrdering::SeqCst);
        if self.fail_on_close {
            return Err(PipelineError::close("injected close failure"));
        }
        Ok(())
    }
}

/// Parses `CREATE TABLE IF NOT EXISTS name (col type, ...)` into the table
/// name and ordered column names.
fn parse_create_table(sql: &str) -> Result<(String, Vec<String>)> {
    let rest = &sql["CREATE TABLE IF NOT EXISTS".len()..];
    let open = rest
        .find('(')
        .ok_or_else(|| PipelineError::query("malformed CREATE TABLE: missing column list"))?;
    let name = rest[..open].trim().to_string();
    let close = rest
        .rfind(')')
        .ok_or_else(|| PipelineError::query("malformed CREATE TABLE: unterminated column list"))?;

    let columns = split_top_level(&rest[open + 1..close])
        .into_iter()
        .filter_map(|def| def.split_whitespace().next())
        .map(String::from)
        .collect();

    Ok((name, columns))
}

/// Parses `INSERT INTO name VALUES (v, ...)` into the table name and row.
fn parse_insert(sql: &str) -> Result<(String, Row)> {
    let rest = &sql["INSERT INTO".len()..];
    let values_at = rest
        .to_uppercase()
        .find("VALUES")
        .ok_or_else(|| PipelineError::query("malformed INSERT: missing VALUES"))?;
    let name = rest[..values_at].trim().to_string();

    let tail = &rest[values_at + "VALUES".len()..];
    let open = tail
        .find('(')
        .ok_or_else(|| PipelineError::query("malformed INSERT: missing value list"))?;
    let close = tail
        .rfind(')')
        .ok_or_else(|| PipelineError::query("malformed INSERT: unterminated value list"))?;

    let row = split_top_level(&tail[open + 1..close])
        .into_iter()
        .map(|literal| parse_literal(literal.trim()))
        .collect();

    Ok((name, row))
}

/// Splits on commas that sit outside parentheses and quotes, so
/// `DECIMAL(10,2)` and `'a, b'` stay in one piece.
fn split_top_level(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut in_quote = false;
    let mut start = 0;

    for (i, c) in s.char_indices() {
        match c {
            '\'' => in_quote = !in_quote,
            '(' if !in_quote => depth += 1,
            ')' if !in_quote => depth = depth.saturating_sub(1),
            ',' if !in_quote && depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

/// Interprets a SQL literal by its shape: quoted text (dates included),
/// integers, and decimals.
fn parse_literal(literal: &str) -> Value {
    if literal.eq_ignore_ascii_case("NULL") {
        return Value::Null;
    }
    if let Some(quoted) = literal
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
    {
        if let Ok(date) = NaiveDate::parse_from_str(quoted, "%Y-%m-%d") {
            return Value::Date(date);
        }
        return Value::String(quoted.to_string());
    }
    if let Ok(n) = literal.parse::<i64>() {
        return Value::Int(n);
    }
    if let Ok(d) = Decimal::from_str(literal) {
        return Value::Decimal(d);
    }
    Value::String(literal.to_string())
}

/// Returns the table name following FROM.
fn table_after_from(sql: &str) -> Result<String> {
    let upper = sql.to_uppercase();
    let from_at = upper
        .find(" FROM ")
        .ok_or_else(|| PipelineError::query("malformed query: missing FROM"))?;
    sql[from_at + " FROM ".len()..]
        .split_whitespace()
        .next()
        .map(String::from)
        .ok_or_else(|| PipelineError::query("malformed query: missing table name"))
}

/// Returns the ORDER BY column and direction, if present.
fn parse_order_by(sql: &str) -> Option<(String, bool)> {
    let upper = sql.to_uppercase();
    let at = upper.find("ORDER BY")?;
    let mut parts = sql[at + "ORDER BY".len()..].split_whitespace();
    let column = parts.next()?.to_string();
    let descending = parts
        .next()
        .map(|d| d.eq_ignore_ascii_case("DESC"))
        .unwrap_or(false);
    Some((column, descending))
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => x.cmp(y),
        (Value::Float(x), Value::Float(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
        (Value::Decimal(x), Value::Decimal(y)) => x.cmp(y),
        (Value::Date(x), Value::Date(y)) => x.cmp(y),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        // Mixed types should not occur within a mock column.
        _ => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CREATE_SQL: &str = "CREATE TABLE IF NOT EXISTS sales (id INT, product_name TEXT, \
                              sale_date DATE, amount DECIMAL(10,2), customer_id INT)";

    #[tokio::test]
    async fn test_create_is_idempotent() {
        let client = MockDatabaseClient::new();
        client.execute_statement(CREATE_SQL).await.unwrap();
        client
            .execute_statement("INSERT INTO sales VALUES (1, 'Laptop', '2024-01-15', 999.99, 101)")
            .await
            .unwrap();
        // Re-running CREATE must not drop the row.
        client.execute_statement(CREATE_SQL).await.unwrap();
        assert_eq!(client.table_rows("sales"), 1);
    }

    #[tokio::test]
    async fn test_insert_and_count() {
        let client = MockDatabaseClient::new();
        client.execute_statement(CREATE_SQL).await.unwrap();
        client
            .execute_statement("INSERT INTO sales VALUES (2, 'Mouse', '2024-01-16', 29.99, 102)")
            .await
            .unwrap();

        let result = client
            .execute_query("SELECT COUNT(*) FROM sales")
            .await
            .unwrap();
        assert_eq!(result.rows[0][0], Value::Int(1));
    }

    #[tokio::test]
    async fn test_select_order_by_desc() {
        let client = MockDatabaseClient::new();
        client.execute_statement(CREATE_SQL).await.unwrap();
        for stmt in [
            "INSERT INTO sales VALUES (1, 'Laptop', '2024-01-15', 999.99, 101)",
            "INSERT INTO sales VALUES (2, 'Mouse', '2024-01-16', 29.99, 102)",
        ] {
            client.execute_statement(stmt).await.unwrap();
        }

        let result = client
            .execute_query("SELECT * FROM sales ORDER BY sale_date DESC")
            .await
            .unwrap();
        assert_eq!(result.columns[0], "id");
        assert_eq!(result.rows[0][0], Value::Int(2));
        assert_eq!(result.rows[1][0], Value::Int(1));
    }

    #[tokio::test]
    async fn test_insert_into_missing_table() {
        let client = MockDatabaseClient::new();
        let err = client
            .execute_statement("INSERT INTO sales VALUES (1, 'Laptop', '2024-01-15', 999.99, 101)")
            .await
            .unwrap_err();
        assert_eq!(
            err.diagnostic().unwrap().state.as_deref(),
            Some("42P01")
        );
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let client = MockDatabaseClient::failing_on("INSERT");
        client.execute_statement(CREATE_SQL).await.unwrap();
        let err = client
            .execute_statement("INSERT INTO sales VALUES (1, 'Laptop', '2024-01-15', 999.99, 101)")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("injected failure"));
    }

    #[tokio::test]
    async fn test_close_is_counted() {
        let client = MockDatabaseClient::new();
        assert_eq!(client.close_calls(), 0);
        client.close().await.unwrap();
        assert_eq!(client.close_calls(), 1);
    }

    #[test]
    fn test_create_parses_parenthesized_types() {
        let (name, columns) = parse_create_table(CREATE_SQL).unwrap();
        assert_eq!(name, "sales");
        assert_eq!(
            columns,
            vec!["id", "product_name", "sale_date", "amount", "customer_id"]
        );
    }

    #[test]
    fn test_split_top_level() {
        assert_eq!(
            split_top_level("id INT, amount DECIMAL(10,2), note TEXT"),
            vec!["id INT", " amount DECIMAL(10,2)", " note TEXT"]
        );
        assert_eq!(
            split_top_level("1, 'a, b', 2"),
            vec!["1", " 'a, b'", " 2"]
        );
    }

    #[test]
    fn test_parse_literal_shapes() {
        assert_eq!(parse_literal("101"), Value::Int(101));
        assert_eq!(
            parse_literal("999.99"),
            Value::Decimal(Decimal::from_str("999.99").unwrap())
        );
        assert_eq!(
            parse_literal("'2024-01-15'"),
            Value::Date(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap())
        );
        assert_eq!(parse_literal("'Laptop'"), Value::String("Laptop".to_string()));
        assert_eq!(parse_literal("NULL"), Value::Null);
    }
}
