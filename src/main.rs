//! salespipe - seed and report on a sales table over a SQL connection.

use std::io::Write;

use salespipe::cli::Cli;
use salespipe::config::{Config, ConnectionConfig};
use salespipe::db::MockDatabaseClient;
use salespipe::error::{PipelineError, Result};
use salespipe::{logging, pipeline};
use tracing::info;

#[tokio::main]
async fn main() {
    logging::init();

    if let Err(e) = run().await {
        report_error(&e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse_args();
    let mut out = std::io::stdout();

    if cli.mock_db {
        info!("Using in-memory mock database");
        let db = MockDatabaseClient::new();
        writeln!(out, "Connecting to: in-memory mock")?;
        writeln!(out, "Connected successfully!")?;
        return pipeline::run_with_client(&db, &mut out).await;
    }

    let config_path = cli.config_path();
    let config = Config::load_from_file(&config_path)?;
    let connection = resolve_connection(&cli, &config)?;

    pipeline::run(&connection, &mut out).await
}

/// Resolves the final connection configuration.
///
/// Precedence: CLI arguments, then a named connection from the config
/// file, then the default connection, then environment variables on top of
/// built-in defaults (localhost, backend default port).
fn resolve_connection(cli: &Cli, config: &Config) -> Result<ConnectionConfig> {
    let mut connection = cli.to_connection_config()?;

    if connection.is_none() {
        if let Some(name) = cli.connection_name() {
            connection = config.get_connection(Some(name)).cloned();
            if connection.is_none() {
                return Err(PipelineError::config(format!(
                    "Connection '{name}' not found in config file"
                )));
            }
        }
    }

    if connection.is_none() {
        connection = config.get_connection(None).cloned();
    }

    let mut connection = connection.unwrap_or_default();
    connection.apply_env_defaults();

    Ok(connection)
}

/// Prints the failure to stderr, including the service diagnostic fields
/// when the error came from the query service.
fn report_error(error: &PipelineError) {
    eprintln!("{}:", error.category());
    match error.diagnostic() {
        Some(diag) => {
            if let Some(state) = &diag.state {
                eprintln!("SQL State: {state}");
            }
            eprintln!("Message: {}", diag.message);
            if let Some(detail) = &diag.detail {
                eprintln!("Detail: {detail}");
            }
        }
        None => eprintln!("{error}"),
    }
}
