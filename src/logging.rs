//! Logging configuration.
//!
//! Logs go to stderr so the rendered table and status messages on stdout
//! stay clean. Verbosity is controlled with RUST_LOG.

use tracing_subscriber::EnvFilter;

/// Initializes stderr logging.
pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}
