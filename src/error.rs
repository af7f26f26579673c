//! Error types for salespipe.
//!
//! One variant per pipeline failure category, so tests and callers can tell
//! stages apart. Statement-level failures carry the diagnostic fields the
//! server supplies (SQLSTATE, detail) alongside the message.

use thiserror::Error;

/// Diagnostic fields reported by the query service for a failed statement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostic {
    /// SQLSTATE code, when the server supplies one.
    pub state: Option<String>,

    /// Additional detail text, when the server supplies one.
    pub detail: Option<String>,

    /// Primary error message.
    pub message: String,
}

impl Diagnostic {
    /// Creates a diagnostic with only a message (client-side failures).
    pub fn message_only(msg: impl Into<String>) -> Self {
        Self {
            state: None,
            detail: None,
            message: msg.into(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(state) = &self.state {
            write!(f, "[{state}] ")?;
        }
        write!(f, "{}", self.message)?;
        if let Some(detail) = &self.detail {
            write!(f, " ({detail})")?;
        }
        Ok(())
    }
}

/// Main error type for pipeline operations.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// No driver is available for the requested backend.
    #[error("Driver unavailable: {0}")]
    Driver(String),

    /// Connection errors (host unreachable, auth failed, etc.)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Table creation/verification failures.
    #[error("Schema error: {0}")]
    Schema(Diagnostic),

    /// Sample-data insertion failures.
    #[error("Seed error: {0}")]
    Seed(Diagnostic),

    /// Query execution failures.
    #[error("Query error: {0}")]
    Query(Diagnostic),

    /// Connection cleanup failures.
    #[error("Close error: {0}")]
    Close(String),

    /// Configuration errors (invalid config file, bad connection string, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Output stream failures while writing status text or the rendered table.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Creates a driver error with the given message.
    pub fn driver(msg: impl Into<String>) -> Self {
        Self::Driver(msg.into())
    }

    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a query error with only a message.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(Diagnostic::message_only(msg))
    }

    /// Creates a close error with the given message.
    pub fn close(msg: impl Into<String>) -> Self {
        Self::Close(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Reclassifies a statement failure as a schema failure, keeping the
    /// server diagnostic when there is one.
    pub fn into_schema(self) -> Self {
        Self::Schema(self.into_diagnostic())
    }

    /// Reclassifies a statement failure as a seed failure, keeping the
    /// server diagnostic when there is one.
    pub fn into_seed(self) -> Self {
        Self::Seed(self.into_diagnostic())
    }

    /// Returns the service diagnostic attached to this error, if any.
    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            Self::Schema(d) | Self::Seed(d) | Self::Query(d) => Some(d),
            _ => None,
        }
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Driver(_) => "Driver Error",
            Self::Connection(_) => "Connection Error",
            Self::Schema(_) => "Schema Error",
            Self::Seed(_) => "Seed Error",
            Self::Query(_) => "Query Error",
            Self::Close(_) => "Close Error",
            Self::Config(_) => "Configuration Error",
            Self::Io(_) => "I/O Error",
        }
    }

    fn into_diagnostic(self) -> Diagnostic {
        match self {
            Self::Schema(d) | Self::Seed(d) | Self::Query(d) => d,
            other => Diagnostic::message_only(other.to_string()),
        }
    }
}

/// Result type alias using PipelineError.
pub type Result<T> = std::result::Result<T, PipelineError>;
