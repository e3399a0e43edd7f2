//! Domain error types
//!
//! This module defines the error hierarchy for revstats. Every failure is fatal
//! to the run: the coordinator drains its resources and surfaces one error.
//! Errors don't expose third-party types beyond their rendered message.

use thiserror::Error;

/// Main revstats error type
///
/// This is the primary error type used throughout the application.
#[derive(Debug, Error)]
pub enum RevstatsError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Malformed input record
    #[error("Record source error: {0}")]
    RecordSource(#[from] RecordSourceError),

    /// Malformed prior output
    #[error("Checkpoint corruption: {0}")]
    CheckpointCorruption(#[from] CheckpointError),

    /// A sub-query failed against the query gateway
    #[error("Query gateway error: {0}")]
    QueryGateway(#[from] GatewayError),

    /// The output sink is unavailable or full
    #[error("Output write error: {0}")]
    OutputWrite(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

impl RevstatsError {
    /// Short machine-friendly name of the error kind, used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            RevstatsError::Configuration(_) => "configuration",
            RevstatsError::RecordSource(_) => "record_source",
            RevstatsError::CheckpointCorruption(_) => "checkpoint_corruption",
            RevstatsError::QueryGateway(_) => "query_gateway",
            RevstatsError::OutputWrite(_) => "output_write",
            RevstatsError::Validation(_) => "validation",
            RevstatsError::Serialization(_) => "serialization",
            RevstatsError::Io(_) => "io",
            RevstatsError::Other(_) => "other",
        }
    }
}

/// Errors raised while reading the input record stream
#[derive(Debug, Error)]
pub enum RecordSourceError {
    /// The input file could not be opened or read
    #[error("Failed to read input {path}: {message}")]
    Unreadable { path: String, message: String },

    /// A required column is absent from the header row
    #[error("Missing required column '{0}' in input header")]
    MissingColumn(String),

    /// A record could not be parsed
    #[error("Malformed record at line {line}: {message}")]
    Malformed { line: u64, message: String },
}

/// Errors raised while rebuilding the checkpoint from prior output
#[derive(Debug, Error)]
pub enum CheckpointError {
    /// The output file exists but could not be read
    #[error("Failed to read output {path}: {message}")]
    Unreadable { path: String, message: String },

    /// A previously written row could not be parsed
    #[error("Malformed output row at line {line}: {message}")]
    Malformed { line: u64, message: String },
}

/// Query gateway errors
///
/// A gateway error always covers a whole sub-query; partial rows are never
/// returned alongside one.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Failed to connect to the remote source
    #[error("Failed to connect: {0}")]
    ConnectionFailed(String),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The named sub-query failed
    #[error("Query '{query}' failed: {message}")]
    QueryFailed { query: String, message: String },

    /// Result rows could not be interpreted
    #[error("Invalid response for query '{query}': {message}")]
    InvalidResponse { query: String, message: String },

    /// Server error (5xx)
    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    /// Client error (4xx)
    #[error("Client error: {status} - {message}")]
    ClientError { status: u16, message: String },

    /// Timeout
    #[error("Request timeout: {0}")]
    Timeout(String),
}

impl GatewayError {
    /// Whether the gateway may retry the request on its own
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            GatewayError::ConnectionFailed(_)
                | GatewayError::ServerError { .. }
                | GatewayError::Timeout(_)
        )
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for RevstatsError {
    fn from(err: std::io::Error) -> Self {
        RevstatsError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for RevstatsError {
    fn from(err: serde_json::Error) -> Self {
        RevstatsError::Serialization(err.to_string())
    }
}

// Conversion from csv errors raised outside the record source and checkpoint readers
impl From<csv::Error> for RevstatsError {
    fn from(err: csv::Error) -> Self {
        RevstatsError::Serialization(format!("CSV error: {err}"))
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for RevstatsError {
    fn from(err: toml::de::Error) -> Self {
        RevstatsError::Configuration(format!("TOML parse error: {err}"))
    }
}
