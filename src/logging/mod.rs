//! Logging and observability
//!
//! This module provides structured logging with support for:
//! - Configurable log levels, overridable through `RUST_LOG`
//! - Console output on stderr
//! - JSON file logging with daily or hourly rotation
//!
//! # Example
//!
//! ```no_run
//! use revstats::logging::init_logging;
//! use revstats::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!(batch_size = 100, "Application started");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log the start of an extraction run
///
/// # Example
///
/// ```no_run
/// use revstats::log_run_start;
///
/// let run_id = uuid::Uuid::new_v4();
/// log_run_start!(run_id, "pages.csv", "stats.csv");
/// ```
#[macro_export]
macro_rules! log_run_start {
    ($run_id:expr, $input:expr, $output:expr) => {
        tracing::info!(
            run_id = %$run_id,
            input = %$input,
            output = %$output,
            "Starting extraction"
        );
    };
}

/// Log the completion of an extraction run
///
/// # Example
///
/// ```no_run
/// use revstats::log_run_complete;
/// use std::time::Duration;
///
/// log_run_complete!(42, Duration::from_secs(10));
/// ```
#[macro_export]
macro_rules! log_run_complete {
    ($written:expr, $duration:expr) => {
        tracing::info!(
            records_written = $written,
            duration_ms = $duration.as_millis() as u64,
            "Extraction completed"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use revstats::log_error_with_context;
/// use revstats::domain::RevstatsError;
///
/// let error = RevstatsError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}

/// Log a batch about to be queried
///
/// # Example
///
/// ```no_run
/// use revstats::log_batch_processing;
///
/// log_batch_processing!(3, 100, 97);
/// ```
#[macro_export]
macro_rules! log_batch_processing {
    ($batch:expr, $size:expr, $pending:expr) => {
        tracing::debug!(
            batch = $batch,
            size = $size,
            pending = $pending,
            skipped = ($size - $pending),
            "Processing batch"
        );
    };
}

/// Log a retry attempt
///
/// # Example
///
/// ```no_run
/// use revstats::log_retry_attempt;
///
/// log_retry_attempt!(2, 3, "Connection timeout");
/// ```
#[macro_export]
macro_rules! log_retry_attempt {
    ($attempt:expr, $max_attempts:expr, $reason:expr) => {
        tracing::warn!(
            attempt = $attempt,
            max_attempts = $max_attempts,
            reason = %$reason,
            "Retrying operation"
        );
    };
}
