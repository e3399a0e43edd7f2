//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for revstats using clap.

pub mod commands;

use crate::config::RevstatsConfig;
use crate::domain::RevstatsError;
use clap::Parser;
use std::path::PathBuf;

/// Exit code for a completed run
pub const EXIT_OK: i32 = 0;
/// Exit code for configuration errors
pub const EXIT_CONFIG: i32 = 2;
/// Exit code when the query gateway cannot be initialized
pub const EXIT_GATEWAY: i32 = 4;
/// Exit code for any other failure
pub const EXIT_FATAL: i32 = 5;
/// Exit code for a run stopped by SIGINT/SIGTERM
pub const EXIT_INTERRUPTED: i32 = 130;

/// revstats - resumable per-page revision statistics extraction
#[derive(Parser, Debug)]
#[command(name = "revstats")]
#[command(version, about, long_about = None)]
#[command(author = "Revstats Contributors")]
pub struct Cli {
    /// Input file with `id`, `name` and optional `lang` columns
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output file; existing rows are skipped and new rows appended
    #[arg(short, long)]
    pub output: PathBuf,

    /// Path to configuration file
    #[arg(long, default_value = "revstats.toml", env = "REVSTATS_CONFIG")]
    pub options: PathBuf,

    /// Records per batch (overrides extract.batch_size)
    #[arg(short, long)]
    pub batch_size: Option<usize>,

    /// Language for records without a `lang` value (overrides extract.default_lang)
    #[arg(long)]
    pub lang: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "REVSTATS_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Aggregate without writing output
    #[arg(long)]
    pub dry_run: bool,

    /// Report how much of the input is already in the output and exit
    #[arg(long)]
    pub status: bool,
}

impl Cli {
    /// Apply command-line overrides and re-validate
    ///
    /// # Errors
    ///
    /// Returns [`RevstatsError::Configuration`] if an override makes the
    /// configuration invalid.
    pub fn apply_overrides(&self, config: &mut RevstatsConfig) -> Result<(), RevstatsError> {
        if let Some(batch_size) = self.batch_size {
            tracing::debug!(batch_size, "Overriding batch size from CLI");
            config.extract.batch_size = batch_size;
        }
        if let Some(ref lang) = self.lang {
            config.extract.default_lang = lang.clone();
        }
        if let Some(ref level) = self.log_level {
            config.application.log_level = level.clone();
        }
        if self.dry_run {
            config.application.dry_run = true;
        }

        config
            .validate()
            .map_err(|e| RevstatsError::Configuration(format!("Invalid CLI override: {e}")))
    }
}

/// Exit code for an error raised while setting up a run
pub fn init_exit_code(error: &RevstatsError) -> i32 {
    match error {
        RevstatsError::Configuration(_) => EXIT_CONFIG,
        _ => EXIT_GATEWAY,
    }
}
