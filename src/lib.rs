// revstats - Resumable revision statistics extraction
// Copyright (c) 2025 Revstats Contributors
// Licensed under the MIT License

//! # revstats - resumable per-page revision statistics
//!
//! revstats reads a list of wiki pages, runs a set of metric sub-queries
//! against a replica of the wiki database for each batch of pages, and appends
//! one row of statistics per page to an output file.
//!
//! ## Overview
//!
//! The defining property is **resumability**: the process may be killed at any
//! point and restarted with the same arguments. The output file is its own
//! checkpoint. On start it is scanned, every page already present is skipped,
//! and only the remaining pages are queried.
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Extraction pipeline (checkpoint, source, aggregate, output, extract)
//! - [`adapters`] - Query gateways (PostgreSQL, HTTP)
//! - [`domain`] - Core domain types and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use revstats::config::load_config;
//! use revstats::core::extract::ExtractCoordinator;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("revstats.toml")?;
//!     let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//!
//!     let mut coordinator =
//!         ExtractCoordinator::new(&config, "pages.csv", "stats.csv", shutdown_rx).await?;
//!     let summary = coordinator.execute().await?;
//!
//!     println!("Wrote {} rows", summary.records_written);
//!     Ok(())
//! }
//! ```
//!
//! ## Output Format
//!
//! ```text
//! en,50,A,3,1,2,2004-03-01T12:30:00Z,512
//! en,51,"B,C",7,0,4,2005-11-20T08:00:00Z,1024
//! ```
//!
//! Columns are `lang, id, name` followed by the metric columns in configuration
//! order. Fields containing the delimiter, a quote or a line break are quoted.
//!
//! ## Error Handling
//!
//! All fallible library operations return [`domain::Result`], carrying a
//! [`domain::RevstatsError`]. Every error ends the run; batches written before
//! it stay on disk.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
