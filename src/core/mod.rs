//! Core extraction pipeline for revstats.
//!
//! # Modules
//!
//! - [`state`] - checkpoint rebuilt from prior output, progress report
//! - [`source`] - input record stream, batching and filtering
//! - [`aggregate`] - metric sub-query fan-out and merge by identifier
//! - [`output`] - output dialect and append-only writer
//! - [`extract`] - run orchestration and summary
//!
//! # Run Workflow
//!
//! 1. **Checkpoint**: scan the existing output and collect entity keys
//! 2. **Stream**: read input records in fixed-size batches
//! 3. **Filter**: drop records already written or repeated
//! 4. **Fan out**: run every metric sub-query for the batch concurrently
//! 5. **Aggregate**: merge result rows by identifier, fill defaults
//! 6. **Write**: append the batch and sync it to disk
//!
//! # Example
//!
//! ```rust,no_run
//! use revstats::config::load_config;
//! use revstats::core::extract::ExtractCoordinator;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("revstats.toml")?;
//! let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//!
//! let mut coordinator =
//!     ExtractCoordinator::new(&config, "pages.csv", "stats.csv", shutdown_rx).await?;
//! let summary = coordinator.execute().await?;
//!
//! println!("Written: {}", summary.records_written);
//! println!("Skipped: {}", summary.records_skipped());
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod extract;
pub mod output;
pub mod source;
pub mod state;
