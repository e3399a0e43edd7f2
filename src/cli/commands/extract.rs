//! Extract command implementation
//!
//! Runs the resumable extraction from `--input` into `--output`.

use crate::cli::{init_exit_code, Cli, EXIT_FATAL, EXIT_INTERRUPTED, EXIT_OK};
use crate::config::RevstatsConfig;
use crate::core::extract::ExtractCoordinator;
use tokio::sync::watch;

/// Execute the extraction
///
/// Returns the process exit code.
pub async fn execute(
    cli: &Cli,
    config: &RevstatsConfig,
    shutdown_signal: watch::Receiver<bool>,
) -> anyhow::Result<i32> {
    tracing::info!(
        input = %cli.input.display(),
        output = %cli.output.display(),
        batch_size = config.extract.batch_size,
        dry_run = config.application.dry_run,
        "Starting extract command"
    );

    let mut coordinator =
        match ExtractCoordinator::new(config, &cli.input, &cli.output, shutdown_signal).await {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to initialize extraction");
                eprintln!("Failed to initialize extraction: {e}");
                return Ok(init_exit_code(&e));
            }
        };

    let summary = match coordinator.execute().await {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Extraction failed: {e}");
            eprintln!("Rows written before the failure are kept; rerun the same command to resume.");
            return Ok(EXIT_FATAL);
        }
    };

    eprintln!();
    eprintln!("Extraction Summary:");
    eprintln!("  Records read: {}", summary.records_read);
    eprintln!("  Already in output: {}", summary.skipped_checkpointed);
    eprintln!("  Repeated in input: {}", summary.skipped_duplicates);
    eprintln!("  Aggregated: {}", summary.records_aggregated);
    eprintln!("  Written: {}", summary.records_written);
    eprintln!("  Batches: {} ({} fully skipped)", summary.batches, summary.empty_batches);
    eprintln!("  Sub-queries: {}", summary.queries_issued);
    eprintln!("  Duration: {:.2}s", summary.duration.as_secs_f64());
    if summary.dry_run {
        eprintln!("  Dry run: nothing was written");
    }
    eprintln!();

    if summary.interrupted {
        eprintln!("Extraction interrupted. Progress saved; rerun the same command to resume.");
        tracing::info!("Extraction interrupted by user signal");
        return Ok(EXIT_INTERRUPTED);
    }

    Ok(EXIT_OK)
}
