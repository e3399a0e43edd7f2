//! Status command implementation
//!
//! Reports how much of the input is already present in the output. The query
//! gateway is not contacted.

use crate::cli::{Cli, EXIT_FATAL, EXIT_OK};
use crate::config::RevstatsConfig;
use crate::core::output::Dialect;
use crate::core::source::SourceOptions;
use crate::core::state::measure_progress;

/// Execute the status command
///
/// Returns the process exit code.
pub async fn execute(cli: &Cli, config: &RevstatsConfig) -> anyhow::Result<i32> {
    tracing::info!("Checking extraction progress");

    let options = SourceOptions {
        dialect: Dialect::new(config.extract.delimiter)?,
        default_lang: config.extract.default_lang.clone(),
    };
    let input = cli.input.clone();
    let output = cli.output.clone();

    let report =
        match tokio::task::spawn_blocking(move || measure_progress(input, output, options)).await? {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(error = %e, kind = e.kind(), "Failed to measure progress");
                eprintln!("Failed to measure progress: {e}");
                return Ok(EXIT_FATAL);
            }
        };

    report.log_report();

    println!("Input records:     {}", report.input_records);
    println!("Already done:      {}", report.done);
    println!("Remaining:         {}", report.remaining);
    println!("Repeated in input: {}", report.duplicates);
    println!("Rows in output:    {}", report.checkpoint_entries);
    println!("Progress:          {:.2}%", report.percent_done());

    Ok(EXIT_OK)
}
