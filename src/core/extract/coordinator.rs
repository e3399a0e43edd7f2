//! Extraction coordinator - drives one resumable run
//!
//! A run moves through `Init → BuildingCheckpoint → Streaming → Draining →
//! Done`. Batches are processed strictly one after another: a batch is
//! filtered, aggregated and written before the next one is read. The prior
//! output and the input are read on the blocking thread pool. The first
//! failure moves the run to `Failed`; the gateway and the output are still
//! closed, and every batch written so far stays on disk for the next run to
//! resume from.

use crate::adapters::gateway::{create_gateway, QueryGateway};
use crate::config::RevstatsConfig;
use crate::core::aggregate::Aggregator;
use crate::core::extract::summary::ExtractSummary;
use crate::core::output::{Dialect, OutputWriter};
use crate::core::source::{batched, filter_batch, Batches, RecordSource, SourceOptions};
use crate::core::state::CheckpointSet;
use crate::domain::{InputRecord, Result, RevstatsError};
use crate::{log_batch_processing, log_error_with_context, log_run_complete, log_run_start};
use std::collections::HashSet;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;

type InputBatches = Batches<RecordSource<File>>;

/// Lifecycle state of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Init,
    BuildingCheckpoint,
    Streaming,
    Draining,
    Done,
    Failed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Init => "init",
            RunState::BuildingCheckpoint => "building_checkpoint",
            RunState::Streaming => "streaming",
            RunState::Draining => "draining",
            RunState::Done => "done",
            RunState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Settings of one run
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub input: PathBuf,
    pub output: PathBuf,
    pub batch_size: usize,
    pub dialect: Dialect,
    pub default_lang: String,
    pub write_header: bool,
    pub dry_run: bool,
}

impl ExtractOptions {
    /// Derive run settings from a validated configuration
    ///
    /// # Errors
    ///
    /// Returns [`RevstatsError::Configuration`] if the delimiter is unusable or
    /// input and output are the same file.
    pub fn from_config(
        config: &RevstatsConfig,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
    ) -> Result<Self> {
        let input = input.as_ref().to_path_buf();
        let output = output.as_ref().to_path_buf();

        if same_file(&input, &output) {
            return Err(RevstatsError::Configuration(format!(
                "input and output must differ, both are {}",
                input.display()
            )));
        }

        Ok(Self {
            input,
            output,
            batch_size: config.extract.batch_size,
            dialect: Dialect::new(config.extract.delimiter)?,
            default_lang: config.extract.default_lang.clone(),
            write_header: config.extract.write_header,
            dry_run: config.application.dry_run,
        })
    }

    fn source_options(&self) -> SourceOptions {
        SourceOptions {
            dialect: self.dialect,
            default_lang: self.default_lang.clone(),
        }
    }
}

/// Extraction coordinator
pub struct ExtractCoordinator {
    options: ExtractOptions,
    aggregator: Aggregator,
    gateway: Arc<dyn QueryGateway>,
    shutdown: watch::Receiver<bool>,
    state: RunState,
}

impl ExtractCoordinator {
    /// Create a coordinator with the gateway selected by the configuration
    ///
    /// The gateway connection is tested here, so an unreachable source fails
    /// before any file is touched.
    ///
    /// # Errors
    ///
    /// Returns [`RevstatsError::Configuration`] for unusable settings or
    /// [`RevstatsError::QueryGateway`] if the gateway cannot be reached.
    pub async fn new(
        config: &RevstatsConfig,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
        shutdown: watch::Receiver<bool>,
    ) -> Result<Self> {
        let options = ExtractOptions::from_config(config, input, output)?;

        let gateway = create_gateway(config).await?;
        if let Err(e) = gateway.test_connection().await {
            let _ = gateway.close().await;
            return Err(e.into());
        }
        tracing::info!(gateway = gateway.name(), "Query gateway ready");

        Ok(Self::from_parts(options, config, gateway, shutdown))
    }

    /// Create a coordinator over an existing gateway
    ///
    /// # Errors
    ///
    /// Returns [`RevstatsError::Configuration`] for unusable settings.
    pub fn with_gateway(
        config: &RevstatsConfig,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
        gateway: Arc<dyn QueryGateway>,
        shutdown: watch::Receiver<bool>,
    ) -> Result<Self> {
        let options = ExtractOptions::from_config(config, input, output)?;
        Ok(Self::from_parts(options, config, gateway, shutdown))
    }

    fn from_parts(
        options: ExtractOptions,
        config: &RevstatsConfig,
        gateway: Arc<dyn QueryGateway>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            options,
            aggregator: Aggregator::new(config.metric_queries()),
            gateway,
            shutdown,
            state: RunState::Init,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Run settings
    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    fn transition(&mut self, next: RunState) {
        tracing::debug!(from = %self.state, to = %next, "Run state transition");
        self.state = next;
    }

    /// Execute the run
    ///
    /// # Errors
    ///
    /// Returns the first error raised by any stage, after the gateway and the
    /// output have been closed.
    pub async fn execute(&mut self) -> Result<ExtractSummary> {
        let start_time = Instant::now();
        let mut summary = ExtractSummary::new(self.options.dry_run);
        let mut writer = None;

        log_run_start!(
            summary.run_id,
            self.options.input.display(),
            self.options.output.display()
        );

        let result = self.stream(&mut summary, &mut writer).await;

        match result {
            Ok(()) => {
                self.transition(RunState::Draining);
                self.drain(writer).await?;
                self.transition(RunState::Done);

                let summary = summary.with_duration(start_time.elapsed());
                log_run_complete!(summary.records_written, summary.duration);
                summary.log_summary();
                Ok(summary)
            }
            Err(e) => {
                self.transition(RunState::Failed);
                if let Err(drain_error) = self.drain(writer).await {
                    tracing::warn!(error = %drain_error, "Cleanup after failure did not complete");
                }

                log_error_with_context!(&e, "Extraction failed");
                tracing::info!(
                    run_id = %summary.run_id,
                    kind = e.kind(),
                    records_written = summary.records_written,
                    queries_issued = summary.queries_issued,
                    "Output up to the last written batch is kept for resume"
                );
                Err(e)
            }
        }
    }

    async fn stream(
        &mut self,
        summary: &mut ExtractSummary,
        writer: &mut Option<OutputWriter>,
    ) -> Result<()> {
        self.transition(RunState::BuildingCheckpoint);
        let checkpoint = self.build_checkpoint().await?;
        summary.checkpointed_at_start = checkpoint.len();

        let input = self.options.input.clone();
        let source_options = self.options.source_options();
        let source =
            run_blocking("Input", move || RecordSource::open(input, source_options)).await??;

        if self.options.dry_run {
            tracing::info!("Dry run mode enabled - no output will be written");
        } else {
            let mut output = OutputWriter::open(&self.options.output, self.options.dialect).await?;
            if self.options.write_header {
                output
                    .write_header_if_empty(&self.aggregator.output_columns())
                    .await?;
            }
            *writer = Some(output);
        }

        self.transition(RunState::Streaming);
        let mut emitted = HashSet::new();
        let mut batches = batched(source, self.options.batch_size);

        loop {
            let shutdown_requested = *self.shutdown.borrow();
            if shutdown_requested {
                tracing::info!(
                    batches = summary.batches,
                    "Shutdown requested, stopping after the last written batch"
                );
                summary.interrupted = true;
                break;
            }

            let (rest, next) = next_batch(batches).await?;
            batches = rest;
            let Some(batch) = next else {
                break;
            };
            let batch = batch?;
            summary.batches += 1;
            summary.records_read += batch.len();

            let size = batch.len();
            let filtered = filter_batch(batch, &checkpoint, &mut emitted);
            summary.skipped_checkpointed += filtered.checkpointed;
            summary.skipped_duplicates += filtered.duplicates;

            if filtered.is_empty() {
                summary.empty_batches += 1;
                tracing::debug!(batch = summary.batches, "Batch fully checkpointed, skipping");
                continue;
            }

            log_batch_processing!(summary.batches, size, filtered.records.len());

            let records = self
                .aggregator
                .aggregate(&filtered.records, self.gateway.as_ref())
                .await?;
            summary.queries_issued += self.aggregator.metrics().len();
            summary.records_aggregated += records.len();

            if let Some(output) = writer.as_mut() {
                summary.records_written += output.write_batch(&records).await?;
            }
        }

        Ok(())
    }

    async fn build_checkpoint(&self) -> Result<CheckpointSet> {
        let path = self.options.output.clone();
        let dialect = self.options.dialect;

        run_blocking("Checkpoint", move || CheckpointSet::build(path, &dialect)).await?
    }

    async fn drain(&self, writer: Option<OutputWriter>) -> Result<()> {
        let gateway_result = self.gateway.close().await;

        if let Some(writer) = writer {
            writer.close().await?;
        }

        gateway_result.map_err(Into::into)
    }
}

/// Whether two paths name the same file
///
/// Paths that both exist are compared after resolving links and relative
/// components.
fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

async fn run_blocking<T, F>(task: &str, f: F) -> Result<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| RevstatsError::Other(format!("{task} task failed: {e}")))
}

/// Read the next input batch off the async worker threads
async fn next_batch(
    mut batches: InputBatches,
) -> Result<(InputBatches, Option<Result<Vec<InputRecord>>>)> {
    run_blocking("Input", move || {
        let next = batches.next();
        (batches, next)
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use crate::core::aggregate::MetricQuery;
    use crate::domain::{EntityId, GatewayError, ResultRow};
    use async_trait::async_trait;
    use tempfile::TempDir;

    struct UnavailableGateway;

    #[async_trait]
    impl QueryGateway for UnavailableGateway {
        fn name(&self) -> &str {
            "unavailable"
        }

        async fn run_query(
            &self,
            metric: &MetricQuery,
            _ids: &[EntityId],
        ) -> std::result::Result<Vec<ResultRow>, GatewayError> {
            Err(GatewayError::QueryFailed {
                query: metric.name.clone(),
                message: "connection refused".to_string(),
            })
        }

        async fn close(&self) -> std::result::Result<(), GatewayError> {
            Ok(())
        }
    }

    fn config() -> RevstatsConfig {
        parse_config(
            r#"
gateway_target = "http"

[http]
base_url = "http://localhost:9"

[extract]
batch_size = 2
write_header = true
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_options_from_config() {
        let options = ExtractOptions::from_config(&config(), "in.csv", "out.csv").unwrap();

        assert_eq!(options.batch_size, 2);
        assert!(options.write_header);
        assert!(!options.dry_run);
        assert_eq!(options.default_lang, "en");
        assert_eq!(options.dialect, Dialect::default());
    }

    #[test]
    fn test_same_input_and_output_rejected() {
        let result = ExtractOptions::from_config(&config(), "pages.csv", "pages.csv");
        assert!(matches!(result, Err(RevstatsError::Configuration(_))));
    }

    #[test]
    fn test_same_file_through_relative_path_rejected() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("pages.csv");
        std::fs::write(&input, "id,name\n").unwrap();
        let output = dir.path().join(".").join("pages.csv");

        let result = ExtractOptions::from_config(&config(), &input, &output);
        assert!(matches!(result, Err(RevstatsError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_failed_batch_issues_no_counted_queries() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("pages.csv");
        std::fs::write(&input, "id,name\n50,A\n").unwrap();
        let (_tx, rx) = watch::channel(false);
        let mut coordinator = ExtractCoordinator::with_gateway(
            &config(),
            &input,
            dir.path().join("stats.csv"),
            Arc::new(UnavailableGateway),
            rx,
        )
        .unwrap();
        let mut summary = ExtractSummary::new(false);
        let mut writer = None;

        let result = coordinator.stream(&mut summary, &mut writer).await;

        assert!(matches!(result, Err(RevstatsError::QueryGateway(_))));
        assert_eq!(summary.batches, 1);
        assert_eq!(summary.queries_issued, 0);
        assert_eq!(summary.records_aggregated, 0);
    }

    #[test]
    fn test_run_state_display() {
        assert_eq!(RunState::BuildingCheckpoint.to_string(), "building_checkpoint");
        assert_eq!(RunState::Failed.to_string(), "failed");
    }
}
