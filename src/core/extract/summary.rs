//! Extraction summary and reporting

use std::time::Duration;
use uuid::Uuid;

/// Summary of one extraction run
#[derive(Debug, Clone)]
pub struct ExtractSummary {
    /// Identifier of the run, also attached to its log lines
    pub run_id: Uuid,

    /// Entities found in the output before the run started
    pub checkpointed_at_start: usize,

    /// Input records read
    pub records_read: usize,

    /// Records skipped because the output already held them
    pub skipped_checkpointed: usize,

    /// Records skipped because their key repeated within the input
    pub skipped_duplicates: usize,

    /// Records aggregated from sub-query results
    pub records_aggregated: usize,

    /// Records appended to the output
    pub records_written: usize,

    /// Batches read from the input
    pub batches: usize,

    /// Batches that had nothing left after filtering
    pub empty_batches: usize,

    /// Sub-queries sent to the gateway
    pub queries_issued: usize,

    /// Duration of the run
    pub duration: Duration,

    /// Whether the run stopped early on a shutdown signal
    pub interrupted: bool,

    /// Whether output writing was disabled
    pub dry_run: bool,
}

impl ExtractSummary {
    /// Create a new empty summary
    pub fn new(dry_run: bool) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            checkpointed_at_start: 0,
            records_read: 0,
            skipped_checkpointed: 0,
            skipped_duplicates: 0,
            records_aggregated: 0,
            records_written: 0,
            batches: 0,
            empty_batches: 0,
            queries_issued: 0,
            duration: Duration::from_secs(0),
            interrupted: false,
            dry_run,
        }
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Records skipped for any reason
    pub fn records_skipped(&self) -> usize {
        self.skipped_checkpointed + self.skipped_duplicates
    }

    /// Aggregated records per second
    pub fn throughput(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs == 0.0 {
            return 0.0;
        }
        self.records_aggregated as f64 / secs
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            run_id = %self.run_id,
            records_read = self.records_read,
            skipped_checkpointed = self.skipped_checkpointed,
            skipped_duplicates = self.skipped_duplicates,
            records_aggregated = self.records_aggregated,
            records_written = self.records_written,
            batches = self.batches,
            empty_batches = self.empty_batches,
            queries_issued = self.queries_issued,
            duration_secs = self.duration.as_secs(),
            throughput_per_sec = self.throughput(),
            interrupted = self.interrupted,
            dry_run = self.dry_run,
            "Extraction summary"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_summary() {
        let summary = ExtractSummary::new(false);
        assert_eq!(summary.records_read, 0);
        assert_eq!(summary.records_skipped(), 0);
        assert!(!summary.interrupted);
        assert!(!summary.dry_run);
    }

    #[test]
    fn test_records_skipped() {
        let mut summary = ExtractSummary::new(false);
        summary.skipped_checkpointed = 3;
        summary.skipped_duplicates = 2;
        assert_eq!(summary.records_skipped(), 5);
    }

    #[test]
    fn test_throughput() {
        let mut summary = ExtractSummary::new(true).with_duration(Duration::from_secs(4));
        summary.records_aggregated = 200;
        assert_eq!(summary.throughput(), 50.0);

        assert_eq!(ExtractSummary::new(true).throughput(), 0.0);
    }
}
