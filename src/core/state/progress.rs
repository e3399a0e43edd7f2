//! Progress report for a pending run
//!
//! Compares the input against the checkpoint without contacting the query
//! gateway, answering "how much is already done".

use super::checkpoint::CheckpointSet;
use crate::core::source::{RecordSource, SourceOptions};
use crate::domain::{EntityKey, Result};
use std::collections::HashSet;
use std::path::Path;

/// How much of an input is already present in the output
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressReport {
    /// Records in the input
    pub input_records: usize,

    /// Input records whose key is in the output, repeats included
    pub done: usize,

    /// Input records repeating an earlier key not yet in the output
    pub duplicates: usize,

    /// Input records a run would still query
    pub remaining: usize,

    /// Distinct keys found in the output
    pub checkpoint_entries: usize,
}

impl ProgressReport {
    /// Completion percentage over records that are done or still pending
    pub fn percent_done(&self) -> f64 {
        let total = self.done + self.remaining;
        if total == 0 {
            return 100.0;
        }
        self.done as f64 / total as f64 * 100.0
    }

    /// Log the report
    pub fn log_report(&self) {
        tracing::info!(
            input_records = self.input_records,
            done = self.done,
            remaining = self.remaining,
            duplicates = self.duplicates,
            checkpoint_entries = self.checkpoint_entries,
            percent_done = self.percent_done(),
            "Progress measured"
        );
    }
}

/// Measure progress of `input` against the output at `output`
///
/// Records are classified in the order a run filters them: checkpoint first,
/// then repeats, so the counts match the run summary's skip counters.
///
/// # Errors
///
/// Returns the record source or checkpoint error that stopped the scan.
pub fn measure_progress(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    options: SourceOptions,
) -> Result<ProgressReport> {
    let checkpoint = CheckpointSet::build(output, &options.dialect)?;
    let mut report = ProgressReport {
        checkpoint_entries: checkpoint.len(),
        ..ProgressReport::default()
    };
    let mut seen: HashSet<EntityKey> = HashSet::new();

    for record in RecordSource::open(input, options)? {
        let key = record?.key();
        report.input_records += 1;

        if checkpoint.contains(&key) {
            report.done += 1;
        } else if !seen.insert(key) {
            report.duplicates += 1;
        } else {
            report.remaining += 1;
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_measure_progress() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.csv");
        let output = dir.path().join("out.csv");
        std::fs::write(&input, "id,name\n50,A\n51,B\n52,C\n51,B\n").unwrap();
        std::fs::write(&output, "en,50,A,3\n").unwrap();

        let report = measure_progress(&input, &output, SourceOptions::default()).unwrap();

        assert_eq!(
            report,
            ProgressReport {
                input_records: 4,
                done: 1,
                duplicates: 1,
                remaining: 2,
                checkpoint_entries: 1,
            }
        );
        assert!((report.percent_done() - 33.33).abs() < 0.01);
    }

    #[test]
    fn test_repeated_key_already_in_output_counts_as_done() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.csv");
        let output = dir.path().join("out.csv");
        std::fs::write(&input, "id,name\n50,A\n50,A\n51,B\n").unwrap();
        std::fs::write(&output, "en,50,A,3\n").unwrap();

        let report = measure_progress(&input, &output, SourceOptions::default()).unwrap();

        assert_eq!(report.done, 2);
        assert_eq!(report.duplicates, 0);
        assert_eq!(report.remaining, 1);
    }

    #[test]
    fn test_no_output_yet() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.csv");
        std::fs::write(&input, "id,name\n50,A\n").unwrap();

        let report =
            measure_progress(&input, dir.path().join("out.csv"), SourceOptions::default())
                .unwrap();

        assert_eq!(report.remaining, 1);
        assert_eq!(report.percent_done(), 0.0);
    }
}
