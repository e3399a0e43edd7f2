//! Append-only output writer
//!
//! Each batch is serialized into one buffer and appended with a single write,
//! then flushed and synced. A batch that was fully written is therefore durable
//! before the next batch is filtered.

use super::dialect::Dialect;
use crate::domain::{AggregatedRecord, Result, RevstatsError};
use csv::ByteRecord;
use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

/// Length of the prefix of `file` that holds only complete records
///
/// The file is scanned forward with the dialect's reader. The last record is
/// complete when it ends with `\n` outside any quoted field; otherwise it is
/// a torn append and the returned length stops where it starts. An empty file
/// returns 0.
pub(crate) fn complete_len<F: Read + Seek>(
    file: &mut F,
    dialect: &Dialect,
) -> std::io::Result<u64> {
    let total = file.seek(SeekFrom::End(0))?;
    file.seek(SeekFrom::Start(0))?;

    let mut last_start = None;
    {
        let mut rows = dialect.reader_builder().from_reader(file.by_ref());
        let mut record = ByteRecord::new();
        while rows
            .read_byte_record(&mut record)
            .map_err(|e| std::io::Error::new(ErrorKind::InvalidData, e))?
        {
            last_start = record.position().map(|p| p.byte());
        }
    }

    let Some(start) = last_start else {
        return Ok(total);
    };

    let mut tail = Vec::new();
    file.seek(SeekFrom::Start(start))?;
    file.by_ref().take(total - start).read_to_end(&mut tail)?;

    let open_quote = tail.iter().filter(|b| **b == b'"').count() % 2 == 1;
    if tail.ends_with(b"\n") && !open_quote {
        Ok(total)
    } else {
        Ok(start)
    }
}

/// Appends serialized records to the output file
pub struct OutputWriter {
    path: PathBuf,
    file: File,
    dialect: Dialect,
    /// Bytes in the file, including what this writer appended
    len: u64,
    records_written: usize,
}

impl OutputWriter {
    /// Open `path` for appending, creating it if needed
    ///
    /// An incomplete final record, left by a run that died mid-append, is cut
    /// off so new records start on a fresh line.
    ///
    /// # Errors
    ///
    /// Returns [`RevstatsError::OutputWrite`] if the file cannot be opened or
    /// repaired.
    pub async fn open(path: impl AsRef<Path>, dialect: Dialect) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let output_error = |e: std::io::Error| {
            RevstatsError::OutputWrite(format!("Failed to open {}: {}", path.display(), e))
        };

        let mut file = std::fs::OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&path)
            .map_err(output_error)?;

        let total = file.metadata().map_err(output_error)?.len();
        let len = complete_len(&mut file, &dialect).map_err(output_error)?;
        if len < total {
            tracing::warn!(
                path = %path.display(),
                dropped_bytes = total - len,
                "Output ends with an incomplete record, truncating it"
            );
            file.set_len(len).map_err(output_error)?;
            file.sync_data().map_err(output_error)?;
        }

        tracing::debug!(path = %path.display(), bytes = len, "Output opened for append");

        Ok(Self {
            path,
            file: File::from_std(file),
            dialect,
            len,
            records_written: 0,
        })
    }

    /// Output path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the file holds no records yet
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Records appended by this writer
    pub fn records_written(&self) -> usize {
        self.records_written
    }

    /// Write the header line if the file is empty
    ///
    /// Returns whether a header was written.
    pub async fn write_header_if_empty(&mut self, metric_columns: &[&str]) -> Result<bool> {
        if !self.is_empty() {
            return Ok(false);
        }

        let bytes = self.dialect.format_header(metric_columns)?;
        self.append(&bytes).await?;
        Ok(true)
    }

    /// Append one batch of records
    ///
    /// Returns the number of records written.
    pub async fn write_batch(&mut self, records: &[AggregatedRecord]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        let bytes = self.dialect.format_records(records)?;
        self.append(&bytes).await?;
        self.records_written += records.len();
        Ok(records.len())
    }

    async fn append(&mut self, bytes: &[u8]) -> Result<()> {
        let path = &self.path;
        let output_error = |e: std::io::Error| {
            RevstatsError::OutputWrite(format!("Failed to append to {}: {}", path.display(), e))
        };

        self.file.write_all(bytes).await.map_err(output_error)?;
        self.file.flush().await.map_err(output_error)?;
        self.file.sync_data().await.map_err(output_error)?;
        self.len += bytes.len() as u64;
        Ok(())
    }

    /// Flush and close the file
    pub async fn close(mut self) -> Result<()> {
        self.file.flush().await.map_err(|e| {
            RevstatsError::OutputWrite(format!("Failed to close {}: {}", self.path.display(), e))
        })?;

        tracing::debug!(
            path = %self.path.display(),
            records = self.records_written,
            "Output closed"
        );
        Ok(())
    }
}
