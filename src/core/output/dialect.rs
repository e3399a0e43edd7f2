//! Delimited text dialect shared by the output writer and the checkpoint reader
//!
//! Fields are written raw unless they contain the delimiter, a double quote or
//! a line break; those are wrapped in double quotes with embedded quotes
//! doubled. Records end with `\n`. Reading back with [`Dialect::reader_builder`]
//! reproduces every written value.

use crate::domain::{AggregatedRecord, Result, RevstatsError};
use csv::{QuoteStyle, ReaderBuilder, Terminator, WriterBuilder};

/// Leading output columns, before the metric columns
pub const KEY_COLUMNS: [&str; 3] = ["lang", "id", "name"];

/// Delimited text dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dialect {
    delimiter: u8,
}

impl Default for Dialect {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl Dialect {
    /// Create a dialect for a single-byte delimiter
    ///
    /// # Errors
    ///
    /// Returns [`RevstatsError::Configuration`] if the delimiter is not ASCII,
    /// is a line break or is the quote character.
    pub fn new(delimiter: char) -> Result<Self> {
        if !delimiter.is_ascii() || matches!(delimiter, '"' | '\n' | '\r') {
            return Err(RevstatsError::Configuration(format!(
                "delimiter must be a single ASCII character other than a quote or line break, got {delimiter:?}"
            )));
        }
        Ok(Self {
            delimiter: delimiter as u8,
        })
    }

    /// Delimiter byte
    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    /// Reader for files in this dialect; header handling is left to the caller
    pub fn reader_builder(&self) -> ReaderBuilder {
        let mut builder = ReaderBuilder::new();
        builder
            .delimiter(self.delimiter)
            .has_headers(false)
            .flexible(true);
        builder
    }

    fn writer_builder(&self) -> WriterBuilder {
        let mut builder = WriterBuilder::new();
        builder
            .delimiter(self.delimiter)
            .has_headers(false)
            .quote_style(QuoteStyle::Necessary)
            .terminator(Terminator::Any(b'\n'));
        builder
    }

    /// Serialize records into one buffer, one line each
    pub fn format_records(&self, records: &[AggregatedRecord]) -> Result<Vec<u8>> {
        let mut writer = self.writer_builder().from_writer(Vec::new());
        for record in records {
            writer.write_record(record.fields())?;
        }
        self.finish(writer)
    }

    /// Serialize the header line for the given metric columns
    pub fn format_header(&self, metric_columns: &[&str]) -> Result<Vec<u8>> {
        let mut writer = self.writer_builder().from_writer(Vec::new());
        writer.write_record(KEY_COLUMNS.iter().chain(metric_columns.iter()))?;
        self.finish(writer)
    }

    fn finish(&self, writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>> {
        writer
            .into_inner()
            .map_err(|e| RevstatsError::Serialization(format!("CSV error: {}", e.error())))
    }
}
