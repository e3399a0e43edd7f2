//! Input record source
//!
//! Streams [`InputRecord`]s from a delimited file with a header row. The file
//! is read through a buffered synchronous `csv::Reader`; records are pulled one
//! at a time so memory stays bounded by one batch.

use crate::core::output::Dialect;
use crate::domain::{EntityId, InputRecord, RecordSourceError, Result};
use csv::{StringRecord, Trim};
use std::fs::File;
use std::io::Read;
use std::path::Path;

const ID: &str = "id";
const NAME: &str = "name";
const LANG: &str = "lang";

/// Options for reading the input
#[derive(Debug, Clone)]
pub struct SourceOptions {
    /// Input dialect
    pub dialect: Dialect,

    /// Language used when the `lang` column is absent or empty
    pub default_lang: String,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            default_lang: "en".to_string(),
        }
    }
}

/// Header positions of the columns the pipeline reads
#[derive(Debug, Clone, Copy)]
struct Columns {
    id: usize,
    name: usize,
    lang: Option<usize>,
}

impl Columns {
    fn from_header(header: &StringRecord) -> std::result::Result<Self, RecordSourceError> {
        let position = |column: &str| header.iter().position(|h| h == column);
        let required = |column: &str| {
            position(column).ok_or_else(|| RecordSourceError::MissingColumn(column.to_string()))
        };

        Ok(Self {
            id: required(ID)?,
            name: required(NAME)?,
            lang: position(LANG),
        })
    }
}

/// Lazy, single-pass sequence of input records in file order
///
/// Extra columns are ignored. Iteration stops after the first error.
pub struct RecordSource<R: Read> {
    reader: csv::Reader<R>,
    columns: Columns,
    default_lang: String,
    record: StringRecord,
    finished: bool,
}

impl RecordSource<File> {
    /// Open the input file at `path`
    ///
    /// # Errors
    ///
    /// Returns [`crate::domain::RevstatsError::RecordSource`] if the file cannot
    /// be opened or its header lacks `id` or `name`.
    pub fn open(path: impl AsRef<Path>, options: SourceOptions) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| RecordSourceError::Unreadable {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        tracing::debug!(path = %path.display(), "Input opened");
        Self::from_reader(file, options)
    }
}

impl<R: Read> RecordSource<R> {
    /// Read records from any reader
    ///
    /// # Errors
    ///
    /// Returns [`crate::domain::RevstatsError::RecordSource`] if the header
    /// cannot be read or lacks `id` or `name`.
    pub fn from_reader(reader: R, options: SourceOptions) -> Result<Self> {
        let mut reader = options
            .dialect
            .reader_builder()
            .has_headers(true)
            .trim(Trim::Headers)
            .from_reader(reader);

        let header = reader.headers().map_err(|e| RecordSourceError::Malformed {
            line: 1,
            message: e.to_string(),
        })?;
        let columns = Columns::from_header(header)?;

        Ok(Self {
            reader,
            columns,
            default_lang: options.default_lang,
            record: StringRecord::new(),
            finished: false,
        })
    }

    fn parse_record(&self) -> std::result::Result<InputRecord, RecordSourceError> {
        let line = self
            .record
            .position()
            .map(|p| p.line())
            .unwrap_or_default();
        let malformed = |message: String| RecordSourceError::Malformed { line, message };
        let field = |idx: usize, column: &str| {
            self.record
                .get(idx)
                .ok_or_else(|| malformed(format!("missing '{column}' field")))
        };

        let id: EntityId = field(self.columns.id, ID)?.parse().map_err(malformed)?;

        let name = field(self.columns.name, NAME)?;
        if name.trim().is_empty() {
            return Err(malformed("'name' is empty".to_string()));
        }

        let lang = self
            .columns
            .lang
            .and_then(|idx| self.record.get(idx))
            .map(str::trim)
            .filter(|lang| !lang.is_empty())
            .unwrap_or(self.default_lang.as_str());

        Ok(InputRecord::new(lang, id, name))
    }
}

impl<R: Read> Iterator for RecordSource<R> {
    type Item = Result<InputRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let result = match self.reader.read_record(&mut self.record) {
            Ok(true) => self.parse_record(),
            Ok(false) => {
                self.finished = true;
                return None;
            }
            Err(e) => Err(RecordSourceError::Malformed {
                line: e.position().map(|p| p.line()).unwrap_or_default(),
                message: e.to_string(),
            }),
        };

        if result.is_err() {
            self.finished = true;
        }
        Some(result.map_err(Into::into))
    }
}
