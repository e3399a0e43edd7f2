//! Checkpoint reconstruction from prior output
//!
//! The output file is its own progress record: every row already written
//! carries the entity key it was produced for. At startup the file is scanned
//! once and the keys collected; the run then skips every input record whose
//! key is in the set.

use crate::core::output::dialect::{Dialect, KEY_COLUMNS};
use crate::core::output::writer::complete_len;
use crate::domain::{CheckpointError, EntityId, EntityKey, Result};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, ErrorKind, Read, Seek, SeekFrom};
use std::path::Path;

/// Set of entity keys already present in the output
#[derive(Debug, Clone, Default)]
pub struct CheckpointSet {
    keys: HashSet<EntityKey>,
}

impl CheckpointSet {
    /// An empty checkpoint, as for a first run
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build the checkpoint from the output file at `path`
    ///
    /// A missing or empty file yields an empty set. An incomplete final record
    /// is ignored; the writer cuts it off before appending.
    ///
    /// # Errors
    ///
    /// Returns [`crate::domain::RevstatsError::CheckpointCorruption`] if the
    /// file cannot be read or a row has fewer than three fields or a
    /// non-integer identifier.
    pub fn build(path: impl AsRef<Path>, dialect: &Dialect) -> Result<Self> {
        let path = path.as_ref();
        let unreadable = |e: std::io::Error| CheckpointError::Unreadable {
            path: path.display().to_string(),
            message: e.to_string(),
        };

        let mut file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No prior output, starting from scratch");
                return Ok(Self::empty());
            }
            Err(e) => return Err(unreadable(e).into()),
        };

        let total = file.metadata().map_err(unreadable)?.len();
        let len = complete_len(&mut file, dialect).map_err(unreadable)?;
        if len < total {
            tracing::warn!(
                path = %path.display(),
                ignored_bytes = total - len,
                "Ignoring incomplete final record of prior output"
            );
        }
        file.seek(SeekFrom::Start(0)).map_err(unreadable)?;

        let set = Self::from_reader(BufReader::new(file).take(len), dialect)?;

        tracing::info!(
            path = %path.display(),
            entities = set.len(),
            "Checkpoint rebuilt from prior output"
        );
        Ok(set)
    }

    /// Build the checkpoint from any reader holding output rows
    ///
    /// # Errors
    ///
    /// Returns [`CheckpointError::Malformed`] with the offending line number.
    pub fn from_reader<R: Read>(reader: R, dialect: &Dialect) -> std::result::Result<Self, CheckpointError> {
        let mut rows = dialect.reader_builder().from_reader(reader);
        let mut keys = HashSet::new();
        let mut first = true;

        for row in rows.records() {
            let row = row.map_err(|e| CheckpointError::Malformed {
                line: e.position().map(|p| p.line()).unwrap_or_default(),
                message: e.to_string(),
            })?;
            let line = row.position().map(|p| p.line()).unwrap_or_default();

            if std::mem::take(&mut first) && is_header(&row) {
                continue;
            }

            if row.len() < KEY_COLUMNS.len() {
                return Err(CheckpointError::Malformed {
                    line,
                    message: format!(
                        "expected at least {} fields, found {}",
                        KEY_COLUMNS.len(),
                        row.len()
                    ),
                });
            }

            row[1]
                .parse::<EntityId>()
                .map_err(|message| CheckpointError::Malformed { line, message })?;

            keys.insert(EntityKey::new(&row[0], &row[2]));
        }

        Ok(Self { keys })
    }

    /// Whether `key` was already written
    pub fn contains(&self, key: &EntityKey) -> bool {
        self.keys.contains(key)
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether no key was found
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

fn is_header(row: &csv::StringRecord) -> bool {
    row.len() >= KEY_COLUMNS.len()
        && row.iter().zip(KEY_COLUMNS).all(|(field, column)| field == column)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RevstatsError;
    use tempfile::TempDir;

    fn parse(contents: &str) -> std::result::Result<CheckpointSet, CheckpointError> {
        CheckpointSet::from_reader(contents.as_bytes(), &Dialect::default())
    }

    #[test]
    fn test_collects_keys() {
        let set = parse("en,50,A,3\nen,51,\"B,C\",7\n").unwrap();

        assert_eq!(set.len(), 2);
        assert!(set.contains(&EntityKey::new("en", "A")));
        assert!(set.contains(&EntityKey::new("en", "B,C")));
        assert!(!set.contains(&EntityKey::new("fr", "A")));
    }

    #[test]
    fn test_skips_header() {
        let set = parse("lang,id,name,revisions\nen,50,A,3\n").unwrap();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_header_only_recognized_on_first_row() {
        let err = parse("en,50,A,3\nlang,id,name,revisions\n").unwrap_err();
        assert!(matches!(err, CheckpointError::Malformed { line: 2, .. }));
    }

    #[test]
    fn test_short_row_is_corruption() {
        let err = parse("en,50,A,3\nen,51\n").unwrap_err();
        match err {
            CheckpointError::Malformed { line, message } => {
                assert_eq!(line, 2);
                assert!(message.contains("at least 3"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_non_integer_id_is_corruption() {
        let err = parse("en,abc,A,3\n").unwrap_err();
        assert!(matches!(err, CheckpointError::Malformed { line: 1, .. }));
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let set = CheckpointSet::build(dir.path().join("none.csv"), &Dialect::default()).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_empty_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        std::fs::write(&path, "").unwrap();

        let set = CheckpointSet::build(&path, &Dialect::default()).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_ignores_unterminated_final_line() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        std::fs::write(&path, "en,50,A,3\nen,5").unwrap();

        let set = CheckpointSet::build(&path, &Dialect::default()).unwrap();
        assert_eq!(set.len(), 1);
        assert!(set.contains(&EntityKey::new("en", "A")));
    }

    #[test]
    fn test_ignores_record_torn_inside_quotes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        std::fs::write(&path, "en,50,A,3\nen,51,\"X\n").unwrap();

        let set = CheckpointSet::build(&path, &Dialect::default()).unwrap();
        assert_eq!(set.len(), 1);
        assert!(!set.contains(&EntityKey::new("en", "X\n")));
    }

    #[test]
    fn test_build_reports_corruption() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        std::fs::write(&path, "garbage\n").unwrap();

        let err = CheckpointSet::build(&path, &Dialect::default()).unwrap_err();
        assert!(matches!(err, RevstatsError::CheckpointCorruption(_)));
    }
}
