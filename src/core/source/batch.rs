//! Batching and checkpoint filtering
//!
//! [`Batches`] groups a record stream into fixed-size, order-preserving
//! windows. [`filter_batch`] then drops the records that need no work before
//! any sub-query is issued.

use crate::core::state::CheckpointSet;
use crate::domain::{EntityKey, InputRecord};
use std::collections::HashSet;

/// Fixed-size windows over a fallible record stream
///
/// The last window may be short. An error from the inner stream is yielded
/// in place of the window it interrupted, and ends the sequence.
pub struct Batches<I> {
    inner: I,
    size: usize,
    finished: bool,
}

impl<I> Batches<I> {
    /// Group `inner` into windows of `size` items
    ///
    /// A `size` of zero is treated as one; configuration validation rejects
    /// it before a run starts.
    pub fn new(inner: I, size: usize) -> Self {
        Self {
            inner,
            size: size.max(1),
            finished: false,
        }
    }
}

impl<I, T, E> Iterator for Batches<I>
where
    I: Iterator<Item = Result<T, E>>,
{
    type Item = Result<Vec<T>, E>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let mut batch = Vec::with_capacity(self.size);
        while batch.len() < self.size {
            match self.inner.next() {
                Some(Ok(item)) => batch.push(item),
                Some(Err(e)) => {
                    self.finished = true;
                    return Some(Err(e));
                }
                None => {
                    self.finished = true;
                    break;
                }
            }
        }

        if batch.is_empty() {
            None
        } else {
            Some(Ok(batch))
        }
    }
}

/// Shorthand for [`Batches::new`]
pub fn batched<I>(inner: I, size: usize) -> Batches<I> {
    Batches::new(inner, size)
}

/// A batch after checkpoint filtering
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilteredBatch {
    /// Records that still need querying, in input order
    pub records: Vec<InputRecord>,

    /// Records skipped because the prior output already holds them
    pub checkpointed: usize,

    /// Records skipped because an earlier record of this run had the same key
    pub duplicates: usize,
}

impl FilteredBatch {
    /// Whether nothing survived filtering
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Drop records already in the checkpoint or already emitted in this run
///
/// Surviving keys are added to `emitted`; the checkpoint itself is not
/// modified.
pub fn filter_batch(
    batch: Vec<InputRecord>,
    checkpoint: &CheckpointSet,
    emitted: &mut HashSet<EntityKey>,
) -> FilteredBatch {
    let mut filtered = FilteredBatch {
        records: Vec::with_capacity(batch.len()),
        ..FilteredBatch::default()
    };

    for record in batch {
        let key = record.key();
        if checkpoint.contains(&key) {
            filtered.checkpointed += 1;
        } else if !emitted.insert(key) {
            tracing::debug!(lang = %record.lang, name = %record.name, "Skipping repeated input key");
            filtered.duplicates += 1;
        } else {
            filtered.records.push(record);
        }
    }

    filtered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::output::Dialect;

    fn ok_items(n: usize) -> impl Iterator<Item = Result<usize, String>> {
        (0..n).map(Ok)
    }

    #[test]
    fn test_last_batch_is_short() {
        let batches: Vec<Vec<usize>> = batched(ok_items(5), 2)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(batches, vec![vec![0, 1], vec![2, 3], vec![4]]);
    }

    #[test]
    fn test_error_ends_sequence() {
        let items = vec![Ok(1), Ok(2), Err("bad".to_string()), Ok(4)];
        let mut batches = batched(items.into_iter(), 10);

        assert_eq!(batches.next(), Some(Err("bad".to_string())));
        assert_eq!(batches.next(), None);
    }

    #[test]
    fn test_zero_size_is_one() {
        assert_eq!(batched(ok_items(3), 0).count(), 3);
    }

    #[test]
    fn test_filter_batch() {
        let checkpoint = CheckpointSet::from_reader("en,50,A,3\n".as_bytes(), &Dialect::default())
            .unwrap();
        let mut emitted = HashSet::new();

        let batch = vec![
            InputRecord::new("en", 50, "A"),
            InputRecord::new("en", 51, "B"),
            InputRecord::new("fr", 50, "A"),
            InputRecord::new("en", 52, "B"),
        ];
        let filtered = filter_batch(batch, &checkpoint, &mut emitted);

        assert_eq!(
            filtered.records,
            vec![InputRecord::new("en", 51, "B"), InputRecord::new("fr", 50, "A")]
        );
        assert_eq!(filtered.checkpointed, 1);
        assert_eq!(filtered.duplicates, 1);
        assert!(!checkpoint.contains(&EntityKey::new("en", "B")));
    }

    #[test]
    fn test_duplicates_tracked_across_batches() {
        let checkpoint = CheckpointSet::empty();
        let mut emitted = HashSet::new();

        filter_batch(vec![InputRecord::new("en", 1, "A")], &checkpoint, &mut emitted);
        let second = filter_batch(vec![InputRecord::new("en", 1, "A")], &checkpoint, &mut emitted);

        assert!(second.is_empty());
        assert_eq!(second.duplicates, 1);
    }
}
