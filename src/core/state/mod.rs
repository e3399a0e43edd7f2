//! Run state derived from prior output
//!
//! - [`checkpoint`] - the set of entity keys already written
//! - [`progress`] - done/remaining counts for `--status`

pub mod checkpoint;
pub mod progress;

pub use checkpoint::CheckpointSet;
pub use progress::{measure_progress, ProgressReport};
