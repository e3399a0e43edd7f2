//! Input streaming
//!
//! - [`reader`] - the input record source
//! - [`batch`] - fixed-size batching and checkpoint filtering

pub mod batch;
pub mod reader;

pub use batch::{batched, filter_batch, Batches, FilteredBatch};
pub use reader::{RecordSource, SourceOptions};
