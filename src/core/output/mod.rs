//! Output serialization and append-only writing
//!
//! - [`dialect`] - the delimited text dialect shared with the checkpoint reader
//! - [`writer`] - per-batch durable appends

pub mod dialect;
pub mod writer;

pub use dialect::{Dialect, KEY_COLUMNS};
pub use writer::OutputWriter;
