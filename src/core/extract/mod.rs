//! Extraction orchestration
//!
//! - [`coordinator`] - the run state machine
//! - [`summary`] - counters reported at the end of a run

pub mod coordinator;
pub mod summary;

pub use coordinator::{ExtractCoordinator, ExtractOptions, RunState};
pub use summary::ExtractSummary;
