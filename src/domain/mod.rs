//! Domain models and types for revstats.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Identifiers** ([`EntityId`], [`EntityKey`])
//! - **Records** ([`InputRecord`], [`ResultRow`], [`AggregatedRecord`])
//! - **Error types** ([`RevstatsError`] and its per-stage sources)
//! - **Result type alias** ([`Result`])
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, RevstatsError>`]:
//!
//! ```rust,no_run
//! use revstats::domain::Result;
//!
//! fn example() -> Result<()> {
//!     let config = revstats::config::load_config("revstats.toml")?;
//!     println!("batch size: {}", config.extract.batch_size);
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod ids;
pub mod record;
pub mod result;

pub use errors::{CheckpointError, GatewayError, RecordSourceError, RevstatsError};
pub use ids::{EntityId, EntityKey};
pub use record::{AggregatedRecord, InputRecord, MetricValue, ResultRow};
pub use result::Result;
