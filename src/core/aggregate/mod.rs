//! Metric sub-queries and their keyed re-aggregation
//!
//! - [`metrics`] - sub-query definitions and the built-in revision metrics
//! - [`aggregator`] - concurrent fan-out and merge by identifier

pub mod aggregator;
pub mod metrics;

pub use aggregator::Aggregator;
pub use metrics::{builtin_metrics, MetricColumn, MetricQuery};
