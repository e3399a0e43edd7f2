//! Query gateway abstraction
//!
//! This module defines the trait every remote query backend implements to
//! serve metric sub-queries for revstats.

use crate::core::aggregate::metrics::MetricQuery;
use crate::domain::{EntityId, GatewayError, ResultRow};
use async_trait::async_trait;

/// Executes metric sub-queries against a remote source
///
/// Implementations must be safe to call concurrently: the aggregator issues
/// every sub-query of a batch at the same time through one shared gateway.
#[async_trait]
pub trait QueryGateway: Send + Sync {
    /// Short backend name used in logs
    fn name(&self) -> &str;

    /// Test the connection to the remote source
    ///
    /// # Errors
    ///
    /// Returns an error if the remote source cannot be reached or rejects the
    /// credentials.
    async fn test_connection(&self) -> Result<(), GatewayError> {
        Ok(())
    }

    /// Run one metric sub-query for a set of identifiers
    ///
    /// `ids` is bound to the query's single parameter. Rows come back in any
    /// order, at most one per identifier that has data; each row carries its
    /// own identifier.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] on connection, authentication, query or
    /// response-shape failures.
    async fn run_query(
        &self,
        metric: &MetricQuery,
        ids: &[EntityId],
    ) -> Result<Vec<ResultRow>, GatewayError>;

    /// Release connections held by the gateway
    async fn close(&self) -> Result<(), GatewayError>;
}
