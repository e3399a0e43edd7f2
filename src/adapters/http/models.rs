//! Wire models for the HTTP query endpoint

use crate::domain::{EntityId, GatewayError, MetricValue, ResultRow};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Body posted to `<base_url>/query`
#[derive(Debug, Clone, Serialize)]
pub struct QueryRequest<'a> {
    /// Sub-query text
    pub q: &'a str,

    /// Bound parameters
    pub query_parameters: QueryParameters<'a>,

    /// Sub-query name, echoed in server logs
    pub name: &'a str,
}

/// Parameters of a [`QueryRequest`]
#[derive(Debug, Clone, Serialize)]
pub struct QueryParameters<'a> {
    pub ids: &'a [EntityId],
}

/// Response of the query endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub rows: Vec<Map<String, Value>>,
}

impl QueryResponse {
    /// Convert every JSON row into a [`ResultRow`]
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidResponse`] if a row has no usable `id`.
    pub fn into_rows(self, query: &str) -> Result<Vec<ResultRow>, GatewayError> {
        self.rows
            .into_iter()
            .map(|row| {
                ResultRow::from_fields(
                    query,
                    row.into_iter().map(|(k, v)| (k, MetricValue::from(v))),
                )
            })
            .collect()
    }
}
