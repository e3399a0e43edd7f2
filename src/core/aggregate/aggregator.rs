//! Query fan-out and keyed re-aggregation
//!
//! For one filtered batch the aggregator issues every configured metric
//! sub-query concurrently, waits for all of them, and merges their rows by
//! identifier into one [`AggregatedRecord`] per input record.

use super::metrics::MetricQuery;
use crate::adapters::gateway::QueryGateway;
use crate::domain::{
    AggregatedRecord, EntityId, GatewayError, InputRecord, MetricValue, Result, ResultRow,
};
use futures::future::try_join_all;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

/// Rows returned by one metric sub-query
#[derive(Debug)]
struct SubQueryResult<'a> {
    metric: &'a MetricQuery,
    rows: Vec<ResultRow>,
}

/// identifier -> metric name -> row
type RowIndex<'a> = HashMap<EntityId, HashMap<&'a str, &'a ResultRow>>;

/// Fans a batch out to the metric sub-queries and merges the results
#[derive(Debug, Clone)]
pub struct Aggregator {
    metrics: Arc<[MetricQuery]>,
}

impl Aggregator {
    /// Create an aggregator over the given metric sub-queries
    pub fn new(metrics: Vec<MetricQuery>) -> Self {
        Self {
            metrics: metrics.into(),
        }
    }

    /// Configured sub-queries
    pub fn metrics(&self) -> &[MetricQuery] {
        &self.metrics
    }

    /// Metric column names in output order
    pub fn output_columns(&self) -> Vec<&str> {
        self.metrics
            .iter()
            .flat_map(|m| m.columns.iter().map(|c| c.name.as_str()))
            .collect()
    }

    /// Aggregate one filtered batch
    ///
    /// Every sub-query receives the full, de-duplicated identifier set of the
    /// batch. The join is all-or-nothing: the first failing sub-query fails
    /// the batch and nothing is returned for it. An identifier a sub-query has
    /// no row for gets the column defaults.
    ///
    /// # Errors
    ///
    /// Returns [`crate::domain::RevstatsError::QueryGateway`] if any sub-query
    /// fails or returns rows that are missing a declared column.
    pub async fn aggregate(
        &self,
        batch: &[InputRecord],
        gateway: &dyn QueryGateway,
    ) -> Result<Vec<AggregatedRecord>> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }

        let ids = unique_ids(batch);
        let ids = ids.as_slice();

        let results = try_join_all(self.metrics.iter().map(|metric| async move {
            let started = Instant::now();
            let rows = gateway.run_query(metric, ids).await?;
            tracing::debug!(
                metric = %metric.name,
                gateway = gateway.name(),
                ids = ids.len(),
                rows = rows.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Sub-query completed"
            );
            Ok::<_, GatewayError>(SubQueryResult { metric, rows })
        }))
        .await?;

        let index = index_rows(&results)?;

        Ok(batch
            .iter()
            .map(|record| self.assemble(record, &index))
            .collect())
    }

    fn assemble(&self, record: &InputRecord, index: &RowIndex<'_>) -> AggregatedRecord {
        let rows = index.get(&record.id);
        let mut metrics = Vec::new();

        for metric in self.metrics.iter() {
            let row = rows.and_then(|by_metric| by_metric.get(metric.name.as_str()));
            for column in &metric.columns {
                let value = row
                    .and_then(|row| row.get(&column.name))
                    .cloned()
                    .unwrap_or_else(|| column.default_value());
                metrics.push((column.name.clone(), value));
            }
        }

        AggregatedRecord {
            input: record.clone(),
            metrics,
        }
    }
}

/// Identifiers of a batch in first-seen order, without repeats
fn unique_ids(batch: &[InputRecord]) -> Vec<EntityId> {
    let mut seen = HashSet::with_capacity(batch.len());
    batch
        .iter()
        .map(|record| record.id)
        .filter(|id| seen.insert(*id))
        .collect()
}

/// Index every row by its own identifier field
///
/// Rows are matched on the identifier they carry, never on position. When a
/// sub-query returns the same identifier twice the first row wins.
fn index_rows<'a>(
    results: &'a [SubQueryResult<'a>],
) -> std::result::Result<RowIndex<'a>, GatewayError> {
    let mut index: RowIndex<'a> = HashMap::new();

    for result in results {
        for row in &result.rows {
            if let Some(column) = result
                .metric
                .columns
                .iter()
                .find(|c| !row.values.contains_key(&c.name))
            {
                return Err(GatewayError::InvalidResponse {
                    query: result.metric.name.clone(),
                    message: format!("row for id {} has no '{}' column", row.id, column.name),
                });
            }

            let by_metric = index.entry(row.id).or_default();
            if by_metric.contains_key(result.metric.name.as_str()) {
                tracing::warn!(
                    metric = %result.metric.name,
                    id = %row.id,
                    "Sub-query returned duplicate rows for identifier, keeping the first"
                );
                continue;
            }
            by_metric.insert(result.metric.name.as_str(), row);
        }
    }

    Ok(index)
}
