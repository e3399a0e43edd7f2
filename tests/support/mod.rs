//! Shared fixtures for the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use revstats::config::{parse_config, RevstatsConfig};
use revstats::core::aggregate::MetricQuery;
use revstats::domain::{EntityId, GatewayError, MetricValue, ResultRow};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Configuration with a `count` and a `minor_edits` metric over a dummy HTTP gateway
pub fn pipeline_config(batch_size: usize) -> RevstatsConfig {
    parse_config(&format!(
        r#"
gateway_target = "http"

[http]
base_url = "http://localhost:9"

[extract]
batch_size = {batch_size}

[[metrics]]
name = "count"
query = "SELECT rev_page AS id, COUNT(*) AS count FROM revision WHERE rev_page = ANY($1) GROUP BY rev_page"
columns = [{{ name = "count", default = "0" }}]

[[metrics]]
name = "minor_edits"
query = "SELECT rev_page AS id, COUNT(*) AS minor_edits FROM revision WHERE rev_minor_edit AND rev_page = ANY($1) GROUP BY rev_page"
columns = [{{ name = "minor_edits", default = "0" }}]
"#
    ))
    .expect("pipeline config is valid")
}

/// One recorded sub-query call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub metric: String,
    pub ids: Vec<i64>,
}

/// In-memory gateway with canned rows per metric
#[derive(Default)]
pub struct RecordingGateway {
    rows: HashMap<String, HashMap<i64, Vec<(String, MetricValue)>>>,
    failures: Vec<(String, i64)>,
    calls: Mutex<Vec<Call>>,
    closed: AtomicBool,
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `metric` for `id` with a single integer column named after the metric
    pub fn with_count(mut self, metric: &str, id: i64, value: i64) -> Self {
        self.rows
            .entry(metric.to_string())
            .or_default()
            .insert(id, vec![(metric.to_string(), MetricValue::Integer(value))]);
        self
    }

    /// Fail `metric` whenever its identifier set contains `id`
    pub fn failing(mut self, metric: &str, id: i64) -> Self {
        self.failures.push((metric.to_string(), id));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, metric: &str) -> Vec<Vec<i64>> {
        self.calls()
            .into_iter()
            .filter(|c| c.metric == metric)
            .map(|c| c.ids)
            .collect()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl revstats::adapters::gateway::QueryGateway for RecordingGateway {
    fn name(&self) -> &str {
        "recording"
    }

    async fn run_query(
        &self,
        metric: &MetricQuery,
        ids: &[EntityId],
    ) -> Result<Vec<ResultRow>, GatewayError> {
        let ids: Vec<i64> = ids.iter().map(EntityId::value).collect();
        self.calls.lock().unwrap().push(Call {
            metric: metric.name.clone(),
            ids: ids.clone(),
        });

        if self
            .failures
            .iter()
            .any(|(name, id)| *name == metric.name && ids.contains(id))
        {
            return Err(GatewayError::QueryFailed {
                query: metric.name.clone(),
                message: "canceling statement due to statement timeout".to_string(),
            });
        }

        let Some(by_id) = self.rows.get(&metric.name) else {
            return Ok(Vec::new());
        };

        ids.iter()
            .filter_map(|id| by_id.get(id).map(|fields| (id, fields)))
            .map(|(id, fields)| {
                let mut row = vec![("id".to_string(), MetricValue::Integer(*id))];
                row.extend(fields.iter().cloned());
                ResultRow::from_fields(&metric.name, row)
            })
            .collect()
    }

    async fn close(&self) -> Result<(), GatewayError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
