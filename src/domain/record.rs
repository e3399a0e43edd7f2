//! Record types flowing through the extraction pipeline
//!
//! An [`InputRecord`] is read from the input file, the query gateway returns
//! [`ResultRow`]s for it, and the aggregator merges both into one
//! [`AggregatedRecord`] which the output writer serializes.

use super::errors::GatewayError;
use super::ids::{EntityId, EntityKey};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;

/// Name of the identifier column every result row must carry
pub const ID_COLUMN: &str = "id";

/// A row from the input file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputRecord {
    /// Locale tag of the wiki the page belongs to
    pub lang: String,

    /// Remote-source identifier
    pub id: EntityId,

    /// Display label
    pub name: String,
}

impl InputRecord {
    /// Creates a new input record
    pub fn new(lang: impl Into<String>, id: impl Into<EntityId>, name: impl Into<String>) -> Self {
        Self {
            lang: lang.into(),
            id: id.into(),
            name: name.into(),
        }
    }

    /// Checkpoint identity of this record
    pub fn key(&self) -> EntityKey {
        EntityKey::new(self.lang.as_str(), self.name.as_str())
    }
}

/// A single metric field value returned by the query gateway
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    /// SQL NULL / JSON null, written as an empty field
    Null,
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Text(String),
    Timestamp(DateTime<Utc>),
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Null => Ok(()),
            MetricValue::Integer(v) => write!(f, "{v}"),
            MetricValue::Float(v) => write!(f, "{v}"),
            MetricValue::Boolean(v) => write!(f, "{v}"),
            MetricValue::Text(v) => f.write_str(v),
            MetricValue::Timestamp(v) => write!(f, "{}", v.format("%Y-%m-%dT%H:%M:%SZ")),
        }
    }
}

impl From<serde_json::Value> for MetricValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => MetricValue::Null,
            serde_json::Value::Bool(b) => MetricValue::Boolean(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => MetricValue::Integer(i),
                None => MetricValue::Float(n.as_f64().unwrap_or_default()),
            },
            serde_json::Value::String(s) => MetricValue::Text(s),
            other => MetricValue::Text(other.to_string()),
        }
    }
}

/// One result row of a sub-query, keyed by its own identifier field
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    /// Identifier the row belongs to
    pub id: EntityId,

    /// Metric columns by name (the identifier column excluded)
    pub values: HashMap<String, MetricValue>,
}

impl ResultRow {
    /// Builds a row from named fields, extracting the identifier column
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidResponse`] when the `id` field is absent
    /// or not an integer.
    pub fn from_fields(
        query: &str,
        fields: impl IntoIterator<Item = (String, MetricValue)>,
    ) -> Result<Self, GatewayError> {
        let mut values: HashMap<String, MetricValue> = fields.into_iter().collect();

        let invalid = |message: String| GatewayError::InvalidResponse {
            query: query.to_string(),
            message,
        };

        let id = match values.remove(ID_COLUMN) {
            Some(MetricValue::Integer(i)) => EntityId::new(i),
            Some(MetricValue::Text(s)) => s.parse().map_err(invalid)?,
            Some(other) => {
                return Err(invalid(format!(
                    "identifier column has unsupported value {other:?}"
                )))
            }
            None => return Err(invalid(format!("row has no '{ID_COLUMN}' column"))),
        };

        Ok(Self { id, values })
    }

    /// Value of a metric column, if the row carries it
    pub fn get(&self, column: &str) -> Option<&MetricValue> {
        self.values.get(column)
    }
}

/// The merge of every sub-query result for one input record
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedRecord {
    /// The originating input record
    pub input: InputRecord,

    /// Metric values in output column order
    pub metrics: Vec<(String, MetricValue)>,
}

impl AggregatedRecord {
    /// Checkpoint identity, identical to the input record's
    pub fn key(&self) -> EntityKey {
        self.input.key()
    }

    /// Field values in output order: `lang, id, name, <metrics...>`
    pub fn fields(&self) -> Vec<String> {
        let mut fields = Vec::with_capacity(3 + self.metrics.len());
        fields.push(self.input.lang.clone());
        fields.push(self.input.id.to_string());
        fields.push(self.input.name.clone());
        fields.extend(self.metrics.iter().map(|(_, value)| value.to_string()));
        fields
    }

    /// Value of a metric column by name
    pub fn metric(&self, column: &str) -> Option<&MetricValue> {
        self.metrics
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }
}
