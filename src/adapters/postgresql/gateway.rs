//! PostgreSQL implementation of [`QueryGateway`]

use super::client::PostgreSQLClient;
use crate::adapters::gateway::QueryGateway;
use crate::core::aggregate::metrics::MetricQuery;
use crate::domain::{EntityId, GatewayError, MetricValue, ResultRow};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use std::error::Error;
use tokio_postgres::types::{FromSql, Type};
use tokio_postgres::Row;

/// Runs metric sub-queries on a PostgreSQL replica
///
/// The batch identifiers are bound as a `bigint[]` to `$1`.
pub struct PostgreSQLGateway {
    client: PostgreSQLClient,
}

impl PostgreSQLGateway {
    /// Create a new gateway over a client
    pub fn new(client: PostgreSQLClient) -> Self {
        Self { client }
    }

    /// Get a reference to the underlying client
    pub fn client(&self) -> &PostgreSQLClient {
        &self.client
    }
}

#[async_trait]
impl QueryGateway for PostgreSQLGateway {
    fn name(&self) -> &str {
        "postgresql"
    }

    async fn test_connection(&self) -> Result<(), GatewayError> {
        self.client.test_connection().await
    }

    async fn run_query(
        &self,
        metric: &MetricQuery,
        ids: &[EntityId],
    ) -> Result<Vec<ResultRow>, GatewayError> {
        let ids: Vec<i64> = ids.iter().map(EntityId::value).collect();

        let rows = self
            .client
            .query(&metric.name, &metric.query, &[&ids])
            .await?;

        rows.iter().map(|row| convert_row(&metric.name, row)).collect()
    }

    async fn close(&self) -> Result<(), GatewayError> {
        self.client.close();
        tracing::debug!("PostgreSQL pool closed");
        Ok(())
    }
}

fn convert_row(query: &str, row: &Row) -> Result<ResultRow, GatewayError> {
    let fields = row
        .columns()
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            convert_value(row, idx, column.type_())
                .map(|value| (column.name().to_string(), value))
                .map_err(|message| GatewayError::InvalidResponse {
                    query: query.to_string(),
                    message: format!("column '{}': {}", column.name(), message),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    ResultRow::from_fields(query, fields)
}

/// Convert one column of a row
fn convert_value(row: &Row, idx: usize, ty: &Type) -> Result<MetricValue, String> {
    fn get<'a, T>(row: &'a Row, idx: usize) -> Result<Option<T>, String>
    where
        T: tokio_postgres::types::FromSql<'a>,
    {
        row.try_get::<_, Option<T>>(idx).map_err(|e| e.to_string())
    }

    let value = match *ty {
        Type::INT2 => get::<i16>(row, idx)?.map(|v| MetricValue::Integer(i64::from(v))),
        Type::INT4 => get::<i32>(row, idx)?.map(|v| MetricValue::Integer(i64::from(v))),
        Type::INT8 => get::<i64>(row, idx)?.map(MetricValue::Integer),
        Type::FLOAT4 => get::<f32>(row, idx)?.map(|v| MetricValue::Float(f64::from(v))),
        Type::FLOAT8 => get::<f64>(row, idx)?.map(MetricValue::Float),
        Type::NUMERIC => get::<NumericText>(row, idx)?.map(|v| MetricValue::Text(v.0)),
        Type::BOOL => get::<bool>(row, idx)?.map(MetricValue::Boolean),
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => {
            get::<String>(row, idx)?.map(MetricValue::Text)
        }
        Type::BYTEA => get::<Vec<u8>>(row, idx)?
            .map(|v| MetricValue::Text(String::from_utf8_lossy(&v).into_owned())),
        Type::TIMESTAMPTZ => get::<DateTime<Utc>>(row, idx)?.map(MetricValue::Timestamp),
        Type::TIMESTAMP => {
            get::<NaiveDateTime>(row, idx)?.map(|v| MetricValue::Timestamp(v.and_utc()))
        }
        ref other => return Err(format!("unsupported column type '{}'", other)),
    };

    Ok(value.unwrap_or(MetricValue::Null))
}

/// `numeric` value rendered as its decimal text
///
/// Decoded from the binary wire format: a header of digit count, weight, sign
/// and display scale, followed by base-10000 digits.
#[derive(Debug, Clone, PartialEq, Eq)]
struct NumericText(String);

const NUMERIC_NEG: u16 = 0x4000;
const NUMERIC_NAN: u16 = 0xC000;
const NUMERIC_PINF: u16 = 0xD000;
const NUMERIC_NINF: u16 = 0xF000;

impl<'a> FromSql<'a> for NumericText {
    fn from_sql(_ty: &Type, raw: &'a [u8]) -> Result<Self, Box<dyn Error + Sync + Send>> {
        let word = |i: usize| -> Result<u16, Box<dyn Error + Sync + Send>> {
            raw.get(i * 2..i * 2 + 2)
                .map(|b| u16::from_be_bytes([b[0], b[1]]))
                .ok_or_else(|| "truncated numeric value".into())
        };

        let ndigits = word(0)? as usize;
        let weight = word(1)? as i16 as i64;
        let sign = word(2)?;
        let dscale = word(3)? as usize;

        match sign {
            NUMERIC_NAN => return Ok(Self("NaN".to_string())),
            NUMERIC_PINF => return Ok(Self("Infinity".to_string())),
            NUMERIC_NINF => return Ok(Self("-Infinity".to_string())),
            _ => {}
        }

        let digits = (0..ndigits)
            .map(|i| word(4 + i))
            .collect::<Result<Vec<_>, _>>()?;
        let digit = |i: i64| -> u16 {
            usize::try_from(i)
                .ok()
                .and_then(|i| digits.get(i).copied())
                .unwrap_or(0)
        };

        let mut text = String::new();
        if sign == NUMERIC_NEG {
            text.push('-');
        }

        if weight < 0 {
            text.push('0');
        } else {
            text.push_str(&digit(0).to_string());
            for i in 1..=weight {
                text.push_str(&format!("{:04}", digit(i)));
            }
        }

        if dscale > 0 {
            let groups = dscale.div_ceil(4) as i64;
            let fraction: String = (0..groups)
                .map(|k| format!("{:04}", digit(weight + 1 + k)))
                .collect();
            text.push('.');
            text.push_str(&fraction[..dscale]);
        }

        Ok(Self(text))
    }

    fn accepts(ty: &Type) -> bool {
        *ty == Type::NUMERIC
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(ndigits: u16, weight: i16, sign: u16, dscale: u16, digits: &[u16]) -> Vec<u8> {
        let mut raw = Vec::new();
        for word in [ndigits, weight as u16, sign, dscale] {
            raw.extend_from_slice(&word.to_be_bytes());
        }
        for d in digits {
            raw.extend_from_slice(&d.to_be_bytes());
        }
        raw
    }

    fn decode(raw: &[u8]) -> String {
        NumericText::from_sql(&Type::NUMERIC, raw).unwrap().0
    }

    #[test]
    fn test_numeric_integer() {
        // 12345 = 1 * 10000 + 2345
        assert_eq!(decode(&encode(2, 1, 0, 0, &[1, 2345])), "12345");
    }

    #[test]
    fn test_numeric_with_fraction() {
        // -3.14
        assert_eq!(decode(&encode(2, 0, NUMERIC_NEG, 2, &[3, 1400])), "-3.14");
    }

    #[test]
    fn test_numeric_small_fraction() {
        // 0.00012 = digits [1, 2000] at weight -1
        assert_eq!(decode(&encode(2, -1, 0, 5, &[1, 2000])), "0.00012");
    }

    #[test]
    fn test_numeric_trailing_zero_groups() {
        // 20000 has weight 1 and a single stored digit
        assert_eq!(decode(&encode(1, 1, 0, 0, &[2])), "20000");
        assert_eq!(decode(&encode(0, 0, 0, 0, &[])), "0");
    }

    #[test]
    fn test_numeric_special_values() {
        assert_eq!(decode(&encode(0, 0, NUMERIC_NAN, 0, &[])), "NaN");
        assert_eq!(decode(&encode(0, 0, NUMERIC_NINF, 0, &[])), "-Infinity");
    }

    #[test]
    fn test_truncated_numeric_is_rejected() {
        assert!(NumericText::from_sql(&Type::NUMERIC, &[0, 1]).is_err());
    }
}
