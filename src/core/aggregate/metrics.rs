//! Metric sub-query definitions
//!
//! A [`MetricQuery`] is a named query template plus the output columns it
//! produces. The template receives the identifiers of one batch as its single
//! parameter and must return one row per identifier that has data, carrying an
//! `id` column and every declared column.

use crate::domain::MetricValue;

/// One output column of a metric sub-query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricColumn {
    /// Column name in the result rows and in the output header
    pub name: String,

    /// Text written when the sub-query returns no row for an identifier
    pub default: String,
}

impl MetricColumn {
    pub fn new(name: impl Into<String>, default: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: default.into(),
        }
    }

    /// Value used for an identifier the sub-query returned no row for
    pub fn default_value(&self) -> MetricValue {
        MetricValue::Text(self.default.clone())
    }
}

/// A named sub-query issued once per batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricQuery {
    /// Sub-query name
    pub name: String,

    /// Query template; `$1` is bound to the batch identifiers
    pub query: String,

    /// Columns the query produces, in output order
    pub columns: Vec<MetricColumn>,
}

impl MetricQuery {
    pub fn new(name: impl Into<String>, query: impl Into<String>, columns: Vec<MetricColumn>) -> Self {
        Self {
            name: name.into(),
            query: query.into(),
            columns,
        }
    }
}

/// Revision statistics over the MediaWiki `revision` table
///
/// Used when the configuration declares no metrics. Produces the columns
/// `revisions, minorEditCount, distinctContributorsCount, firstRevisionDate,
/// firstRevisionBytes`.
pub fn builtin_metrics() -> Vec<MetricQuery> {
    vec![
        MetricQuery::new(
            "revisions",
            "SELECT rev_page AS id, COUNT(*) AS revisions \
             FROM revision WHERE rev_page = ANY($1::bigint[]) GROUP BY rev_page",
            vec![MetricColumn::new("revisions", "0")],
        ),
        MetricQuery::new(
            "minor_edits",
            "SELECT rev_page AS id, COUNT(*) AS \"minorEditCount\" \
             FROM revision WHERE rev_page = ANY($1::bigint[]) AND rev_minor_edit = 1 \
             GROUP BY rev_page",
            vec![MetricColumn::new("minorEditCount", "0")],
        ),
        MetricQuery::new(
            "distinct_contributors",
            "SELECT rev_page AS id, COUNT(DISTINCT rev_actor) AS \"distinctContributorsCount\" \
             FROM revision WHERE rev_page = ANY($1::bigint[]) GROUP BY rev_page",
            vec![MetricColumn::new("distinctContributorsCount", "0")],
        ),
        MetricQuery::new(
            "first_revision",
            "SELECT DISTINCT ON (rev_page) rev_page AS id, \
             rev_timestamp AS \"firstRevisionDate\", rev_len AS \"firstRevisionBytes\" \
             FROM revision WHERE rev_page = ANY($1::bigint[]) \
             ORDER BY rev_page, rev_timestamp ASC, rev_id ASC",
            vec![
                MetricColumn::new("firstRevisionDate", ""),
                MetricColumn::new("firstRevisionBytes", ""),
            ],
        ),
    ]
}
