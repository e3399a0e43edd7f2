//! Configuration management for revstats.
//!
//! # Overview
//!
//! revstats uses TOML configuration files with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `REVSTATS_*` environment overrides
//! - Default values for optional settings
//! - Validation on load
//!
//! The configuration holds the query gateway credentials and the metric
//! sub-queries; input and output paths come from the command line.
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - log level, dry run
//! - [`PostgreSQLConfig`] / [`HttpGatewayConfig`] - query gateway connection
//! - [`ExtractConfig`] - batch size, default language, delimiter, header
//! - [`MetricConfig`] - one sub-query per metric
//! - [`LoggingConfig`] - file logging
//!
//! # Example Configuration
//!
//! ```toml
//! gateway_target = "postgresql"
//!
//! [postgresql]
//! connection_string = "${REVSTATS_PG_URL}"
//! statement_timeout_seconds = 600
//!
//! [extract]
//! batch_size = 100
//! default_lang = "en"
//!
//! [[metrics]]
//! name = "revisions"
//! query = "SELECT rev_page AS id, COUNT(*) AS revisions FROM revision WHERE rev_page = ANY($1) GROUP BY rev_page"
//! columns = [{ name = "revisions", default = "0" }]
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

pub use loader::{load_config, parse_config};
pub use schema::{
    ApplicationConfig, Environment, ExtractConfig, GatewayTarget, HttpGatewayConfig,
    LoggingConfig, MetricColumnConfig, MetricConfig, PostgreSQLConfig, RetryConfig,
    RevstatsConfig,
};
pub use secret::{secret_string, secret_string_opt, SecretString, SecretValue};
