//! PostgreSQL query gateway
//!
//! Metric sub-queries run against a PostgreSQL replica of the wiki database
//! through a `deadpool-postgres` pool.

pub mod client;
pub mod gateway;

pub use client::PostgreSQLClient;
pub use gateway::PostgreSQLGateway;
