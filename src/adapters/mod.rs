//! External system integrations for revstats.
//!
//! - [`gateway`] - the query gateway abstraction (trait-based) and its factory
//! - [`postgresql`] - PostgreSQL replica implementation
//! - [`http`] - HTTP query service implementation
//!
//! # Design Pattern
//!
//! Adapters isolate the remote source behind the
//! [`QueryGateway`](gateway::QueryGateway) trait so the pipeline can be tested
//! against an in-memory gateway.
//!
//! ```rust,no_run
//! use revstats::adapters::gateway::create_gateway;
//! use revstats::config::load_config;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("revstats.toml")?;
//! let gateway = create_gateway(&config).await?;
//! gateway.test_connection().await?;
//! # Ok(())
//! # }
//! ```

pub mod gateway;
pub mod http;
pub mod postgresql;
