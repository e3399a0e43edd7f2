//! HTTP query gateway
//!
//! For deployments where the replica sits behind a query service instead of
//! being reachable over the PostgreSQL protocol.

pub mod gateway;
pub mod models;

pub use gateway::HttpGateway;
