//! Query gateway abstraction layer
//!
//! - [`traits`] - the [`QueryGateway`] trait
//! - [`factory`] - creates the configured gateway

pub mod factory;
pub mod traits;

pub use factory::create_gateway;
pub use traits::QueryGateway;
