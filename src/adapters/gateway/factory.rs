//! Query gateway factory
//!
//! Creates the gateway selected by `gateway_target` in the configuration.

use super::traits::QueryGateway;
use crate::adapters::http::HttpGateway;
use crate::adapters::postgresql::{PostgreSQLClient, PostgreSQLGateway};
use crate::config::schema::{GatewayTarget, RevstatsConfig};
use crate::domain::{Result, RevstatsError};
use std::sync::Arc;

/// Create a query gateway based on the configuration
///
/// # Errors
///
/// Returns [`RevstatsError::Configuration`] when the section for the selected
/// target is missing, or [`RevstatsError::QueryGateway`] when the gateway
/// cannot be initialized.
pub async fn create_gateway(config: &RevstatsConfig) -> Result<Arc<dyn QueryGateway>> {
    match config.gateway_target {
        GatewayTarget::PostgreSQL => {
            let pg_config = config.postgresql.as_ref().ok_or_else(|| {
                RevstatsError::Configuration(
                    "gateway_target is 'postgresql' but [postgresql] is missing".to_string(),
                )
            })?;

            tracing::info!("Creating PostgreSQL gateway");
            let client = PostgreSQLClient::new(pg_config.clone()).await?;

            Ok(Arc::new(PostgreSQLGateway::new(client)) as Arc<dyn QueryGateway>)
        }
        GatewayTarget::Http => {
            let http_config = config.http.as_ref().ok_or_else(|| {
                RevstatsError::Configuration(
                    "gateway_target is 'http' but [http] is missing".to_string(),
                )
            })?;

            tracing::info!(base_url = %http_config.base_url, "Creating HTTP gateway");
            let gateway = HttpGateway::new(http_config.clone())?;

            Ok(Arc::new(gateway) as Arc<dyn QueryGateway>)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;

    #[tokio::test]
    async fn test_create_http_gateway() {
        let config = parse_config(
            r#"
gateway_target = "http"

[http]
base_url = "http://localhost:9"
"#,
        )
        .unwrap();

        let gateway = create_gateway(&config).await.unwrap();
        assert_eq!(gateway.name(), "http");
    }

    #[tokio::test]
    async fn test_missing_section_is_configuration_error() {
        let mut config = parse_config(
            r#"
gateway_target = "http"

[http]
base_url = "http://localhost:9"
"#,
        )
        .unwrap();
        config.http = None;

        let result = create_gateway(&config).await;
        assert!(matches!(result, Err(RevstatsError::Configuration(_))));
    }
}
