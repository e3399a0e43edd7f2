//! HTTP implementation of [`QueryGateway`]
//!
//! Posts each sub-query as JSON to `<base_url>/query` and reads back a
//! `{"rows": [...]}` document. Transient failures (transport errors, timeouts
//! and 5xx responses) are retried with exponential backoff.

use super::models::{QueryParameters, QueryRequest, QueryResponse};
use crate::adapters::gateway::QueryGateway;
use crate::config::schema::HttpGatewayConfig;
use crate::core::aggregate::metrics::MetricQuery;
use crate::domain::{EntityId, GatewayError, Result, ResultRow, RevstatsError};
use crate::log_retry_attempt;
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::{Client, ClientBuilder, StatusCode};
use secrecy::ExposeSecret;
use std::time::Duration;

/// Query gateway backed by an HTTP query service
pub struct HttpGateway {
    /// Full URL of the query endpoint
    endpoint: String,

    /// HTTP client for making requests
    client: Client,

    /// Gateway configuration
    config: HttpGatewayConfig,
}

impl HttpGateway {
    /// Create a new HTTP gateway
    ///
    /// # Errors
    ///
    /// Returns [`RevstatsError::QueryGateway`] if the HTTP client cannot be built.
    pub fn new(config: HttpGatewayConfig) -> Result<Self> {
        let endpoint = format!("{}/query", config.base_url.trim_end_matches('/'));

        let mut client_builder = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(30));

        if !config.tls_verify {
            client_builder = client_builder.danger_accept_invalid_certs(true);
        }

        let client = client_builder.build().map_err(|e| {
            RevstatsError::QueryGateway(GatewayError::ConnectionFailed(format!(
                "Failed to build HTTP client: {e}"
            )))
        })?;

        Ok(Self {
            endpoint,
            client,
            config,
        })
    }

    /// Build authorization header value
    fn auth_header_value(&self) -> Option<String> {
        if let Some(ref token) = self.config.token {
            Some(format!("Bearer {}", token.expose_secret()))
        } else if let (Some(ref username), Some(ref password)) =
            (&self.config.username, &self.config.password)
        {
            let credentials = format!("{username}:{}", password.expose_secret());
            let encoded = general_purpose::STANDARD.encode(credentials.as_bytes());
            Some(format!("Basic {encoded}"))
        } else {
            None
        }
    }

    /// Delay before retry number `attempt` (1-based)
    fn backoff_delay(&self, attempt: usize) -> Duration {
        let retry = &self.config.retry;
        let factor = retry.backoff_multiplier.powi(attempt as i32 - 1);
        let delay_ms = (retry.initial_delay_ms as f64 * factor) as u64;
        Duration::from_millis(delay_ms.min(retry.max_delay_ms))
    }

    /// Retry a request with exponential backoff
    ///
    /// Only transient errors are retried; everything else is returned at once.
    async fn retry_request<F, T, Fut>(&self, operation: F) -> std::result::Result<T, GatewayError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = std::result::Result<T, GatewayError>>,
    {
        let max_retries = self.config.retry.max_retries;
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    attempt += 1;
                    if !e.is_transient() || attempt >= max_retries {
                        return Err(e);
                    }

                    let delay = self.backoff_delay(attempt);
                    log_retry_attempt!(attempt, max_retries, e.to_string());
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    async fn post_query(
        &self,
        metric: &MetricQuery,
        ids: &[EntityId],
    ) -> std::result::Result<Vec<ResultRow>, GatewayError> {
        let body = QueryRequest {
            q: &metric.query,
            query_parameters: QueryParameters { ids },
            name: &metric.name,
        };

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(auth) = self.auth_header_value() {
            request = request.header("Authorization", auth);
        }

        let resp = request.send().await.map_err(|e| {
            if e.is_timeout() {
                GatewayError::Timeout(format!("Query '{}': {e}", metric.name))
            } else {
                GatewayError::ConnectionFailed(e.to_string())
            }
        })?;

        match resp.status() {
            StatusCode::OK => {
                let response: QueryResponse =
                    resp.json()
                        .await
                        .map_err(|e| GatewayError::InvalidResponse {
                            query: metric.name.clone(),
                            message: e.to_string(),
                        })?;
                response.into_rows(&metric.name)
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                let status = resp.status();
                Err(GatewayError::AuthenticationFailed(format!(
                    "Query endpoint returned {status}"
                )))
            }
            status => {
                let body = resp.text().await.unwrap_or_default();
                if status.is_server_error() {
                    Err(GatewayError::ServerError {
                        status: status.as_u16(),
                        message: body,
                    })
                } else {
                    Err(GatewayError::ClientError {
                        status: status.as_u16(),
                        message: body,
                    })
                }
            }
        }
    }
}

#[async_trait]
impl QueryGateway for HttpGateway {
    fn name(&self) -> &str {
        "http"
    }

    async fn run_query(
        &self,
        metric: &MetricQuery,
        ids: &[EntityId],
    ) -> std::result::Result<Vec<ResultRow>, GatewayError> {
        self.retry_request(|| self.post_query(metric, ids)).await
    }

    async fn close(&self) -> std::result::Result<(), GatewayError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::RetryConfig;
    use crate::config::secret_string;

    fn config() -> HttpGatewayConfig {
        HttpGatewayConfig {
            base_url: "http://localhost:8080/api/".to_string(),
            token: None,
            username: None,
            password: None,
            timeout_seconds: 5,
            tls_verify: true,
            retry: RetryConfig {
                max_retries: 4,
                initial_delay_ms: 100,
                max_delay_ms: 250,
                backoff_multiplier: 2.0,
            },
        }
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let gateway = HttpGateway::new(config()).unwrap();
        assert_eq!(gateway.endpoint, "http://localhost:8080/api/query");
    }

    #[test]
    fn test_bearer_takes_precedence() {
        let mut config = config();
        config.token = Some(secret_string("tok".to_string()));
        config.username = Some("user".to_string());
        config.password = Some(secret_string("pass".to_string()));

        let gateway = HttpGateway::new(config).unwrap();
        assert_eq!(gateway.auth_header_value().as_deref(), Some("Bearer tok"));
    }

    #[test]
    fn test_basic_auth_header() {
        let mut config = config();
        config.username = Some("user".to_string());
        config.password = Some(secret_string("pass".to_string()));

        let gateway = HttpGateway::new(config).unwrap();
        assert_eq!(
            gateway.auth_header_value().as_deref(),
            Some("Basic dXNlcjpwYXNz")
        );
    }

    #[test]
    fn test_no_auth_header() {
        let gateway = HttpGateway::new(config()).unwrap();
        assert!(gateway.auth_header_value().is_none());
    }

    #[test]
    fn test_backoff_is_capped() {
        let gateway = HttpGateway::new(config()).unwrap();
        assert_eq!(gateway.backoff_delay(1), Duration::from_millis(100));
        assert_eq!(gateway.backoff_delay(2), Duration::from_millis(200));
        assert_eq!(gateway.backoff_delay(3), Duration::from_millis(250));
    }
}
