//! Integration tests for the HTTP query gateway against a mock server

use mockito::Matcher;
use revstats::adapters::gateway::QueryGateway;
use revstats::adapters::http::HttpGateway;
use revstats::config::{secret_string, HttpGatewayConfig, RetryConfig};
use revstats::core::aggregate::{MetricColumn, MetricQuery};
use revstats::domain::{EntityId, GatewayError, MetricValue};
use serde_json::json;

fn gateway_config(base_url: String, max_retries: usize) -> HttpGatewayConfig {
    HttpGatewayConfig {
        base_url,
        token: Some(secret_string("secret".to_string())),
        username: None,
        password: None,
        timeout_seconds: 5,
        tls_verify: true,
        retry: RetryConfig {
            max_retries,
            initial_delay_ms: 1,
            max_delay_ms: 5,
            backoff_multiplier: 2.0,
        },
    }
}

fn count_metric() -> MetricQuery {
    MetricQuery::new(
        "count",
        "SELECT rev_page AS id, COUNT(*) AS count FROM revision WHERE rev_page = ANY($1) GROUP BY rev_page",
        vec![MetricColumn::new("count", "0")],
    )
}

fn ids() -> Vec<EntityId> {
    vec![EntityId::new(50), EntityId::new(51)]
}

#[tokio::test]
async fn test_query_returns_rows() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/query")
        .match_header("authorization", "Bearer secret")
        .match_body(Matcher::PartialJson(json!({
            "name": "count",
            "query_parameters": { "ids": [50, 51] }
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"rows": [{"id": 50, "count": 3}, {"id": 51, "count": 7}]}"#)
        .create_async()
        .await;

    let gateway = HttpGateway::new(gateway_config(server.url(), 3)).unwrap();
    let rows = gateway.run_query(&count_metric(), &ids()).await.unwrap();

    mock.assert_async().await;
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].id, EntityId::new(50));
    assert_eq!(rows[0].get("count"), Some(&MetricValue::Integer(3)));
    assert_eq!(rows[1].get("count"), Some(&MetricValue::Integer(7)));
}

#[tokio::test]
async fn test_unauthorized_is_not_retried() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/query")
        .with_status(401)
        .expect(1)
        .create_async()
        .await;

    let gateway = HttpGateway::new(gateway_config(server.url(), 3)).unwrap();
    let err = gateway.run_query(&count_metric(), &ids()).await.unwrap_err();

    mock.assert_async().await;
    assert!(matches!(err, GatewayError::AuthenticationFailed(_)));
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/query")
        .with_status(400)
        .with_body("syntax error at or near \"SELEC\"")
        .expect(1)
        .create_async()
        .await;

    let gateway = HttpGateway::new(gateway_config(server.url(), 3)).unwrap();
    let err = gateway.run_query(&count_metric(), &ids()).await.unwrap_err();

    mock.assert_async().await;
    match err {
        GatewayError::ClientError { status, message } => {
            assert_eq!(status, 400);
            assert!(message.contains("syntax error"));
        }
        other => panic!("expected client error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_server_error_is_retried_until_exhausted() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/query")
        .with_status(503)
        .expect(2)
        .create_async()
        .await;

    let gateway = HttpGateway::new(gateway_config(server.url(), 2)).unwrap();
    let err = gateway.run_query(&count_metric(), &ids()).await.unwrap_err();

    mock.assert_async().await;
    assert!(matches!(err, GatewayError::ServerError { status: 503, .. }));
}

#[tokio::test]
async fn test_unparsable_body_is_invalid_response() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/query")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("not json")
        .create_async()
        .await;

    let gateway = HttpGateway::new(gateway_config(server.url(), 3)).unwrap();
    let err = gateway.run_query(&count_metric(), &ids()).await.unwrap_err();

    assert!(matches!(err, GatewayError::InvalidResponse { .. }));
}

#[tokio::test]
async fn test_row_without_id_is_invalid_response() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/query")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"rows": [{"count": 3}]}"#)
        .create_async()
        .await;

    let gateway = HttpGateway::new(gateway_config(server.url(), 3)).unwrap();
    let err = gateway.run_query(&count_metric(), &ids()).await.unwrap_err();

    assert!(matches!(err, GatewayError::InvalidResponse { .. }));
}
