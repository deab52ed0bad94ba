//! HTTP client tests against a mock portfolio endpoint

use std::time::Duration;

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use portfolio_listener::api::{PortfolioClient, PortfolioSource, REQUEST_TIMEOUT};
use portfolio_listener::{Config, PollerError};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::fixtures::btc_payload;
use crate::common::logging::init_test_logging;

fn config_for(server: &MockServer) -> Config {
    Config {
        api_url: format!("{}/api/portfolio", server.uri()),
        ..Config::default()
    }
}

#[tokio::test]
async fn test_sends_portfolio_and_detailed_params() {
    init_test_logging();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/portfolio"))
        .and(query_param("portfolio", "*TOTAL_OPTIONS"))
        .and(query_param("detailed", "TRUE"))
        .respond_with(ResponseTemplate::new(200).set_body_json(btc_payload()))
        .expect(1)
        .mount(&server)
        .await;

    let client = PortfolioClient::new(&config_for(&server)).unwrap();
    let raw = client.fetch_portfolio().await.unwrap();

    assert_eq!(raw.get("pv").and_then(|v| v.as_f64()), Some(12345.6));
    assert!(raw.get("spotrefs").unwrap().is_object());
}

#[tokio::test]
async fn test_detailed_false_is_sent() {
    init_test_logging();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param("portfolio", "DESK_A"))
        .and(query_param("detailed", "FALSE"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .expect(1)
        .mount(&server)
        .await;

    let config = Config {
        portfolio: "DESK_A".to_string(),
        detailed: false,
        ..config_for(&server)
    };
    let raw = PortfolioClient::new(&config).unwrap().fetch_portfolio().await.unwrap();
    assert!(raw.is_empty());
}

#[tokio::test]
async fn test_preserves_response_key_order() {
    init_test_logging();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"theta": {"BTC": 1}, "pv": 5, "delta": {"BTC": 2}, "spotrefs": {"BTC": 3}}"#,
        ))
        .mount(&server)
        .await;

    let raw = PortfolioClient::new(&config_for(&server))
        .unwrap()
        .fetch_portfolio()
        .await
        .unwrap();
    assert_eq!(raw.keys().map(String::as_str).collect::<Vec<_>>(), vec!["theta", "pv", "delta", "spotrefs"]);
}

#[tokio::test]
async fn test_server_error_is_fetch_error() {
    init_test_logging();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let result = PortfolioClient::new(&config_for(&server)).unwrap().fetch_portfolio().await;
    assert_matches!(result, Err(PollerError::Fetch(msg)) if msg.contains("503") && msg.contains("maintenance"));
}

#[tokio::test]
async fn test_malformed_body_is_parse_error() {
    init_test_logging();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"pv\": 1.0,"))
        .mount(&server)
        .await;

    let result = PortfolioClient::new(&config_for(&server)).unwrap().fetch_portfolio().await;
    assert_matches!(result, Err(PollerError::Parse(_)));
}

#[tokio::test]
async fn test_non_object_body_is_parse_error() {
    init_test_logging();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[1, 2, 3]"))
        .mount(&server)
        .await;

    let result = PortfolioClient::new(&config_for(&server)).unwrap().fetch_portfolio().await;
    assert_matches!(result, Err(PollerError::Parse(msg)) if msg.contains("array"));
}

#[tokio::test]
async fn test_unreachable_endpoint_is_fetch_error() {
    init_test_logging();

    let config = Config {
        api_url: "http://127.0.0.1:9/api/portfolio".to_string(),
        ..Config::default()
    };
    let result = PortfolioClient::new(&config).unwrap().fetch_portfolio().await;
    assert_matches!(result, Err(PollerError::Fetch(_)));
}

#[test]
fn test_default_request_timeout_is_ten_seconds() {
    assert_eq!(REQUEST_TIMEOUT, Duration::from_secs(10));
}

#[tokio::test]
async fn test_slow_response_times_out_as_fetch_error() {
    init_test_logging();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(btc_payload())
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let client = PortfolioClient::with_timeout(&config_for(&server), Duration::from_millis(100)).unwrap();
    let result = client.fetch_portfolio().await;
    assert_matches!(result, Err(PollerError::Fetch(msg)) if msg.contains("timed out"));
}
