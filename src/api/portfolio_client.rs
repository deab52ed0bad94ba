use std::time::Duration;

use reqwest::{header::{HeaderMap, HeaderValue, ACCEPT}, Client};
use serde_json::Value;
use tracing::debug;

use super::PortfolioSource;
use crate::error::{PollerError, Result};
use crate::models::{Config, RawResponse};

/// Upper bound on a single request, connect to last body byte.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for the portfolio valuation endpoint
#[derive(Debug)]
pub struct PortfolioClient {
    client: Client,
    url: String,
    params: Vec<(&'static str, String)>,
}

impl PortfolioClient {
    /// Create a new client from validated configuration
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_timeout(config, REQUEST_TIMEOUT)
    }

    /// Same as [`PortfolioClient::new`] with a custom per-request timeout.
    pub fn with_timeout(config: &Config, timeout: Duration) -> Result<Self> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("portfolio-listener/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .map_err(|e| PollerError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: config.api_url.clone(),
            params: config.query_params(),
        })
    }

    /// Issue one GET and return the JSON object body.
    async fn make_request(&self) -> Result<RawResponse> {
        debug!("Making request to: {} {:?}", self.url, self.params);

        let response = self
            .client
            .get(&self.url)
            .query(&self.params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(PollerError::Fetch(format!(
                "API request failed with status {}: {}",
                status, error_text
            )));
        }

        let body = response.text().await?;
        debug!("API response received: {} bytes", body.len());

        parse_body(&body)
    }
}

/// Parse a response body, requiring a top-level JSON object.
pub fn parse_body(body: &str) -> Result<RawResponse> {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(PollerError::Parse(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
        Err(e) => Err(PollerError::Parse(format!("invalid JSON body: {}", e))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[async_trait::async_trait]
impl PortfolioSource for PortfolioClient {
    async fn fetch_portfolio(&self) -> Result<RawResponse> {
        self.make_request().await
    }
}
