use std::time::Duration;

use serde_json::{Map, Value};
use url::Url;

use crate::error::{PollerError, Result};

pub mod snapshot;
pub use snapshot::{Snapshot, SnapshotRow};

/// Raw body returned by the portfolio endpoint, in key encounter order.
pub type RawResponse = Map<String, Value>;

pub const DEFAULT_API_URL: &str = "https://derivalytics.com:666/api/portfolio";
pub const DEFAULT_PORTFOLIO: &str = "*TOTAL_OPTIONS";
pub const DEFAULT_INTERVAL_SECS: u64 = 30;

/// Configuration for the application
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_url: String,
    pub portfolio: String,
    pub detailed: bool,
    pub interval_secs: u64,
    pub csv_output_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            portfolio: DEFAULT_PORTFOLIO.to_string(),
            detailed: true,
            interval_secs: DEFAULT_INTERVAL_SECS,
            csv_output_path: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// Unset keys fall back to defaults; set keys must be valid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let config = Config {
            api_url: lookup("API_URL").unwrap_or(defaults.api_url),
            portfolio: lookup("API_PORTFOLIO").unwrap_or(defaults.portfolio),
            detailed: match lookup("API_DETAILED") {
                Some(raw) => parse_flag("API_DETAILED", &raw)?,
                None => defaults.detailed,
            },
            interval_secs: match lookup("API_INTERVAL") {
                Some(raw) => parse_interval(&raw)?,
                None => defaults.interval_secs,
            },
            csv_output_path: lookup("CSV_OUTPUT_PATH").filter(|path| !path.trim().is_empty()),
        };

        config.validate()?;
        Ok(config)
    }

    /// Check the fields that cannot be expressed in the type.
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.api_url)
            .map_err(|e| PollerError::Config(format!("API_URL '{}' is not a valid URL: {}", self.api_url, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(PollerError::Config(format!(
                "API_URL must use http or https, got '{}'",
                url.scheme()
            )));
        }

        if self.portfolio.trim().is_empty() {
            return Err(PollerError::Config("API_PORTFOLIO must not be empty".to_string()));
        }

        if self.interval_secs == 0 {
            return Err(PollerError::Config("API_INTERVAL must be a positive number of seconds".to_string()));
        }

        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Query parameters sent with every request.
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        let detailed = if self.detailed { "TRUE" } else { "FALSE" };
        vec![
            ("portfolio", self.portfolio.clone()),
            ("detailed", detailed.to_string()),
        ]
    }
}

fn parse_flag(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => Err(PollerError::Config(format!(
            "{} must be a boolean (true/false), got '{}'",
            key, other
        ))),
    }
}

fn parse_interval(raw: &str) -> Result<u64> {
    let secs: u64 = raw.trim().parse().map_err(|_| {
        PollerError::Config(format!("API_INTERVAL must be a positive integer, got '{}'", raw))
    })?;
    if secs == 0 {
        return Err(PollerError::Config("API_INTERVAL must be a positive number of seconds".to_string()));
    }
    Ok(secs)
}
