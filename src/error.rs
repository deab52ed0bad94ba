use thiserror::Error;

/// Errors raised by the listener.
///
/// `Fetch`, `Parse` and `Normalize` are per-cycle failures: the poller logs
/// them and keeps running. `Config`, `AlreadyStarted` and `Runtime` are returned
/// to the caller before any background work begins.
#[derive(Debug, Error)]
pub enum PollerError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("fetch failed: {0}")]
    Fetch(String),

    #[error("malformed response: {0}")]
    Parse(String),

    #[error("normalization failed: {0}")]
    Normalize(String),

    #[error("poller has already been started")]
    AlreadyStarted,

    #[error("poller task failed: {0}")]
    Task(String),

    #[error("no tokio runtime: {0}")]
    Runtime(String),
}

impl From<reqwest::Error> for PollerError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            PollerError::Fetch(format!("request timed out: {}", err))
        } else {
            PollerError::Fetch(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, PollerError>;
