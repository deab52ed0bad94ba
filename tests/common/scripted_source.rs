use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use portfolio_listener::api::PortfolioSource;
use portfolio_listener::{PollerError, RawResponse, Result};

/// Replays a fixed list of responses, one per fetch. Once the script runs out
/// every fetch fails.
pub struct ScriptedSource {
    responses: Mutex<VecDeque<Result<RawResponse>>>,
    calls: Arc<AtomicUsize>,
    delay: Duration,
}

impl ScriptedSource {
    pub fn new(responses: Vec<Result<RawResponse>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: Arc::new(AtomicUsize::new(0)),
            delay: Duration::ZERO,
        }
    }

    /// Make every fetch take `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Shared counter of fetches issued so far.
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

pub fn network_error() -> Result<RawResponse> {
    Err(PollerError::Fetch("connection refused".to_string()))
}

#[async_trait::async_trait]
impl PortfolioSource for ScriptedSource {
    async fn fetch_portfolio(&self) -> Result<RawResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.responses.lock().unwrap().pop_front();

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        next.unwrap_or_else(|| Err(PollerError::Fetch("script exhausted".to_string())))
    }
}
