use crate::error::Result;
use crate::models::RawResponse;

pub mod portfolio_client;
pub use portfolio_client::{PortfolioClient, REQUEST_TIMEOUT};

/// Anything that can produce a raw portfolio response.
///
/// The poller is generic over this so tests can script responses and failures.
#[async_trait::async_trait]
pub trait PortfolioSource: Send + Sync {
    async fn fetch_portfolio(&self) -> Result<RawResponse>;
}
