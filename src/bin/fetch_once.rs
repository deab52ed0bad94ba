use anyhow::Result;
use portfolio_listener::api::{PortfolioClient, PortfolioSource};
use portfolio_listener::consumers::ConsolePrinter;
use portfolio_listener::models::Config;
use portfolio_listener::normalizer::normalize;
use tracing::{error, info, Level};

/// One fetch against the configured endpoint, printed as a table. Useful to
/// check connectivity before running the listener.
#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("🧪 Testing portfolio API connectivity");

    let config = Config::from_env()?;
    info!("📋 Configuration loaded ({})", config.api_url);

    let client = PortfolioClient::new(&config)?;

    match client.fetch_portfolio().await {
        Ok(raw) => {
            info!("✅ Received {} top-level keys", raw.len());
            let snapshot = normalize(&raw);
            info!(
                "📊 {} rows x {} columns",
                snapshot.rows().len(),
                snapshot.columns().len()
            );
            ConsolePrinter::stdout().print(&snapshot)?;
        }
        Err(e) => {
            error!("❌ Failed to fetch portfolio: {}", e);
            return Err(e.into());
        }
    }

    info!("🎉 API connectivity test completed successfully!");
    Ok(())
}
