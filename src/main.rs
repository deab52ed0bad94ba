use anyhow::Result;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use portfolio_listener::consumers::{ConsolePrinter, CsvSnapshotWriter};
use portfolio_listener::{Config, PortfolioPoller, SnapshotSlot};

/// Poll the portfolio endpoint and print the latest snapshot.
#[derive(Parser, Debug)]
#[command(name = "portfolio-listener", version)]
struct Args {
    /// Also write each snapshot to this CSV file (overrides CSV_OUTPUT_PATH)
    #[arg(long)]
    csv: Option<String>,

    /// Poll interval in seconds (overrides API_INTERVAL)
    #[arg(long)]
    interval: Option<u64>,
}

fn apply_overrides(mut config: Config, args: &Args) -> portfolio_listener::Result<Config> {
    if let Some(path) = &args.csv {
        config.csv_output_path = Some(path.clone());
    }
    if let Some(secs) = args.interval {
        config.interval_secs = secs;
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("portfolio_listener=info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let config = match Config::from_env().and_then(|config| apply_overrides(config, &args)) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            eprintln!("❌ Configuration Error: {}", e);
            eprintln!("Check API_URL, API_PORTFOLIO, API_DETAILED and API_INTERVAL in your environment or .env file.");
            std::process::exit(1);
        }
    };

    info!(
        "📋 Polling {} for portfolio {} every {}s",
        config.api_url, config.portfolio, config.interval_secs
    );

    let slot = SnapshotSlot::new();
    let mut poller = PortfolioPoller::from_config(&config, slot.clone())?;
    poller.start()?;

    let mut printer = ConsolePrinter::stdout();
    let csv_writer = config.csv_output_path.as_deref().map(CsvSnapshotWriter::new);

    loop {
        tokio::select! {
            snapshot = slot.take() => {
                if let Err(e) = printer.print(&snapshot) {
                    warn!("Failed to print snapshot: {}", e);
                }
                if let Some(writer) = &csv_writer {
                    if let Err(e) = writer.write(&snapshot) {
                        error!("❌ Failed to write {}: {:#}", writer.path().display(), e);
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupt received, waiting for the current cycle to finish");
                break;
            }
        }
    }

    poller.shutdown().await?;
    let stats = poller.stats();
    info!(
        "✅ Listener finished: {} cycles, {} published, {} failed",
        stats.cycles, stats.published, stats.failed
    );

    Ok(())
}
