use anyhow::Result;
use clap::Parser;
use collector::{MarketSnapshotFile, QuoteCollector};
use common::IsOpportunitySink;
use config::ScannerConfig;
use scanner::{LogSink, ScanService};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::error;

/// Command line arguments for arb-scanner.
#[derive(Parser, Debug)]
struct Args {
    /// Path to the scanner configuration YAML
    #[arg(long, default_value = "config/default.yml")]
    config: String,
    /// Path to a market snapshot YAML serving as the data source
    #[arg(long, default_value = "demos/snapshot.yml")]
    snapshot: String,
    /// Run a single scan cycle and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let args = Args::parse();

    // Load and check scanner configuration
    let config = ScannerConfig::load(&args.config)?;
    config.validate()?;

    // File-backed clients; a live deployment swaps in HTTP-backed ones.
    let snapshot = MarketSnapshotFile::load(&args.snapshot)?;
    let mut market_clients = snapshot.market_clients();
    if !config.collector.enabled_cex.is_empty() {
        market_clients.retain(|c| {
            config
                .collector
                .enabled_cex
                .iter()
                .any(|name| name == c.source())
        });
    }
    let collector = QuoteCollector::new(
        &config.collector,
        market_clients,
        snapshot.aggregator_clients(),
        snapshot.p2p_clients(),
    );

    let sink: Arc<dyn IsOpportunitySink> = Arc::new(LogSink);
    let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
    let mut service = ScanService::new(config, collector, sink, shutdown_rx)?;

    if args.once {
        return service.scan_once().await;
    }

    let handle = service.spawn();

    tokio::signal::ctrl_c().await?;

    // Graceful shutdown
    shutdown_tx.send(()).await.ok();
    if let Err(e) = handle.await.expect("scan service task panicked") {
        error!(error = %e, "Scan service exited with error");
    }

    Ok(())
}
