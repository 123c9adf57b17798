//! The periodic scan loop tying collector, analyzer, and sink together.

use anyhow::{Context, Result};
use collector::{P2pFilter, QuoteCollector};
use common::IsOpportunitySink;
use config::ScannerConfig;
use detector::{ArbitrageAnalyzer, OpportunityDeduplicator, StrategyFilter};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};
use uuid::Uuid;

/// Runs collection and analysis on a fixed interval until told to stop.
///
/// Opportunities that persist across cycles are suppressed for one cache
/// TTL so the sink only hears about genuinely new ones.
pub struct ScanService {
    collector: QuoteCollector,
    analyzer: ArbitrageAnalyzer,
    deduplicator: OpportunityDeduplicator,
    sink: Arc<dyn IsOpportunitySink>,
    config: ScannerConfig,
    p2p_filter: P2pFilter,
    strategy_filter: StrategyFilter,
    shutdown_rx: mpsc::Receiver<()>,
}

impl ScanService {
    pub fn new(
        config: ScannerConfig,
        collector: QuoteCollector,
        sink: Arc<dyn IsOpportunitySink>,
        shutdown_rx: mpsc::Receiver<()>,
    ) -> Result<Self> {
        let strategy_filter: StrategyFilter = config
            .scan
            .strategy
            .parse()
            .with_context(|| format!("bad strategy tag '{}'", config.scan.strategy))?;
        Ok(Self {
            analyzer: ArbitrageAnalyzer::new(&config.analyzer),
            deduplicator: OpportunityDeduplicator::new(Duration::from_secs(
                config.collector.cache_ttl_secs,
            )),
            p2p_filter: P2pFilter::from_config(&config.collector),
            collector,
            sink,
            config,
            strategy_filter,
            shutdown_rx,
        })
    }

    /// Scans immediately, then on every interval tick. Returns when the
    /// shutdown channel fires or closes.
    pub async fn run(mut self) -> Result<()> {
        info!(
            "scan service started: every {} s, strategy {}",
            self.config.scan.interval_secs, self.strategy_filter
        );
        let mut ticker = interval(Duration::from_secs(self.config.scan.interval_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.shutdown_rx.recv() => {
                    info!("scan service shutting down");
                    return Ok(());
                }
                _ = ticker.tick() => {
                    if let Err(err) = self.scan_once().await {
                        error!("scan cycle failed: {err:#}");
                    }
                }
            }
        }
    }

    /// One collection + analysis + publish cycle.
    pub async fn scan_once(&mut self) -> Result<()> {
        let cycle = Uuid::new_v4();
        let snapshot = self
            .collector
            .collect_all(
                &self.config.scan.symbols,
                &self.config.scan.dex_assets,
                &self.p2p_filter,
            )
            .await;

        for report in snapshot.reports.iter().filter(|r| !r.is_ok()) {
            warn!("cycle {cycle}: source {} contributed nothing", report.source);
        }
        if snapshot.is_empty() {
            warn!("cycle {cycle}: no market data collected, skipping analysis");
            return Ok(());
        }

        let opportunities = self.analyzer.find(
            &snapshot.cex,
            &snapshot.dex,
            &snapshot.p2p,
            self.config.analyzer.min_profit_percent,
            self.strategy_filter,
        );
        let total = opportunities.len();
        let fresh = self.deduplicator.dedup(opportunities);
        info!(
            "cycle {cycle}: {} quotes, {} listings -> {total} opportunities ({} new)",
            snapshot.cex.len() + snapshot.dex.len(),
            snapshot.p2p.len(),
            fresh.len(),
        );

        if !fresh.is_empty() {
            self.sink
                .publish(&fresh)
                .await
                .context("publishing opportunities")?;
        }
        Ok(())
    }

    pub fn spawn(self) -> JoinHandle<Result<()>> {
        tokio::spawn(self.run())
    }
}
