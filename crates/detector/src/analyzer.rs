//! The analyzer front door: run every strategy, then threshold and rank.

use crate::classify::{filter_opportunities, StrategyFilter};
use crate::strategies::{build_strategies, DetectionStrategy, MarketView};
use common::{Opportunity, P2pQuote, Quote};
use config::AnalyzerConfig;
use rust_decimal::Decimal;
use tracing::debug;

/// Pure analysis over one market view. Holds no market state, so the
/// same inputs always produce the same ranked output.
pub struct ArbitrageAnalyzer {
    strategies: Vec<Box<dyn DetectionStrategy>>,
}

impl ArbitrageAnalyzer {
    pub fn new(config: &AnalyzerConfig) -> Self {
        Self {
            strategies: build_strategies(config),
        }
    }

    /// Runs every strategy over the view and returns opportunities at or
    /// above `min_profit` that pass `filter`, best spread first.
    pub fn find(
        &self,
        cex: &[Quote],
        dex: &[Quote],
        p2p: &[P2pQuote],
        min_profit: Decimal,
        filter: StrategyFilter,
    ) -> Vec<Opportunity> {
        let view = MarketView { cex, dex, p2p };
        let mut opportunities = Vec::new();
        for strategy in &self.strategies {
            let found = strategy.detect(&view);
            debug!("{}: {} candidates", strategy.name(), found.len());
            opportunities.extend(found);
        }
        filter_opportunities(opportunities, min_profit, filter)
    }
}
