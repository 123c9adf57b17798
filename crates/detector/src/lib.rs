//! # Arbitrage Detector
//!
//! Pure detection over collected market data: four strategies, spread
//! arithmetic, thresholding/ranking, and cross-scan deduplication.

/// Module for the analyzer front door.
pub mod analyzer;

/// Module for thresholding and ranking.
pub mod classify;

/// Module for cross-scan deduplication.
pub mod deduplicator;

/// Module for spread and profit arithmetic.
pub mod spread;

/// Module for the detection strategies.
pub mod strategies;

pub use analyzer::ArbitrageAnalyzer;
pub use classify::{filter_opportunities, StrategyFilter};
pub use deduplicator::OpportunityDeduplicator;
pub use spread::{calculate_spread_percent, FeeModel};
pub use strategies::{DetectionStrategy, MarketView};
