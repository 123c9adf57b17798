//! Configuration for the arbitrage scanner workspace.
//!
//! All tunables live in explicit structs handed to constructors; nothing
//! reads process-wide state. Defaults mirror the reference deployment:
//! 45 s cache TTL, 5 calls per second, 1.0 % minimum profit, 60 s scan
//! interval.

use common::validators::validate_profit_threshold;
use common::Symbol;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration mapped directly to the YAML file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ScannerConfig {
    #[serde(default)]
    pub collector: CollectorConfig,
    #[serde(default)]
    pub analyzer: AnalyzerConfig,
    #[serde(default)]
    pub scan: ScanConfig,
}

/// Tunables for the quote collector: caching, rate limiting, retries,
/// and which sources/filters a scan covers.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CollectorConfig {
    /// Default TTL for cached fetch results, in seconds.
    pub cache_ttl_secs: u64,
    /// Sliding-window rate limit shared by all fetches of one collector.
    pub max_calls_per_period: usize,
    pub rate_period_ms: u64,
    pub retry: RetryConfig,
    pub enabled_cex: Vec<String>,
    pub p2p_asset: String,
    pub p2p_fiats: Vec<String>,
    pub p2p_payment_methods: Vec<String>,
    pub min_liquidity_usd: Decimal,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: 45,
            max_calls_per_period: 5,
            rate_period_ms: 1_000,
            retry: RetryConfig::default(),
            enabled_cex: ["binance", "bybit", "okx", "kucoin", "kraken"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            p2p_asset: "USDT".to_string(),
            p2p_fiats: ["RUB", "USD", "EUR", "UZS", "KZT", "UAH"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            p2p_payment_methods: ["Tinkoff", "Sberbank", "Raiffeisen"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            min_liquidity_usd: dec!(1000),
        }
    }
}

/// Exponential backoff schedule for one fallible fetch.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 1_000,
            backoff_multiplier: 2.0,
        }
    }
}

/// Fee constants and triangle definitions for the detection strategies.
///
/// The cross-venue and p2p fees are fixed placeholders, not values derived
/// from real fee schedules; they are configuration on purpose.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnalyzerConfig {
    /// Opportunities below this spread percentage are dropped.
    pub min_profit_percent: Decimal,
    /// Absolute fee charged to a dex -> cex candidate.
    pub cross_venue_fee: Decimal,
    /// Absolute fee charged to a p2p pair candidate.
    pub p2p_fee: Decimal,
    /// Fraction of the theoretical price charged to a triangle, e.g. 0.002.
    pub triangle_fee_rate: Decimal,
    pub triangles: Vec<TriangleConfig>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            min_profit_percent: dec!(1.0),
            cross_venue_fee: dec!(1.5),
            p2p_fee: dec!(1.0),
            triangle_fee_rate: dec!(0.002),
            triangles: vec![TriangleConfig::default()],
        }
    }
}

/// Three legs forming a closed conversion loop on a single exchange.
///
/// For the reference triple the loop is quote -> base -> cross -> quote:
/// `BTC/USDT` (first), `ETH/BTC` (second), `ETH/USDT` (third).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TriangleConfig {
    pub first_leg: Symbol,
    pub second_leg: Symbol,
    pub third_leg: Symbol,
}

impl Default for TriangleConfig {
    fn default() -> Self {
        Self {
            first_leg: Symbol::new("BTC", "USDT"),
            second_leg: Symbol::new("ETH", "BTC"),
            third_leg: Symbol::new("ETH", "USDT"),
        }
    }
}

impl TriangleConfig {
    /// A loop only closes when the second leg crosses into the first leg's
    /// base and the third leg prices the cross asset in the first leg's
    /// quote.
    pub fn is_closed(&self) -> bool {
        self.second_leg.quote == self.first_leg.base
            && self.third_leg.base == self.second_leg.base
            && self.third_leg.quote == self.first_leg.quote
    }
}

/// What a scheduled scan covers and how often it runs.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScanConfig {
    pub interval_secs: u64,
    pub symbols: Vec<Symbol>,
    /// Aggregator asset identifiers, e.g. `bitcoin`, `ethereum`.
    pub dex_assets: Vec<String>,
    /// Strategy tag applied to scan results: "all" or one opportunity kind.
    pub strategy: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            symbols: vec![
                Symbol::new("BTC", "USDT"),
                Symbol::new("ETH", "USDT"),
                Symbol::new("SOL", "USDT"),
                Symbol::new("ETH", "BTC"),
            ],
            dex_assets: ["bitcoin", "ethereum", "solana"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            strategy: "all".to_string(),
        }
    }
}

impl ScannerConfig {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: ScannerConfig =
            serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        Ok(config)
    }

    /// Save configuration to a YAML file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content =
            serde_yaml::to_string(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.collector.cache_ttl_secs == 0 {
            return Err(ConfigError::ValidationError(
                "cache TTL must be greater than 0".to_string(),
            ));
        }
        if self.collector.max_calls_per_period == 0 {
            return Err(ConfigError::ValidationError(
                "rate limit must allow at least one call per period".to_string(),
            ));
        }
        if self.collector.rate_period_ms == 0 {
            return Err(ConfigError::ValidationError(
                "rate limit period must be greater than 0".to_string(),
            ));
        }
        if self.collector.retry.max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "retry policy needs at least one attempt".to_string(),
            ));
        }
        if self.collector.retry.backoff_multiplier < 1.0 {
            return Err(ConfigError::ValidationError(
                "backoff multiplier cannot shrink the delay".to_string(),
            ));
        }
        if !validate_profit_threshold(self.analyzer.min_profit_percent) {
            return Err(ConfigError::ValidationError(format!(
                "minimum profit {} is outside [0, 100]",
                self.analyzer.min_profit_percent
            )));
        }
        for triangle in &self.analyzer.triangles {
            if !triangle.is_closed() {
                return Err(ConfigError::ValidationError(format!(
                    "triangle {} / {} / {} does not form a closed loop",
                    triangle.first_leg, triangle.second_leg, triangle.third_leg
                )));
            }
        }
        if self.scan.interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "scan interval must be greater than 0".to_string(),
            ));
        }
        if self.scan.symbols.is_empty() {
            return Err(ConfigError::ValidationError(
                "no symbols configured for scanning".to_string(),
            ));
        }
        if self.scan.strategy != "all" && self.scan.strategy.parse::<common::OpportunityKind>().is_err() {
            return Err(ConfigError::ValidationError(format!(
                "unknown strategy tag '{}'",
                self.scan.strategy
            )));
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}
