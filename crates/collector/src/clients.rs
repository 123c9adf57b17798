//! Client seams for the three kinds of market sources.

use async_trait::async_trait;
use common::{MarketError, P2pQuote, Quote, Symbol};
use config::CollectorConfig;
use rust_decimal::Decimal;

/// A centralized exchange serving spot tickers.
#[async_trait]
pub trait MarketClient: Send + Sync {
    /// Stable identifier used in reports and cache keys, e.g. `binance`.
    fn source(&self) -> &str;

    async fn fetch_quotes(&self, symbols: &[Symbol]) -> Result<Vec<Quote>, MarketError>;
}

/// A DEX aggregator serving on-chain prices by asset identifier.
#[async_trait]
pub trait AggregatorClient: Send + Sync {
    fn source(&self) -> &str;

    async fn fetch_dex_quotes(&self, assets: &[String]) -> Result<Vec<Quote>, MarketError>;
}

/// A peer-to-peer fiat marketplace.
#[async_trait]
pub trait P2pClient: Send + Sync {
    fn source(&self) -> &str;

    async fn fetch_listings(&self, filter: &P2pFilter) -> Result<Vec<P2pQuote>, MarketError>;
}

/// Narrows which p2p listings a scan is interested in.
#[derive(Debug, Clone, PartialEq)]
pub struct P2pFilter {
    pub asset: String,
    pub fiats: Vec<String>,
    /// Empty means any payment method is acceptable.
    pub payment_methods: Vec<String>,
    /// Transaction-size band, in fiat. A listing qualifies when its own
    /// limit band overlaps this one.
    pub min_limit: Option<Decimal>,
    pub max_limit: Option<Decimal>,
}

impl P2pFilter {
    pub fn from_config(config: &CollectorConfig) -> Self {
        Self {
            asset: config.p2p_asset.clone(),
            fiats: config.p2p_fiats.clone(),
            payment_methods: common::validators::normalize_payment_methods(
                &config.p2p_payment_methods,
            ),
            min_limit: Some(config.min_liquidity_usd),
            max_limit: None,
        }
    }

    /// Deterministic cache key: listing sets only depend on the filter.
    pub fn cache_key(&self) -> String {
        let mut fiats = self.fiats.clone();
        fiats.sort();
        let mut methods = self.payment_methods.clone();
        methods.sort();
        format!(
            "p2p:{}:{}:{}:{}:{}",
            self.asset,
            fiats.join(","),
            methods.join(","),
            self.min_limit.map_or_else(|| "-".to_string(), |v| v.to_string()),
            self.max_limit.map_or_else(|| "-".to_string(), |v| v.to_string()),
        )
    }

    /// Whether a listing satisfies the filter. Clients that pre-filter
    /// server-side still get their output checked through this.
    pub fn matches(&self, listing: &P2pQuote) -> bool {
        if listing.asset != self.asset {
            return false;
        }
        if !self.fiats.is_empty() && !self.fiats.contains(&listing.fiat) {
            return false;
        }
        if !self.payment_methods.is_empty()
            && !listing
                .payments
                .iter()
                .any(|p| self.payment_methods.contains(p))
        {
            return false;
        }
        // Band overlap: the listing must accept some amount inside ours.
        if let Some(min) = self.min_limit {
            if listing.max_limit < min {
                return false;
            }
        }
        if let Some(max) = self.max_limit {
            if listing.min_limit > max {
                return false;
            }
        }
        true
    }
}
