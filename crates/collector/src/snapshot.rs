//! File-backed market clients.
//!
//! A snapshot file is a YAML document with `cex`, `dex`, and `p2p`
//! record lists. Loading one yields a client per distinct source, which
//! makes offline runs and integration tests go through the exact same
//! collector path as live clients would.

use crate::clients::{AggregatorClient, MarketClient, P2pClient, P2pFilter};
use async_trait::async_trait;
use common::{MarketError, P2pQuote, Quote, Symbol};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MarketSnapshotFile {
    #[serde(default)]
    pub cex: Vec<Quote>,
    #[serde(default)]
    pub dex: Vec<Quote>,
    #[serde(default)]
    pub p2p: Vec<P2pQuote>,
}

impl MarketSnapshotFile {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, MarketError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| MarketError::Io(e.to_string()))?;
        serde_yaml::from_str(&content).map_err(|e| MarketError::BadResponse(e.to_string()))
    }

    /// One market client per exchange present in the `cex` section.
    pub fn market_clients(&self) -> Vec<Arc<dyn MarketClient>> {
        group_by_source(&self.cex, |q| &q.exchange)
            .into_iter()
            .map(|(source, quotes)| {
                Arc::new(SnapshotMarketClient { source, quotes }) as Arc<dyn MarketClient>
            })
            .collect()
    }

    /// One aggregator client per source present in the `dex` section.
    pub fn aggregator_clients(&self) -> Vec<Arc<dyn AggregatorClient>> {
        group_by_source(&self.dex, |q| &q.exchange)
            .into_iter()
            .map(|(source, quotes)| {
                Arc::new(SnapshotAggregatorClient { source, quotes }) as Arc<dyn AggregatorClient>
            })
            .collect()
    }

    /// One p2p client per marketplace present in the `p2p` section.
    pub fn p2p_clients(&self) -> Vec<Arc<dyn P2pClient>> {
        group_by_source(&self.p2p, |l| &l.exchange)
            .into_iter()
            .map(|(source, listings)| {
                Arc::new(SnapshotP2pClient { source, listings }) as Arc<dyn P2pClient>
            })
            .collect()
    }
}

// BTreeMap keeps client order stable across loads.
fn group_by_source<T: Clone>(records: &[T], source: impl Fn(&T) -> &str) -> BTreeMap<String, Vec<T>> {
    let mut grouped: BTreeMap<String, Vec<T>> = BTreeMap::new();
    for record in records {
        grouped
            .entry(source(record).to_string())
            .or_default()
            .push(record.clone());
    }
    grouped
}

struct SnapshotMarketClient {
    source: String,
    quotes: Vec<Quote>,
}

#[async_trait]
impl MarketClient for SnapshotMarketClient {
    fn source(&self) -> &str {
        &self.source
    }

    async fn fetch_quotes(&self, symbols: &[Symbol]) -> Result<Vec<Quote>, MarketError> {
        Ok(self
            .quotes
            .iter()
            .filter(|q| symbols.contains(&q.symbol))
            .cloned()
            .collect())
    }
}

struct SnapshotAggregatorClient {
    source: String,
    quotes: Vec<Quote>,
}

#[async_trait]
impl AggregatorClient for SnapshotAggregatorClient {
    fn source(&self) -> &str {
        &self.source
    }

    async fn fetch_dex_quotes(&self, _assets: &[String]) -> Result<Vec<Quote>, MarketError> {
        // A snapshot file is already curated to the assets of interest;
        // asset identifiers only matter to live aggregator clients.
        Ok(self.quotes.clone())
    }
}

struct SnapshotP2pClient {
    source: String,
    listings: Vec<P2pQuote>,
}

#[async_trait]
impl P2pClient for SnapshotP2pClient {
    fn source(&self) -> &str {
        &self.source
    }

    async fn fetch_listings(&self, filter: &P2pFilter) -> Result<Vec<P2pQuote>, MarketError> {
        Ok(self
            .listings
            .iter()
            .filter(|l| filter.matches(l))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SNAPSHOT: &str = r#"
cex:
  - exchange: binance
    symbol: BTC/USDT
    bid: "64900.5"
    ask: "64901.0"
    orderbook_depth: "250000"
    taker_fee: "0.001"
  - exchange: bybit
    symbol: BTC/USDT
    bid: "65050.0"
    ask: "65051.5"
    orderbook_depth: "180000"
    taker_fee: "0.001"
dex:
  - exchange: aggregator
    symbol: WBTC/USDT
    spot_price: "64800.0"
    liquidity: "120000"
p2p:
  - exchange: binance_p2p
    asset: USDT
    fiat: RUB
    price: "92.5"
    min_limit: "1000"
    max_limit: "150000"
    merchant: true
    payments: [Tinkoff]
"#;

    #[test]
    fn load_builds_one_client_per_source() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SNAPSHOT.as_bytes()).unwrap();

        let snapshot = MarketSnapshotFile::load(file.path()).unwrap();
        assert_eq!(snapshot.market_clients().len(), 2);
        assert_eq!(snapshot.aggregator_clients().len(), 1);
        assert_eq!(snapshot.p2p_clients().len(), 1);
    }

    #[tokio::test]
    async fn market_client_serves_only_requested_symbols() {
        let snapshot: MarketSnapshotFile = serde_yaml::from_str(SNAPSHOT).unwrap();
        let clients = snapshot.market_clients();
        let binance = &clients[0];
        assert_eq!(binance.source(), "binance");

        let quotes = binance
            .fetch_quotes(&[Symbol::new("ETH", "USDT")])
            .await
            .unwrap();
        assert!(quotes.is_empty());

        let quotes = binance
            .fetch_quotes(&[Symbol::new("BTC", "USDT")])
            .await
            .unwrap();
        assert_eq!(quotes.len(), 1);
    }

    #[tokio::test]
    async fn p2p_client_applies_the_filter() {
        let snapshot: MarketSnapshotFile = serde_yaml::from_str(SNAPSHOT).unwrap();
        let clients = snapshot.p2p_clients();

        let filter = P2pFilter {
            asset: "USDT".to_string(),
            fiats: vec!["USD".to_string()],
            payment_methods: vec![],
            min_limit: None,
            max_limit: None,
        };
        assert!(clients[0].fetch_listings(&filter).await.unwrap().is_empty());

        let filter = P2pFilter {
            fiats: vec!["RUB".to_string()],
            ..filter
        };
        assert_eq!(clients[0].fetch_listings(&filter).await.unwrap().len(), 1);
    }
}
