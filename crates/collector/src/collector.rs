//! Concurrent quote collection across CEX, DEX aggregator, and p2p sources.

use crate::cache::TtlCache;
use crate::clients::{AggregatorClient, MarketClient, P2pClient, P2pFilter};
use crate::limiter::RateLimiter;
use crate::retry::RetryPolicy;
use chrono::{DateTime, Utc};
use common::{MarketError, P2pQuote, Quote, Symbol, Validate};
use config::CollectorConfig;
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Per-source outcome of one collection pass: how many valid records the
/// source contributed, or why it contributed none.
#[derive(Debug, Clone)]
pub struct SourceReport {
    pub source: String,
    pub outcome: Result<usize, MarketError>,
}

impl SourceReport {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Records gathered from one source family, with per-source reports.
#[derive(Debug, Clone)]
pub struct Collected<T> {
    pub records: Vec<T>,
    pub reports: Vec<SourceReport>,
    pub from_cache: bool,
}

impl<T> Collected<T> {
    fn cached(records: Vec<T>) -> Self {
        Self {
            records,
            reports: Vec::new(),
            from_cache: true,
        }
    }
}

/// Everything one scan cycle works with, collected close together in time.
#[derive(Debug, Clone)]
pub struct MarketSnapshot {
    pub collected_at: DateTime<Utc>,
    pub cex: Vec<Quote>,
    pub dex: Vec<Quote>,
    pub p2p: Vec<P2pQuote>,
    pub reports: Vec<SourceReport>,
}

impl MarketSnapshot {
    /// True when no source family delivered anything.
    pub fn is_empty(&self) -> bool {
        self.cex.is_empty() && self.dex.is_empty() && self.p2p.is_empty()
    }
}

/// Fetches quotes from all registered clients concurrently, tolerating
/// partial failure: a dead source costs its records and a report entry,
/// never the whole pass.
///
/// All fetches share one rate limiter; the limiter slot is claimed inside
/// the retry closure, so every retry attempt pays for its own slot.
pub struct QuoteCollector {
    market_clients: Vec<Arc<dyn MarketClient>>,
    aggregator_clients: Vec<Arc<dyn AggregatorClient>>,
    p2p_clients: Vec<Arc<dyn P2pClient>>,
    limiter: RateLimiter,
    retry: RetryPolicy,
    cex_cache: TtlCache<Vec<Quote>>,
    dex_cache: TtlCache<Vec<Quote>>,
    p2p_cache: TtlCache<Vec<P2pQuote>>,
    /// Last successful listings per p2p source, served when a live fetch
    /// fails. Unbounded on purpose: one entry per registered source.
    last_good_p2p: Mutex<HashMap<String, Vec<P2pQuote>>>,
}

impl QuoteCollector {
    pub fn new(
        config: &CollectorConfig,
        market_clients: Vec<Arc<dyn MarketClient>>,
        aggregator_clients: Vec<Arc<dyn AggregatorClient>>,
        p2p_clients: Vec<Arc<dyn P2pClient>>,
    ) -> Self {
        let ttl = Duration::from_secs(config.cache_ttl_secs);
        Self {
            market_clients,
            aggregator_clients,
            p2p_clients,
            limiter: RateLimiter::new(
                config.max_calls_per_period,
                Duration::from_millis(config.rate_period_ms),
            ),
            retry: RetryPolicy::from_config(&config.retry),
            cex_cache: TtlCache::new(ttl),
            dex_cache: TtlCache::new(ttl),
            p2p_cache: TtlCache::new(ttl),
            last_good_p2p: Mutex::new(HashMap::new()),
        }
    }

    /// Spot quotes for `symbols` from every exchange client.
    pub async fn collect_cex(&self, symbols: &[Symbol]) -> Collected<Quote> {
        let key = cex_cache_key(symbols);
        if let Some(hit) = self.cex_cache.get(&key).await {
            debug!("cex cache hit for {key}");
            return Collected::cached(hit);
        }

        let fetches = self.market_clients.iter().map(|client| {
            let client = client.as_ref();
            async move {
                let outcome = self
                    .retry
                    .run(client.source(), || async move {
                        self.limiter.acquire().await;
                        client.fetch_quotes(symbols).await
                    })
                    .await;
                (client.source().to_string(), outcome)
            }
        });

        let collected = merge_outcomes(join_all(fetches).await);
        if collected.reports.iter().any(SourceReport::is_ok) {
            self.cex_cache.insert(key, collected.records.clone()).await;
        }
        collected
    }

    /// On-chain prices for `assets` from every aggregator client.
    pub async fn collect_dex(&self, assets: &[String]) -> Collected<Quote> {
        let key = dex_cache_key(assets);
        if let Some(hit) = self.dex_cache.get(&key).await {
            debug!("dex cache hit for {key}");
            return Collected::cached(hit);
        }

        let fetches = self.aggregator_clients.iter().map(|client| {
            let client = client.as_ref();
            async move {
                let outcome = self
                    .retry
                    .run(client.source(), || async move {
                        self.limiter.acquire().await;
                        client.fetch_dex_quotes(assets).await
                    })
                    .await;
                (client.source().to_string(), outcome)
            }
        });

        let collected = merge_outcomes(join_all(fetches).await);
        if collected.reports.iter().any(SourceReport::is_ok) {
            self.dex_cache.insert(key, collected.records.clone()).await;
        }
        collected
    }

    /// Marketplace listings matching `filter` from every p2p client.
    ///
    /// A source that fails after retries is replaced by its last
    /// successful listing set when one exists; its report still carries
    /// the live error.
    pub async fn collect_p2p(&self, filter: &P2pFilter) -> Collected<P2pQuote> {
        let key = filter.cache_key();
        if let Some(hit) = self.p2p_cache.get(&key).await {
            debug!("p2p cache hit for {key}");
            return Collected::cached(hit);
        }

        let fetches = self.p2p_clients.iter().map(|client| {
            let client = client.as_ref();
            async move {
                let outcome = self
                    .retry
                    .run(client.source(), || async move {
                        self.limiter.acquire().await;
                        client.fetch_listings(filter).await
                    })
                    .await;
                (client.source().to_string(), outcome)
            }
        });

        let outcomes = join_all(fetches).await;

        let mut records = Vec::new();
        let mut reports = Vec::new();
        let mut any_ok = false;
        // Lock only around the bookkeeping below, never across client I/O;
        // overlapping collections must not serialize on this mutex.
        let mut last_good = self.last_good_p2p.lock().await;
        for (source, outcome) in outcomes {
            match outcome {
                Ok(listings) => {
                    let kept: Vec<P2pQuote> = keep_valid(&source, listings)
                        .into_iter()
                        .filter(|l| filter.matches(l))
                        .collect();
                    last_good.insert(source.clone(), kept.clone());
                    reports.push(SourceReport {
                        source,
                        outcome: Ok(kept.len()),
                    });
                    records.extend(kept);
                    any_ok = true;
                }
                Err(err) => {
                    if let Some(stale) = last_good.get(&source) {
                        warn!("{source}: fetch failed ({err}); serving {} stale listings", stale.len());
                        records.extend(stale.iter().cloned());
                    } else {
                        warn!("{source}: fetch failed ({err}); no stale listings to serve");
                    }
                    reports.push(SourceReport {
                        source,
                        outcome: Err(err),
                    });
                }
            }
        }
        drop(last_good);

        if any_ok {
            self.p2p_cache.insert(key, records.clone()).await;
        }
        Collected {
            records,
            reports,
            from_cache: false,
        }
    }

    /// One full pass over all three source families, concurrently.
    pub async fn collect_all(
        &self,
        symbols: &[Symbol],
        dex_assets: &[String],
        filter: &P2pFilter,
    ) -> MarketSnapshot {
        let (cex, dex, p2p) = tokio::join!(
            self.collect_cex(symbols),
            self.collect_dex(dex_assets),
            self.collect_p2p(filter),
        );

        let mut reports = cex.reports;
        reports.extend(dex.reports);
        reports.extend(p2p.reports);

        MarketSnapshot {
            collected_at: Utc::now(),
            cex: cex.records,
            dex: dex.records,
            p2p: p2p.records,
            reports,
        }
    }

    /// Drops all cached fetch results; the next collection goes live.
    pub async fn invalidate_caches(&self) {
        self.cex_cache.clear().await;
        self.dex_cache.clear().await;
        self.p2p_cache.clear().await;
    }
}

fn cex_cache_key(symbols: &[Symbol]) -> String {
    let mut parts: Vec<String> = symbols.iter().map(Symbol::to_string).collect();
    parts.sort();
    format!("cex:{}", parts.join(","))
}

fn dex_cache_key(assets: &[String]) -> String {
    let mut parts = assets.to_vec();
    parts.sort();
    format!("dex:{}", parts.join(","))
}

/// Drops records that fail validation, logging each one.
fn keep_valid<T: Validate>(source: &str, records: Vec<T>) -> Vec<T> {
    records
        .into_iter()
        .filter(|record| match record.validate() {
            Ok(()) => true,
            Err(err) => {
                warn!("{source}: dropping record: {err}");
                false
            }
        })
        .collect()
}

fn merge_outcomes(
    outcomes: Vec<(String, Result<Vec<Quote>, MarketError>)>,
) -> Collected<Quote> {
    let mut records = Vec::new();
    let mut reports = Vec::new();
    for (source, outcome) in outcomes {
        match outcome {
            Ok(quotes) => {
                let kept = keep_valid(&source, quotes);
                reports.push(SourceReport {
                    source,
                    outcome: Ok(kept.len()),
                });
                records.extend(kept);
            }
            Err(err) => {
                warn!("{source}: fetch failed: {err}");
                reports.push(SourceReport {
                    source,
                    outcome: Err(err),
                });
            }
        }
    }
    Collected {
        records,
        reports,
        from_cache: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn test_config() -> CollectorConfig {
        CollectorConfig {
            cache_ttl_secs: 45,
            max_calls_per_period: 100,
            rate_period_ms: 1_000,
            ..CollectorConfig::default()
        }
    }

    fn quote(exchange: &str, bid: rust_decimal::Decimal, ask: rust_decimal::Decimal) -> Quote {
        Quote {
            exchange: exchange.to_string(),
            symbol: Symbol::new("BTC", "USDT"),
            bid: Some(bid),
            ask: Some(ask),
            spot_price: None,
            orderbook_depth: dec!(1000),
            maker_fee: dec!(0.001),
            taker_fee: dec!(0.001),
            network_fees: HashMap::new(),
            liquidity: None,
        }
    }

    struct StaticClient {
        name: String,
        quotes: Vec<Quote>,
        calls: AtomicU32,
    }

    #[async_trait]
    impl MarketClient for StaticClient {
        fn source(&self) -> &str {
            &self.name
        }

        async fn fetch_quotes(&self, _symbols: &[Symbol]) -> Result<Vec<Quote>, MarketError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.quotes.clone())
        }
    }

    struct FailingClient {
        name: String,
        /// Succeed once this many calls have failed; u32::MAX never succeeds.
        failures_before_success: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl MarketClient for FailingClient {
        fn source(&self) -> &str {
            &self.name
        }

        async fn fetch_quotes(&self, _symbols: &[Symbol]) -> Result<Vec<Quote>, MarketError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures_before_success {
                Err(MarketError::Transport("connection reset".to_string()))
            } else {
                Ok(vec![quote(&self.name, dec!(100), dec!(101))])
            }
        }
    }

    struct FlakyP2p {
        name: String,
        calls: AtomicU32,
    }

    #[async_trait]
    impl P2pClient for FlakyP2p {
        fn source(&self) -> &str {
            &self.name
        }

        async fn fetch_listings(&self, _filter: &P2pFilter) -> Result<Vec<P2pQuote>, MarketError> {
            // First round of attempts succeeds, everything after fails.
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n == 0 {
                Ok(vec![P2pQuote {
                    exchange: self.name.clone(),
                    asset: "USDT".to_string(),
                    fiat: "RUB".to_string(),
                    price: dec!(92),
                    min_limit: dec!(100),
                    max_limit: dec!(90000),
                    merchant: true,
                    payments: vec!["Tinkoff".to_string()],
                }])
            } else {
                Err(MarketError::BadResponse("rate limited".to_string()))
            }
        }
    }

    fn symbols() -> Vec<Symbol> {
        vec![Symbol::new("BTC", "USDT")]
    }

    #[tokio::test(start_paused = true)]
    async fn one_dead_source_does_not_kill_the_pass() {
        let healthy = Arc::new(StaticClient {
            name: "binance".to_string(),
            quotes: vec![quote("binance", dec!(100), dec!(101))],
            calls: AtomicU32::new(0),
        });
        let dead = Arc::new(FailingClient {
            name: "bybit".to_string(),
            failures_before_success: u32::MAX,
            calls: AtomicU32::new(0),
        });

        let collector = QuoteCollector::new(
            &test_config(),
            vec![healthy.clone(), dead.clone()],
            vec![],
            vec![],
        );
        let collected = collector.collect_cex(&symbols()).await;

        assert_eq!(collected.records.len(), 1);
        assert_eq!(collected.records[0].exchange, "binance");
        assert_eq!(collected.reports.len(), 2);
        assert!(collected.reports.iter().any(|r| r.source == "bybit" && !r.is_ok()));
        // Dead source was retried the full schedule.
        assert_eq!(dead.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failure_is_retried_to_success() {
        let flaky = Arc::new(FailingClient {
            name: "okx".to_string(),
            failures_before_success: 2,
            calls: AtomicU32::new(0),
        });

        let collector = QuoteCollector::new(&test_config(), vec![flaky.clone()], vec![], vec![]);
        let collected = collector.collect_cex(&symbols()).await;

        assert_eq!(collected.records.len(), 1);
        assert!(collected.reports[0].is_ok());
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn second_pass_within_ttl_is_served_from_cache() {
        let client = Arc::new(StaticClient {
            name: "binance".to_string(),
            quotes: vec![quote("binance", dec!(100), dec!(101))],
            calls: AtomicU32::new(0),
        });

        let collector = QuoteCollector::new(&test_config(), vec![client.clone()], vec![], vec![]);
        let first = collector.collect_cex(&symbols()).await;
        let second = collector.collect_cex(&symbols()).await;

        assert!(!first.from_cache);
        assert!(second.from_cache);
        assert_eq!(second.records, first.records);
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);

        // Past the TTL the collector goes back to the client.
        tokio::time::sleep(Duration::from_secs(46)).await;
        let third = collector.collect_cex(&symbols()).await;
        assert!(!third.from_cache);
        assert_eq!(client.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_records_are_dropped_not_fatal() {
        let mut bad = quote("binance", dec!(100), dec!(101));
        bad.bid = Some(dec!(-5));
        let client = Arc::new(StaticClient {
            name: "binance".to_string(),
            quotes: vec![bad, quote("binance", dec!(100), dec!(101))],
            calls: AtomicU32::new(0),
        });

        let collector = QuoteCollector::new(&test_config(), vec![client], vec![], vec![]);
        let collected = collector.collect_cex(&symbols()).await;

        assert_eq!(collected.records.len(), 1);
        assert_eq!(collected.reports[0].outcome, Ok(1));
    }

    #[tokio::test(start_paused = true)]
    async fn p2p_failure_falls_back_to_last_good_listings() {
        let client = Arc::new(FlakyP2p {
            name: "binance_p2p".to_string(),
            calls: AtomicU32::new(0),
        });
        let filter = P2pFilter {
            asset: "USDT".to_string(),
            fiats: vec!["RUB".to_string()],
            payment_methods: vec![],
            min_limit: None,
            max_limit: None,
        };

        let collector = QuoteCollector::new(&test_config(), vec![], vec![], vec![client]);
        let first = collector.collect_p2p(&filter).await;
        assert_eq!(first.records.len(), 1);

        collector.invalidate_caches().await;
        let second = collector.collect_p2p(&filter).await;

        // Live fetch failed, stale listings were served, the report says so.
        assert_eq!(second.records.len(), 1);
        assert!(!second.reports[0].is_ok());
        assert!(!second.from_cache);
    }

    struct SlowFirstP2p {
        name: String,
        calls: AtomicU32,
    }

    #[async_trait]
    impl P2pClient for SlowFirstP2p {
        fn source(&self) -> &str {
            &self.name
        }

        async fn fetch_listings(&self, _filter: &P2pFilter) -> Result<Vec<P2pQuote>, MarketError> {
            // First call simulates a stalled upstream, later calls answer
            // immediately.
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n == 0 {
                tokio::time::sleep(Duration::from_secs(10)).await;
            }
            Ok(vec![P2pQuote {
                exchange: self.name.clone(),
                asset: "USDT".to_string(),
                fiat: "RUB".to_string(),
                price: dec!(92),
                min_limit: dec!(100),
                max_limit: dec!(90000),
                merchant: true,
                payments: vec!["Tinkoff".to_string()],
            }])
        }
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_p2p_collections_do_not_serialize() {
        let client = Arc::new(SlowFirstP2p {
            name: "binance_p2p".to_string(),
            calls: AtomicU32::new(0),
        });
        let collector = Arc::new(QuoteCollector::new(
            &test_config(),
            vec![],
            vec![],
            vec![client],
        ));

        let rub = P2pFilter {
            asset: "USDT".to_string(),
            fiats: vec!["RUB".to_string()],
            payment_methods: vec![],
            min_limit: None,
            max_limit: None,
        };
        let usd = P2pFilter {
            fiats: vec!["USD".to_string()],
            ..rub.clone()
        };

        let slow = {
            let collector = Arc::clone(&collector);
            tokio::spawn(async move { collector.collect_p2p(&rub).await })
        };
        // Let the first collection reach its stalled fetch.
        tokio::time::sleep(Duration::from_millis(10)).await;

        // A second collection with a different filter must not queue up
        // behind the stalled one.
        let start = tokio::time::Instant::now();
        let fast = collector.collect_p2p(&usd).await;
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert!(fast.reports[0].is_ok());

        let slow = slow.await.unwrap();
        assert!(slow.reports[0].is_ok());
        assert_eq!(slow.records.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn collect_all_merges_reports_from_every_family() {
        let client = Arc::new(StaticClient {
            name: "binance".to_string(),
            quotes: vec![quote("binance", dec!(100), dec!(101))],
            calls: AtomicU32::new(0),
        });
        let p2p = Arc::new(FlakyP2p {
            name: "binance_p2p".to_string(),
            calls: AtomicU32::new(0),
        });
        let filter = P2pFilter {
            asset: "USDT".to_string(),
            fiats: vec!["RUB".to_string()],
            payment_methods: vec![],
            min_limit: None,
            max_limit: None,
        };

        let collector = QuoteCollector::new(&test_config(), vec![client], vec![], vec![p2p]);
        let snapshot = collector.collect_all(&symbols(), &[], &filter).await;

        assert!(!snapshot.is_empty());
        assert_eq!(snapshot.cex.len(), 1);
        assert_eq!(snapshot.p2p.len(), 1);
        assert_eq!(snapshot.reports.len(), 2);
    }
}
