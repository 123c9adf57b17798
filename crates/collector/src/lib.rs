//! # Quote Collector
//!
//! Gathers market data from CEX, DEX aggregator, and p2p sources behind
//! a shared rate limiter, a TTL cache, and a retry policy. A failing
//! source degrades the snapshot instead of failing the pass.

/// Module for the TTL cache.
pub mod cache;

/// Module for client traits and the p2p filter.
pub mod clients;

/// Module for the collector itself.
pub mod collector;

/// Module for the sliding-window rate limiter.
pub mod limiter;

/// Module for retry with exponential backoff.
pub mod retry;

/// Module for file-backed market clients.
pub mod snapshot;

pub use cache::TtlCache;
pub use clients::{AggregatorClient, MarketClient, P2pClient, P2pFilter};
pub use collector::{Collected, MarketSnapshot, QuoteCollector, SourceReport};
pub use limiter::RateLimiter;
pub use retry::RetryPolicy;
pub use snapshot::MarketSnapshotFile;
