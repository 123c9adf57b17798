//! Shared traits for services in the arbitrage scanner.

use crate::types::Opportunity;
use anyhow::Result;
use async_trait::async_trait;

/// A consumer of ranked opportunities, e.g. a notification bot, a test
/// harness, or a plain log writer.
#[async_trait]
pub trait IsOpportunitySink: Send + Sync {
    /// Receives one scan cycle's ranked, deduplicated opportunities.
    async fn publish(&self, opportunities: &[Opportunity]) -> Result<()>;
}
