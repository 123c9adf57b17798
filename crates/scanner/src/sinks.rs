//! Opportunity sinks.

use anyhow::Result;
use async_trait::async_trait;
use common::{IsOpportunitySink, Opportunity};
use tracing::info;

/// Writes each opportunity to the log, one line per entry.
pub struct LogSink;

#[async_trait]
impl IsOpportunitySink for LogSink {
    async fn publish(&self, opportunities: &[Opportunity]) -> Result<()> {
        for opp in opportunities {
            info!(
                "[{}] {} | buy {} sell {} fees {} | spread {}% | liquidity {} | grade {}",
                opp.kind,
                opp.route,
                opp.buy_price,
                opp.sell_price,
                opp.fees,
                opp.spread_percent.round_dp(4),
                opp.liquidity,
                opp.grade,
            );
        }
        Ok(())
    }
}
