//! Buy on-chain at the aggregator price, sell the same pair on a CEX.

use super::{build_opportunity, DetectionStrategy, MarketView};
use common::types::positive;
use common::{Opportunity, OpportunityKind};
use rust_decimal::Decimal;

pub struct CrossVenueStrategy {
    /// Flat absolute fee standing in for bridging and settlement costs.
    fee: Decimal,
}

impl CrossVenueStrategy {
    pub fn new(fee: Decimal) -> Self {
        Self { fee }
    }
}

impl DetectionStrategy for CrossVenueStrategy {
    fn name(&self) -> &'static str {
        "dex-cex"
    }

    fn detect(&self, view: &MarketView<'_>) -> Vec<Opportunity> {
        let mut out = Vec::new();
        for dex in view.dex {
            for cex in view.cex {
                if cex.symbol != dex.symbol {
                    continue;
                }
                let Some(buy_price) = positive(dex.spot_price) else {
                    continue;
                };
                let Some(sell_price) = cex.sell_price() else {
                    continue;
                };
                out.push(build_opportunity(
                    OpportunityKind::DexCex,
                    format!("{} -> {} ({})", dex.exchange, cex.exchange, dex.symbol),
                    buy_price,
                    sell_price,
                    self.fee,
                    dex.liquidity
                        .unwrap_or(Decimal::ZERO)
                        .min(cex.orderbook_depth),
                ));
            }
        }
        out
    }
}
