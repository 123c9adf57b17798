//! Buy from one p2p marketplace, resell on another in the same fiat.

use super::{build_opportunity, DetectionStrategy, MarketView};
use common::{Opportunity, OpportunityKind};
use rust_decimal::Decimal;

pub struct PeerToPeerStrategy {
    /// Flat absolute fee standing in for transfer costs between venues.
    fee: Decimal,
}

impl PeerToPeerStrategy {
    pub fn new(fee: Decimal) -> Self {
        Self { fee }
    }
}

impl DetectionStrategy for PeerToPeerStrategy {
    fn name(&self) -> &'static str {
        "p2p"
    }

    fn detect(&self, view: &MarketView<'_>) -> Vec<Opportunity> {
        let mut out = Vec::new();
        for buy in view.p2p {
            for sell in view.p2p {
                if buy.exchange == sell.exchange {
                    continue;
                }
                if buy.fiat != sell.fiat {
                    continue;
                }
                // Equal prices are not an opportunity; the pair must pay
                // strictly more than it costs before fees even enter.
                if sell.price <= buy.price {
                    continue;
                }
                out.push(build_opportunity(
                    OpportunityKind::P2p,
                    format!(
                        "{} -> {} ({}/{})",
                        buy.exchange, sell.exchange, buy.asset, buy.fiat
                    ),
                    buy.price,
                    sell.price,
                    self.fee,
                    buy.max_limit.min(sell.max_limit),
                ));
            }
        }
        out
    }
}
