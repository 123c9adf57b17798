//! Detection strategies.
//!
//! Each strategy scans one shape of market inefficiency and emits every
//! candidate it can price, profitable or not; thresholding and ranking
//! happen afterwards in [`crate::classify`].

use crate::spread::calculate_spread_percent;
use common::{Grade, Opportunity, OpportunityKind, P2pQuote, Quote};
use config::AnalyzerConfig;
use rust_decimal::Decimal;

mod cross_venue;
mod exchange_to_exchange;
mod peer_to_peer;
mod triangular;

pub use cross_venue::CrossVenueStrategy;
pub use exchange_to_exchange::ExchangeToExchangeStrategy;
pub use peer_to_peer::PeerToPeerStrategy;
pub use triangular::TriangularStrategy;

/// Borrowed view over one collection pass, shared by all strategies.
#[derive(Debug, Clone, Copy)]
pub struct MarketView<'a> {
    pub cex: &'a [Quote],
    pub dex: &'a [Quote],
    pub p2p: &'a [P2pQuote],
}

/// One way of finding arbitrage in a market view.
///
/// `detect` must be deterministic: the same view yields the same
/// opportunities in the same order, so repeated analysis of one
/// snapshot is idempotent.
pub trait DetectionStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn detect(&self, view: &MarketView<'_>) -> Vec<Opportunity>;
}

/// The full strategy set for a given analyzer configuration.
pub fn build_strategies(config: &AnalyzerConfig) -> Vec<Box<dyn DetectionStrategy>> {
    vec![
        Box::new(ExchangeToExchangeStrategy),
        Box::new(CrossVenueStrategy::new(config.cross_venue_fee)),
        Box::new(PeerToPeerStrategy::new(config.p2p_fee)),
        Box::new(TriangularStrategy::new(
            config.triangles.clone(),
            config.triangle_fee_rate,
        )),
    ]
}

pub(crate) fn build_opportunity(
    kind: OpportunityKind,
    route: String,
    buy_price: Decimal,
    sell_price: Decimal,
    fees: Decimal,
    liquidity: Decimal,
) -> Opportunity {
    let spread_percent = calculate_spread_percent(buy_price, sell_price, fees);
    Opportunity {
        kind,
        route,
        buy_price,
        sell_price,
        fees,
        spread_percent,
        liquidity,
        grade: Grade::from_spread(spread_percent),
    }
}
