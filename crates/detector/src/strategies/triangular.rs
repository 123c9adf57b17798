//! Three-leg conversion loops on a single exchange.
//!
//! For a triangle (A/C, B/A, B/C) the first two legs imply a price for
//! the third: `theoretical = price(A/C) * price(B/A)`. When the quoted
//! third leg trades above that, converting C -> A -> B and selling B
//! directly for C closes a profitable loop.

use super::{build_opportunity, DetectionStrategy, MarketView};
use common::types::positive;
use common::{Opportunity, OpportunityKind, Symbol};
use config::TriangleConfig;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

pub struct TriangularStrategy {
    triangles: Vec<TriangleConfig>,
    /// Fraction of the theoretical price charged for the three trades.
    fee_rate: Decimal,
}

impl TriangularStrategy {
    pub fn new(triangles: Vec<TriangleConfig>, fee_rate: Decimal) -> Self {
        Self {
            triangles,
            fee_rate,
        }
    }
}

impl DetectionStrategy for TriangularStrategy {
    fn name(&self) -> &'static str {
        "triangle"
    }

    fn detect(&self, view: &MarketView<'_>) -> Vec<Opportunity> {
        // Spot prices per exchange; quotes without a positive spot price
        // cannot participate in a loop.
        let mut by_exchange: BTreeMap<&str, BTreeMap<&Symbol, Decimal>> = BTreeMap::new();
        for quote in view.cex {
            if let Some(price) = positive(quote.spot_price) {
                by_exchange
                    .entry(quote.exchange.as_str())
                    .or_default()
                    .insert(&quote.symbol, price);
            }
        }

        let mut out = Vec::new();
        for (exchange, prices) in &by_exchange {
            for triangle in &self.triangles {
                let (Some(first), Some(second), Some(third)) = (
                    prices.get(&triangle.first_leg),
                    prices.get(&triangle.second_leg),
                    prices.get(&triangle.third_leg),
                ) else {
                    continue;
                };
                let theoretical = first * second;
                let fees = theoretical * self.fee_rate;
                out.push(build_opportunity(
                    OpportunityKind::Triangle,
                    format!(
                        "{exchange}: {} -> {} -> {} -> {}",
                        triangle.first_leg.quote,
                        triangle.first_leg.base,
                        triangle.second_leg.base,
                        triangle.first_leg.quote,
                    ),
                    theoretical,
                    *third,
                    fees,
                    Decimal::ZERO,
                ));
            }
        }
        out
    }
}
