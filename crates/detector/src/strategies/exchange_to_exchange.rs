//! Buy on one exchange, sell the same pair on another.

use super::{build_opportunity, DetectionStrategy, MarketView};
use common::{Opportunity, OpportunityKind, Quote, Symbol};
use std::collections::BTreeMap;

pub struct ExchangeToExchangeStrategy;

impl DetectionStrategy for ExchangeToExchangeStrategy {
    fn name(&self) -> &'static str {
        "cex-cex"
    }

    fn detect(&self, view: &MarketView<'_>) -> Vec<Opportunity> {
        // BTreeMap keeps per-symbol iteration order independent of input
        // hashing, which keeps detection deterministic.
        let mut by_symbol: BTreeMap<&Symbol, Vec<&Quote>> = BTreeMap::new();
        for quote in view.cex {
            by_symbol.entry(&quote.symbol).or_default().push(quote);
        }

        let mut out = Vec::new();
        for (symbol, markets) in &by_symbol {
            for buy in markets {
                for sell in markets {
                    if buy.exchange == sell.exchange {
                        continue;
                    }
                    let (Some(buy_price), Some(sell_price)) = (buy.buy_price(), sell.sell_price())
                    else {
                        continue;
                    };
                    let fees = buy.taker_fee * buy_price + sell.maker_fee * sell_price;
                    out.push(build_opportunity(
                        OpportunityKind::CexCex,
                        format!("{} -> {} ({symbol})", buy.exchange, sell.exchange),
                        buy_price,
                        sell_price,
                        fees,
                        buy.orderbook_depth.min(sell.orderbook_depth),
                    ));
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn quote(exchange: &str, bid: Decimal, ask: Decimal) -> Quote {
        Quote {
            exchange: exchange.to_string(),
            symbol: Symbol::new("BTC", "USDT"),
            bid: Some(bid),
            ask: Some(ask),
            spot_price: None,
            orderbook_depth: dec!(1000),
            maker_fee: Decimal::ZERO,
            taker_fee: Decimal::ZERO,
            network_fees: HashMap::new(),
            liquidity: None,
        }
    }

    #[test]
    fn considers_both_directions_but_never_a_self_pair() {
        let view = MarketView {
            cex: &[
                quote("binance", dec!(100.5), dec!(100.0)),
                quote("binance", dec!(100.6), dec!(100.1)),
                quote("bybit", dec!(101.5), dec!(101.0)),
            ],
            dex: &[],
            p2p: &[],
        };

        let found = ExchangeToExchangeStrategy.detect(&view);

        assert!(found.iter().all(|o| !o.route.contains("binance -> binance")));
        assert!(found
            .iter()
            .any(|o| o.route == "binance -> bybit (BTC/USDT)"));
        assert!(found
            .iter()
            .any(|o| o.route == "bybit -> binance (BTC/USDT)"));
    }

    #[test]
    fn quote_without_any_usable_price_is_skipped() {
        let mut silent = quote("okx", dec!(1), dec!(1));
        silent.bid = None;
        silent.ask = None;
        let view = MarketView {
            cex: &[quote("binance", dec!(100.5), dec!(100.0)), silent],
            dex: &[],
            p2p: &[],
        };

        let found = ExchangeToExchangeStrategy.detect(&view);
        assert!(found.is_empty());
    }
}
