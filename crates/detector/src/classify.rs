//! Thresholding and ranking of raw strategy output.

use common::{MarketError, Opportunity, OpportunityKind};
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;

/// Restricts results to one strategy's output, or lets everything through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrategyFilter {
    #[default]
    All,
    Only(OpportunityKind),
}

impl StrategyFilter {
    pub fn matches(&self, kind: OpportunityKind) -> bool {
        match self {
            StrategyFilter::All => true,
            StrategyFilter::Only(only) => *only == kind,
        }
    }
}

impl FromStr for StrategyFilter {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "all" {
            Ok(StrategyFilter::All)
        } else {
            Ok(StrategyFilter::Only(s.parse()?))
        }
    }
}

impl fmt::Display for StrategyFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyFilter::All => write!(f, "all"),
            StrategyFilter::Only(kind) => write!(f, "{kind}"),
        }
    }
}

/// Keeps opportunities at or above `min_profit` that pass the strategy
/// filter, ranked by spread, best first. The sort is stable, so
/// equal-spread entries keep their detection order.
pub fn filter_opportunities(
    mut opportunities: Vec<Opportunity>,
    min_profit: Decimal,
    filter: StrategyFilter,
) -> Vec<Opportunity> {
    opportunities.retain(|o| o.spread_percent >= min_profit && filter.matches(o.kind));
    opportunities.sort_by(|a, b| b.spread_percent.cmp(&a.spread_percent));
    opportunities
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Grade;
    use rust_decimal_macros::dec;

    fn opportunity(kind: OpportunityKind, route: &str, spread: Decimal) -> Opportunity {
        Opportunity {
            kind,
            route: route.to_string(),
            buy_price: dec!(100),
            sell_price: dec!(100) + spread,
            fees: Decimal::ZERO,
            spread_percent: spread,
            liquidity: dec!(1000),
            grade: Grade::from_spread(spread),
        }
    }

    #[test]
    fn threshold_is_inclusive() {
        let opps = vec![
            opportunity(OpportunityKind::CexCex, "a -> b", dec!(1.0)),
            opportunity(OpportunityKind::CexCex, "b -> c", dec!(0.999)),
        ];
        let kept = filter_opportunities(opps, dec!(1.0), StrategyFilter::All);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].route, "a -> b");
    }

    #[test]
    fn results_are_sorted_best_first_and_stable() {
        let opps = vec![
            opportunity(OpportunityKind::CexCex, "low", dec!(1.2)),
            opportunity(OpportunityKind::P2p, "tie-first", dec!(3.0)),
            opportunity(OpportunityKind::CexCex, "tie-second", dec!(3.0)),
            opportunity(OpportunityKind::Triangle, "high", dec!(6.0)),
        ];
        let kept = filter_opportunities(opps, Decimal::ZERO, StrategyFilter::All);
        let routes: Vec<&str> = kept.iter().map(|o| o.route.as_str()).collect();
        assert_eq!(routes, vec!["high", "tie-first", "tie-second", "low"]);
    }

    #[test]
    fn strategy_filter_keeps_only_the_requested_kind() {
        let opps = vec![
            opportunity(OpportunityKind::CexCex, "a -> b", dec!(2.0)),
            opportunity(OpportunityKind::P2p, "c -> d", dec!(4.0)),
        ];
        let kept = filter_opportunities(opps, Decimal::ZERO, StrategyFilter::Only(OpportunityKind::P2p));
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].kind, OpportunityKind::P2p);
    }

    #[test]
    fn filter_parses_from_tags() {
        assert_eq!("all".parse::<StrategyFilter>().unwrap(), StrategyFilter::All);
        assert_eq!(
            "triangle".parse::<StrategyFilter>().unwrap(),
            StrategyFilter::Only(OpportunityKind::Triangle)
        );
        assert!("spot-futures".parse::<StrategyFilter>().is_err());
    }
}
