//! Spread and profit arithmetic. All money math is `Decimal`.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Absolute fee components of a transfer between venues, plus the
/// percentage an exchange takes per trade.
#[derive(Debug, Clone, PartialEq)]
pub struct FeeModel {
    pub exchange_fee_percent: Decimal,
    pub network_fee: Decimal,
    pub withdrawal_fee: Decimal,
    pub gas_fee: Decimal,
}

impl Default for FeeModel {
    fn default() -> Self {
        Self {
            exchange_fee_percent: dec!(0.1),
            network_fee: Decimal::ZERO,
            withdrawal_fee: Decimal::ZERO,
            gas_fee: Decimal::ZERO,
        }
    }
}

impl FeeModel {
    /// Sum of the absolute fee components, excluding the percentage fee.
    pub fn total_absolute(&self) -> Decimal {
        self.network_fee + self.withdrawal_fee + self.gas_fee
    }
}

/// Net spread between a buy and a sell price as a percentage of the buy
/// price, after absolute fees. A non-positive buy price yields zero
/// rather than a division error.
pub fn calculate_spread_percent(buy_price: Decimal, sell_price: Decimal, fees: Decimal) -> Decimal {
    if buy_price <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    (sell_price - buy_price - fees) / buy_price * dec!(100)
}

/// Fiat profit of a buy-asset-then-resell round trip: what the resale
/// brings in minus what was spent, fees included.
pub fn calculate_p2p_profit(
    fiat_spent: Decimal,
    asset_received: Decimal,
    sell_price: Decimal,
    fees: Decimal,
) -> Decimal {
    asset_received * sell_price - (fiat_spent + fees)
}

/// Profit of a route that starts and ends in the same fiat.
pub fn calculate_international_profit(
    initial_fiat: Decimal,
    final_fiat: Decimal,
    total_fees: Decimal,
) -> Decimal {
    final_fiat - initial_fiat - total_fees
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spread_accounts_for_fees() {
        assert_eq!(
            calculate_spread_percent(dec!(100), dec!(101.5), dec!(0.1)),
            dec!(1.4)
        );
        assert_eq!(
            calculate_spread_percent(dec!(100), dec!(99), Decimal::ZERO),
            dec!(-1)
        );
    }

    #[test]
    fn zero_buy_price_yields_zero_spread() {
        assert_eq!(
            calculate_spread_percent(Decimal::ZERO, dec!(100), Decimal::ZERO),
            Decimal::ZERO
        );
        assert_eq!(
            calculate_spread_percent(dec!(-1), dec!(100), Decimal::ZERO),
            Decimal::ZERO
        );
    }

    #[test]
    fn p2p_profit_is_resale_minus_cost() {
        // Spend 92 000 RUB on 1 000 USDT, resell at 93.5 RUB.
        let profit = calculate_p2p_profit(dec!(92000), dec!(1000), dec!(93.5), dec!(150));
        assert_eq!(profit, dec!(1350));
    }

    #[test]
    fn international_profit_subtracts_all_fees() {
        assert_eq!(
            calculate_international_profit(dec!(100000), dec!(103000), dec!(500)),
            dec!(2500)
        );
    }

    #[test]
    fn fee_model_sums_absolute_components() {
        let fees = FeeModel {
            network_fee: dec!(1),
            withdrawal_fee: dec!(2),
            gas_fee: dec!(0.5),
            ..FeeModel::default()
        };
        assert_eq!(fees.total_absolute(), dec!(3.5));
    }
}
