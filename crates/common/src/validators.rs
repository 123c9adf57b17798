//! Input validation helpers shared by the config layer and the scanner.

use rust_decimal::Decimal;

/// A profit threshold is a percentage and must sit in `[0, 100]`.
pub fn validate_profit_threshold(value: Decimal) -> bool {
    value >= Decimal::ZERO && value <= Decimal::from(100)
}

/// Trims payment method names and drops empty entries.
pub fn normalize_payment_methods<I, S>(methods: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    methods
        .into_iter()
        .filter_map(|m| {
            let trimmed = m.as_ref().trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .collect()
}
