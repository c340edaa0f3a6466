//! Decimal money helpers.
//!
//! All amounts are `rust_decimal::Decimal` in the store's single currency
//! unit (e.g. dollars, not cents). Binary floats never touch a price.

use rust_decimal::{Decimal, RoundingStrategy};

/// One cent: the smallest payable amount and the comparison tolerance.
pub const CENT: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Round to two decimal places, midpoints away from zero.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// True when `a` and `b` differ by no more than `tolerance`.
#[must_use]
pub fn within_tolerance(a: Decimal, b: Decimal, tolerance: Decimal) -> bool {
    (a - b).abs() <= tolerance
}

/// Format an amount for messages (e.g. `$19.99`).
#[must_use]
pub fn format_money(amount: Decimal) -> String {
    format!("${:.2}", round_money(amount))
}
