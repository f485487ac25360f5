//! Currency conversion logic.
//!
//! CRITICAL: internal balances are stored with `BALANCE_SCALE` decimal places.
//! - Round with banker's rounding (round half to even)
//! - Multiplication is checked; overflow is reported, never wrapped

use rust_decimal::Decimal;
use rust_decimal::RoundingStrategy;

/// Decimal places kept for internal balance units.
pub const BALANCE_SCALE: u32 = 4;

/// Converts an amount using the given exchange rate.
///
/// Returns `None` if the product does not fit in a `Decimal`.
#[must_use]
pub fn convert_amount(amount: Decimal, rate: Decimal, decimal_places: u32) -> Option<Decimal> {
    amount
        .checked_mul(rate)
        .map(|converted| converted.round_dp_with_strategy(decimal_places, RoundingStrategy::MidpointNearestEven))
}

/// Converts an external money amount into internal balance units.
#[must_use]
pub fn to_internal_units(amount: Decimal, rate: Decimal) -> Option<Decimal> {
    convert_amount(amount, rate, BALANCE_SCALE)
}
