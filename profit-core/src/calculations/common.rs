//! Shared helpers for presenting calculation results.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds a decimal value to exactly two decimal places using half-up rounding.
///
/// Values at exactly 0.005 are rounded away from zero. Used when presenting
/// results; calculations themselves keep full precision.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use profit_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(123.454)), dec!(123.45));
/// assert_eq!(round_half_up(dec!(123.455)), dec!(123.46));
/// assert_eq!(round_half_up(dec!(-123.455)), dec!(-123.46)); // Away from zero
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Scales `value` by a percentage change: `value × (1 + pct / 100)`.
///
/// Returns `None` on overflow.
///
/// ```
/// use rust_decimal_macros::dec;
/// use profit_core::calculations::common::apply_percent_change;
///
/// assert_eq!(apply_percent_change(dec!(50), dec!(10)), Some(dec!(55)));
/// assert_eq!(apply_percent_change(dec!(80000), dec!(-25)), Some(dec!(60000)));
/// ```
pub fn apply_percent_change(
    value: Decimal,
    pct: Decimal,
) -> Option<Decimal> {
    let factor = Decimal::ONE.checked_add(pct.checked_div(Decimal::ONE_HUNDRED)?)?;
    value.checked_mul(factor)
}
