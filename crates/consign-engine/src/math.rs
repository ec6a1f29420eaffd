//! Zero-guarded arithmetic shared by every aggregate.
//!
//! Any ratio whose denominator is zero (or whose input set is empty) yields
//! zero instead of NaN, infinity or a panic.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

/// `numerator / denominator`, or zero when the denominator is zero.
pub fn ratio(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator.is_zero() {
        return Decimal::ZERO;
    }
    numerator.checked_div(denominator).unwrap_or(Decimal::ZERO)
}

/// Ratio rounded to four places, for margins and rates.
pub fn rate(numerator: Decimal, denominator: Decimal) -> Decimal {
    ratio(numerator, denominator).round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero)
}

/// Percentage change from `prior` to `current`; zero when `prior` is zero.
pub fn percent_change(current: Decimal, prior: Decimal) -> Decimal {
    if prior.is_zero() {
        return Decimal::ZERO;
    }
    round2(ratio(current - prior, prior.abs()) * dec!(100))
}

/// Arithmetic mean, zero for an empty input.
pub fn mean<I>(values: I) -> Decimal
where
    I: IntoIterator<Item = Decimal>,
{
    let (sum, count) = values
        .into_iter()
        .fold((Decimal::ZERO, 0u64), |(sum, count), value| (sum + value, count + 1));
    ratio(sum, Decimal::from(count))
}

/// Currency and percentage rounding used for reported figures.
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
