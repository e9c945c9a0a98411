//! Property-based tests for conversion rounding.

use proptest::prelude::*;
use rust_decimal::{Decimal, RoundingStrategy};

use super::convert::convert_with_rate;

/// Strategy to generate positive decimal amounts (0.01 to 1,000,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate positive exchange rates (0.0001 to 10000.0000).
fn positive_rate() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|v| Decimal::new(v, 4))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Conversion results never carry more than 2 decimal places.
    #[test]
    fn prop_convert_rounds_to_2_decimals(
        amount in positive_amount(),
        rate in positive_rate(),
    ) {
        let result = convert_with_rate(amount, rate);
        let scaled = result * Decimal::from(100);
        prop_assert_eq!(
            scaled,
            scaled.round(),
            "Result {} should have at most 2 decimal places",
            result
        );
    }

    /// Conversion is deterministic for identical inputs.
    #[test]
    fn prop_convert_is_deterministic(
        amount in positive_amount(),
        rate in positive_rate(),
    ) {
        prop_assert_eq!(
            convert_with_rate(amount, rate),
            convert_with_rate(amount, rate)
        );
    }

    /// Rate 1 preserves the amount (two-decimal inputs are already exact).
    #[test]
    fn prop_identity_rate_preserves_amount(
        amount in positive_amount(),
    ) {
        prop_assert_eq!(convert_with_rate(amount, Decimal::ONE), amount);
    }

    /// Positive inputs produce positive outputs at realistic magnitudes.
    #[test]
    fn prop_positive_inputs_positive_output(
        amount in (100i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2)),
        rate in (100i64..100_000_000i64).prop_map(|v| Decimal::new(v, 4)),
    ) {
        prop_assert!(convert_with_rate(amount, rate) > Decimal::ZERO);
    }
}

#[cfg(test)]
mod unit_tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_midpoints_round_to_even() {
        assert_eq!(
            dec!(2.125).round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven),
            dec!(2.12)
        );
        assert_eq!(convert_with_rate(dec!(2.135), Decimal::ONE), dec!(2.14));
        assert_eq!(convert_with_rate(dec!(2.125), Decimal::ONE), dec!(2.12));
    }

    #[test]
    fn test_documented_example() {
        // 100 at 0.913 converts to exactly 91.30.
        assert_eq!(convert_with_rate(dec!(100), dec!(0.913)), dec!(91.30));
    }
}
