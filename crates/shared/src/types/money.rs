//! Money helpers with decimal precision.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Every amount in the system is a `rust_decimal::Decimal`.

use rust_decimal::{Decimal, RoundingStrategy};

/// Number of decimal places money is stored with.
pub const MONEY_SCALE: u32 = 2;

/// Maximum difference tolerated between ledger debits and credits (0.01).
pub const LEDGER_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Rounds an amount to money precision using Banker's Rounding.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointNearestEven)
}

/// Returns true if two amounts differ by no more than [`LEDGER_TOLERANCE`].
#[must_use]
pub fn within_tolerance(left: Decimal, right: Decimal) -> bool {
    (left - right).abs() <= LEDGER_TOLERANCE
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[test]
    fn test_tolerance_constant() {
        assert_eq!(LEDGER_TOLERANCE, dec!(0.01));
    }

    #[rstest]
    #[case(dec!(10.005), dec!(10.00))]
    #[case(dec!(10.015), dec!(10.02))]
    #[case(dec!(10.0149), dec!(10.01))]
    #[case(dec!(-3.335), dec!(-3.34))]
    fn test_round_money_bankers(#[case] input: Decimal, #[case] expected: Decimal) {
        assert_eq!(round_money(input), expected);
    }

    #[rstest]
    #[case(dec!(100.00), dec!(100.00), true)]
    #[case(dec!(100.00), dec!(100.01), true)]
    #[case(dec!(100.01), dec!(100.00), true)]
    #[case(dec!(100.00), dec!(100.02), false)]
    fn test_within_tolerance(
        #[case] left: Decimal,
        #[case] right: Decimal,
        #[case] expected: bool,
    ) {
        assert_eq!(within_tolerance(left, right), expected);
    }
}
