use rust_decimal::Decimal;
use sacco_shared::types::round_money;

use crate::domain::{InterestMethod, SavingsAccount};

const DAYS_PER_YEAR: Decimal = Decimal::from_parts(365, 0, 0, false, 0);
const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// One day of interest on a savings balance, rounded to money precision.
///
/// Returns zero for products without interest and for non-positive balances.
#[must_use]
pub fn daily_interest(savings: &SavingsAccount) -> Decimal {
    match savings.interest_method {
        InterestMethod::None => Decimal::ZERO,
        InterestMethod::DailyBalance if savings.balance <= Decimal::ZERO => Decimal::ZERO,
        InterestMethod::DailyBalance => {
            round_money(savings.balance * savings.interest_rate / HUNDRED / DAYS_PER_YEAR)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SavingsProduct;
    use rstest::rstest;
    use rust_decimal_macros::dec;
    use sacco_shared::types::SavingsAccountId;

    fn savings(balance: Decimal, rate: Decimal, method: InterestMethod) -> SavingsAccount {
        SavingsAccount {
            id: SavingsAccountId::new(),
            product: SavingsProduct::Regular,
            balance,
            interest_rate: rate,
            interest_method: method,
            interest_earned: Decimal::ZERO,
        }
    }

    #[rstest]
    #[case(dec!(36500), dec!(10), InterestMethod::DailyBalance, dec!(10.00))]
    #[case(dec!(1000), dec!(5), InterestMethod::DailyBalance, dec!(0.14))]
    #[case(dec!(1000), dec!(5), InterestMethod::None, dec!(0))]
    #[case(dec!(-50), dec!(5), InterestMethod::DailyBalance, dec!(0))]
    fn test_daily_interest(
        #[case] balance: Decimal,
        #[case] rate: Decimal,
        #[case] method: InterestMethod,
        #[case] expected: Decimal,
    ) {
        assert_eq!(daily_interest(&savings(balance, rate, method)), expected);
    }
}
