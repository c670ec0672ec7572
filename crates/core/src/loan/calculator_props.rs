//! Property-based tests for LoanCalculationEngine.
//!
//! - Allocation never exceeds the payment or any outstanding bucket
//! - Allocation fills penalty before interest before principal
//! - A schedule always repays exactly the principal

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::calculator::LoanCalculationEngine;
use crate::fixtures;

/// Strategy to generate amounts (0.00 to 100,000.00).
fn amount() -> impl Strategy<Value = Decimal> {
    (0i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate positive principals (100.00 to 1,000,000.00).
fn principal() -> impl Strategy<Value = Decimal> {
    (10_000i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate annual rates (0.00% to 36.00%).
fn annual_rate() -> impl Strategy<Value = Decimal> {
    (0i64..3_600i64).prop_map(|basis| Decimal::new(basis, 2))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_allocation_never_exceeds_payment_or_buckets(
        penalty in amount(),
        interest in amount(),
        principal_balance in amount(),
        payment in amount(),
    ) {
        let mut loan = fixtures::active_loan(principal_balance, interest);
        loan.penalty_balance = penalty;

        let allocation =
            LoanCalculationEngine::default().calculate_payment_allocation(&loan, payment);

        prop_assert!(allocation.total() <= payment);
        prop_assert!(allocation.penalty <= penalty);
        prop_assert!(allocation.interest <= interest);
        prop_assert!(allocation.principal <= principal_balance);
        prop_assert_eq!(allocation.total(), payment.min(loan.total_owed()));
    }

    #[test]
    fn prop_allocation_order(
        penalty in amount(),
        interest in amount(),
        principal_balance in amount(),
        payment in amount(),
    ) {
        let mut loan = fixtures::active_loan(principal_balance, interest);
        loan.penalty_balance = penalty;

        let allocation =
            LoanCalculationEngine::default().calculate_payment_allocation(&loan, payment);

        if allocation.interest > Decimal::ZERO {
            prop_assert_eq!(allocation.penalty, penalty);
        }
        if allocation.principal > Decimal::ZERO {
            prop_assert_eq!(allocation.interest, interest);
        }
    }

    #[test]
    fn prop_schedule_repays_principal(
        principal in principal(),
        rate in annual_rate(),
        months in 1u32..=60,
    ) {
        let mut loan = fixtures::active_loan(principal, Decimal::ZERO);
        loan.interest_rate = rate;
        loan.repayment_period_months = months;
        let start = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();

        let schedule = LoanCalculationEngine::default()
            .generate_repayment_schedule(&loan, start)
            .unwrap();

        let repaid: Decimal = schedule.iter().map(|row| row.principal).sum();
        prop_assert_eq!(repaid, principal);
        prop_assert!(schedule.len() <= months as usize);
        prop_assert!(schedule.iter().all(|row| row.remaining_balance >= Decimal::ZERO));
        prop_assert!(schedule.windows(2).all(|pair| pair[0].due_date < pair[1].due_date));
    }
}
