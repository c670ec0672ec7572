//! Loan calculation engine.

use chrono::{Months, NaiveDate};
use rust_decimal::{Decimal, MathematicalOps};
use sacco_shared::types::round_money;

use super::types::{LoanCalculationError, LoanSettings, PaymentAllocation, ScheduleInstallment};
use crate::domain::Loan;

const MONTHS_PER_YEAR: Decimal = Decimal::from_parts(12, 0, 0, false, 0);
const DAYS_PER_YEAR: Decimal = Decimal::from_parts(365, 0, 0, false, 0);
const DAYS_PER_MONTH: Decimal = Decimal::from_parts(30, 0, 0, false, 0);

/// Amortization, allocation, interest, and penalty calculations.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoanCalculationEngine {
    settings: LoanSettings,
}

impl LoanCalculationEngine {
    /// Creates an engine with the given penalty settings.
    #[must_use]
    pub const fn new(settings: LoanSettings) -> Self {
        Self { settings }
    }

    /// Monthly rate for an annual percentage.
    #[must_use]
    pub fn monthly_rate(annual_rate: Decimal) -> Decimal {
        annual_rate / Decimal::ONE_HUNDRED / MONTHS_PER_YEAR
    }

    /// Amortized installment `P * r(1+r)^n / ((1+r)^n - 1)`.
    ///
    /// Falls back to `P / n` when the rate is zero or the term is a single
    /// month.
    ///
    /// # Errors
    ///
    /// Returns an error for a zero term, non-positive principal, negative
    /// rate, or overflow.
    pub fn amortized_payment(
        principal: Decimal,
        annual_rate: Decimal,
        months: u32,
    ) -> Result<Decimal, LoanCalculationError> {
        if months == 0 {
            return Err(LoanCalculationError::ZeroPeriod);
        }
        if principal <= Decimal::ZERO {
            return Err(LoanCalculationError::InvalidPrincipal(principal));
        }
        if annual_rate < Decimal::ZERO {
            return Err(LoanCalculationError::NegativeRate(annual_rate));
        }

        let periods = Decimal::from(months);
        let rate = Self::monthly_rate(annual_rate);
        if rate.is_zero() || months <= 1 {
            return Ok(round_money(principal / periods));
        }

        let growth = (Decimal::ONE + rate)
            .checked_powi(i64::from(months))
            .ok_or(LoanCalculationError::Overflow)?;
        let numerator = principal
            .checked_mul(rate)
            .and_then(|value| value.checked_mul(growth))
            .ok_or(LoanCalculationError::Overflow)?;
        let payment = numerator
            .checked_div(growth - Decimal::ONE)
            .ok_or(LoanCalculationError::Overflow)?;

        Ok(round_money(payment))
    }

    /// Monthly installment of a loan.
    ///
    /// # Errors
    ///
    /// See [`Self::amortized_payment`].
    pub fn calculate_monthly_payment(&self, loan: &Loan) -> Result<Decimal, LoanCalculationError> {
        Self::amortized_payment(
            loan.principal_amount,
            loan.interest_rate,
            loan.repayment_period_months,
        )
    }

    /// Scheduled interest over the whole term: `installment * n - principal`.
    ///
    /// # Errors
    ///
    /// See [`Self::amortized_payment`].
    pub fn calculate_total_interest(&self, loan: &Loan) -> Result<Decimal, LoanCalculationError> {
        let schedule = self.generate_repayment_schedule(loan, NaiveDate::MIN)?;
        Ok(schedule.iter().map(|row| row.interest).sum())
    }

    /// Splits a payment across penalty, then interest, then principal.
    ///
    /// Each bucket takes at most its outstanding amount, so the allocation
    /// totals `min(payment, total owed)`.
    #[must_use]
    pub fn calculate_payment_allocation(&self, loan: &Loan, payment: Decimal) -> PaymentAllocation {
        let mut remaining = payment.max(Decimal::ZERO);
        let mut take = |outstanding: Decimal| {
            let portion = remaining.min(outstanding.max(Decimal::ZERO));
            remaining -= portion;
            portion
        };

        let penalty = take(loan.penalty_balance);
        let interest = take(loan.interest_balance);
        let principal = take(loan.principal_balance);

        PaymentAllocation {
            penalty,
            interest,
            principal,
        }
    }

    /// Builds the installment plan, with due dates one month apart after `start`.
    ///
    /// Each installment's interest is the remaining principal times the
    /// monthly rate. The last installment, or any whose principal would
    /// exceed the remaining balance, pays off exactly what is left.
    ///
    /// # Errors
    ///
    /// See [`Self::amortized_payment`]; also fails if a due date is out of range.
    pub fn generate_repayment_schedule(
        &self,
        loan: &Loan,
        start: NaiveDate,
    ) -> Result<Vec<ScheduleInstallment>, LoanCalculationError> {
        let monthly_payment = self.calculate_monthly_payment(loan)?;
        let rate = Self::monthly_rate(loan.interest_rate);
        let periods = loan.repayment_period_months;

        let mut balance = loan.principal_amount;
        let mut schedule = Vec::with_capacity(periods as usize);

        for installment in 1..=periods {
            let interest = round_money(balance * rate);
            let mut principal = monthly_payment - interest;
            if installment == periods || principal > balance {
                principal = balance;
            }
            balance -= principal;

            let due_date = start
                .checked_add_months(Months::new(installment))
                .ok_or(LoanCalculationError::DateOutOfRange(installment))?;

            schedule.push(ScheduleInstallment {
                installment,
                due_date,
                principal,
                interest,
                total: principal + interest,
                remaining_balance: balance,
            });

            if balance <= Decimal::ZERO {
                break;
            }
        }

        Ok(schedule)
    }

    /// Interest accrued on the principal balance over `days`.
    #[must_use]
    pub fn calculate_accrued_interest(&self, loan: &Loan, days: u32) -> Decimal {
        let daily =
            loan.principal_balance * loan.interest_rate / Decimal::ONE_HUNDRED / DAYS_PER_YEAR;
        round_money(daily * Decimal::from(days))
    }

    /// Penalty on an overdue amount for the days beyond the grace period.
    #[must_use]
    pub fn calculate_penalty(&self, overdue_amount: Decimal, days_overdue: u32) -> Decimal {
        let chargeable = days_overdue.saturating_sub(self.settings.grace_period_days);
        if chargeable == 0 || overdue_amount <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        let monthly = overdue_amount * self.settings.penalty_rate_per_month / Decimal::ONE_HUNDRED;
        let daily = monthly / DAYS_PER_MONTH;
        round_money(daily * Decimal::from(chargeable))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn engine() -> LoanCalculationEngine {
        LoanCalculationEngine::default()
    }

    #[rstest]
    #[case(dec!(10000), dec!(12), 12, dec!(888.49))]
    #[case(dec!(12000), dec!(0), 12, dec!(1000.00))]
    #[case(dec!(5000), dec!(18), 1, dec!(5000.00))]
    #[case(dec!(100000), dec!(24), 24, dec!(5287.11))]
    fn test_amortized_payment(
        #[case] principal: Decimal,
        #[case] rate: Decimal,
        #[case] months: u32,
        #[case] expected: Decimal,
    ) {
        assert_eq!(
            LoanCalculationEngine::amortized_payment(principal, rate, months).unwrap(),
            expected
        );
    }

    #[test]
    fn test_amortized_payment_rejects_bad_input() {
        assert_eq!(
            LoanCalculationEngine::amortized_payment(dec!(1000), dec!(12), 0),
            Err(LoanCalculationError::ZeroPeriod)
        );
        assert!(LoanCalculationEngine::amortized_payment(dec!(0), dec!(12), 12).is_err());
        assert!(LoanCalculationEngine::amortized_payment(dec!(1000), dec!(-1), 12).is_err());
    }

    #[test]
    fn test_allocation_penalty_interest_principal() {
        let mut loan = fixtures::active_loan(dec!(5000), dec!(300));
        loan.penalty_balance = Decimal::ZERO;

        let allocation = engine().calculate_payment_allocation(&loan, dec!(1000));

        assert_eq!(
            allocation,
            PaymentAllocation {
                penalty: dec!(0),
                interest: dec!(300),
                principal: dec!(700),
            }
        );
    }

    #[test]
    fn test_allocation_pays_penalty_first() {
        let mut loan = fixtures::active_loan(dec!(5000), dec!(300));
        loan.penalty_balance = dec!(50);

        let allocation = engine().calculate_payment_allocation(&loan, dec!(200));

        assert_eq!(allocation.penalty, dec!(50));
        assert_eq!(allocation.interest, dec!(150));
        assert_eq!(allocation.principal, Decimal::ZERO);
    }

    #[test]
    fn test_allocation_caps_at_total_owed() {
        let loan = fixtures::active_loan(dec!(500), dec!(20));
        let allocation = engine().calculate_payment_allocation(&loan, dec!(1000));
        assert_eq!(allocation.total(), dec!(520));
    }

    #[test]
    fn test_schedule_pays_off_principal() {
        let loan = fixtures::active_loan(dec!(10000), Decimal::ZERO);
        let start = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();

        let schedule = engine().generate_repayment_schedule(&loan, start).unwrap();

        assert_eq!(schedule.len(), 12);
        assert_eq!(schedule[0].due_date, NaiveDate::from_ymd_opt(2026, 2, 28).unwrap());
        assert_eq!(schedule[0].interest, dec!(100.00));
        assert_eq!(schedule[0].total, dec!(888.49));
        let principal: Decimal = schedule.iter().map(|row| row.principal).sum();
        assert_eq!(principal, dec!(10000));
        assert_eq!(schedule.last().unwrap().remaining_balance, Decimal::ZERO);
    }

    #[test]
    fn test_zero_rate_schedule() {
        let mut loan = fixtures::active_loan(dec!(1000), Decimal::ZERO);
        loan.interest_rate = Decimal::ZERO;
        loan.repayment_period_months = 3;

        let schedule = engine()
            .generate_repayment_schedule(&loan, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap())
            .unwrap();

        assert_eq!(schedule.len(), 3);
        assert_eq!(schedule[0].principal, dec!(333.33));
        assert_eq!(schedule[2].principal, dec!(333.34));
        assert!(schedule.iter().all(|row| row.interest.is_zero()));
    }

    #[test]
    fn test_total_interest() {
        let loan = fixtures::active_loan(dec!(10000), Decimal::ZERO);
        let total = engine().calculate_total_interest(&loan).unwrap();
        assert!(total > dec!(600) && total < dec!(700));
    }

    #[test]
    fn test_accrued_interest() {
        let loan = fixtures::active_loan(dec!(36500), Decimal::ZERO);
        assert_eq!(engine().calculate_accrued_interest(&loan, 30), dec!(360.00));
    }

    #[rstest]
    #[case(0, 10, dec!(1000), dec!(16.67))]
    #[case(5, 10, dec!(1000), dec!(8.33))]
    #[case(10, 10, dec!(1000), dec!(0))]
    #[case(0, 10, dec!(0), dec!(0))]
    fn test_penalty(
        #[case] grace: u32,
        #[case] days: u32,
        #[case] overdue: Decimal,
        #[case] expected: Decimal,
    ) {
        let engine = LoanCalculationEngine::new(LoanSettings {
            penalty_rate_per_month: dec!(5),
            grace_period_days: grace,
        });
        assert_eq!(engine.calculate_penalty(overdue, days), expected);
    }
}
