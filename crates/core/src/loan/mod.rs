//! Loan amortization, payment allocation, and repayment schedules.
//!
//! All calculations use `Decimal` and round money with banker's rounding.
//! Rates are annual percentages.

mod calculator;
mod types;

#[cfg(test)]
mod calculator_props;

pub use calculator::LoanCalculationEngine;
pub use types::{LoanCalculationError, LoanSettings, PaymentAllocation, ScheduleInstallment};
