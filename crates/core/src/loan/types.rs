//! Loan calculation types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sacco_shared::config::LoansConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Loan calculation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LoanCalculationError {
    /// The repayment period is zero months.
    #[error("Repayment period must be at least one month")]
    ZeroPeriod,

    /// Principal is zero or negative.
    #[error("Principal must be greater than zero, got {0}")]
    InvalidPrincipal(Decimal),

    /// Interest rate is negative.
    #[error("Interest rate must not be negative, got {0}")]
    NegativeRate(Decimal),

    /// An intermediate value does not fit in a `Decimal`.
    #[error("Loan calculation overflowed")]
    Overflow,

    /// A due date falls outside the supported calendar.
    #[error("Due date out of range for installment {0}")]
    DateOutOfRange(u32),
}

/// Penalty settings, built once from [`LoansConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoanSettings {
    /// Penalty per month on overdue amounts, in percent.
    pub penalty_rate_per_month: Decimal,
    /// Days after the due date before penalties accrue.
    pub grace_period_days: u32,
}

impl From<&LoansConfig> for LoanSettings {
    fn from(config: &LoansConfig) -> Self {
        Self {
            penalty_rate_per_month: config.penalty_rate_per_month,
            grace_period_days: config.grace_period_days,
        }
    }
}

impl Default for LoanSettings {
    fn default() -> Self {
        Self::from(&LoansConfig::default())
    }
}

/// How a payment splits across a loan's buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PaymentAllocation {
    /// Applied to penalties.
    pub penalty: Decimal,
    /// Applied to interest.
    pub interest: Decimal,
    /// Applied to principal.
    pub principal: Decimal,
}

impl PaymentAllocation {
    /// Sum of the three buckets.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.penalty + self.interest + self.principal
    }
}

/// One row of a repayment schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleInstallment {
    /// Installment number, starting at 1.
    pub installment: u32,
    /// Due date.
    pub due_date: NaiveDate,
    /// Principal portion.
    pub principal: Decimal,
    /// Interest portion.
    pub interest: Decimal,
    /// Principal plus interest.
    pub total: Decimal,
    /// Principal still owed after this installment.
    pub remaining_balance: Decimal,
}
