//! Loan and repayment records.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sacco_shared::types::{LoanAccountId, LoanId, LoanRepaymentId, MemberId, TransactionId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Loan lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    /// Application submitted.
    Pending,
    /// Approved and awaiting disbursement.
    Approved,
    /// Funds released.
    Disbursed,
    /// Under repayment.
    Active,
    /// Fully repaid.
    Completed,
    /// Application rejected.
    Rejected,
}

string_enum!(LoanStatus {
    Pending => "pending",
    Approved => "approved",
    Disbursed => "disbursed",
    Active => "active",
    Completed => "completed",
    Rejected => "rejected",
});

impl LoanStatus {
    /// Returns true if the loan accepts repayments.
    #[must_use]
    pub const fn accepts_repayments(&self) -> bool {
        matches!(self, Self::Disbursed | Self::Active)
    }
}

/// A member loan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    /// Unique identifier.
    pub id: LoanId,
    /// Borrowing member.
    pub member_id: MemberId,
    /// Member's loan aggregate.
    pub loan_account_id: LoanAccountId,
    /// Product the loan was issued under.
    pub loan_product_id: Uuid,
    /// Amount borrowed.
    pub principal_amount: Decimal,
    /// Annual interest rate in percent.
    pub interest_rate: Decimal,
    /// Principal plus scheduled interest.
    pub total_amount: Decimal,
    /// Number of monthly installments.
    pub repayment_period_months: u32,
    /// Scheduled installment amount.
    pub monthly_payment: Decimal,
    /// Current status.
    pub status: LoanStatus,
    /// Total still owed; never negative.
    pub outstanding_balance: Decimal,
    /// Principal still owed.
    pub principal_balance: Decimal,
    /// Interest still owed.
    pub interest_balance: Decimal,
    /// Penalties still owed.
    pub penalty_balance: Decimal,
    /// Sum of repayments received.
    pub total_paid: Decimal,
    /// Date the funds were released.
    pub disbursement_date: Option<NaiveDate>,
}

impl Loan {
    /// Sum of the penalty, interest, and principal buckets.
    #[must_use]
    pub fn total_owed(&self) -> Decimal {
        self.penalty_balance + self.interest_balance + self.principal_balance
    }
}

/// Record of how one repayment was split across the loan's buckets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanRepayment {
    /// Unique identifier.
    pub id: LoanRepaymentId,
    /// Loan repaid.
    pub loan_id: LoanId,
    /// Transaction carrying the payment.
    pub transaction_id: TransactionId,
    /// Amount applied.
    pub amount: Decimal,
    /// Portion applied to principal.
    pub principal_amount: Decimal,
    /// Portion applied to interest.
    pub interest_amount: Decimal,
    /// Portion applied to penalties.
    pub penalty_amount: Decimal,
    /// Outstanding balance after the payment.
    pub balance_after: Decimal,
    /// Payment date.
    pub payment_date: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_accepts_repayments() {
        assert!(LoanStatus::Disbursed.accepts_repayments());
        assert!(LoanStatus::Active.accepts_repayments());
        assert!(!LoanStatus::Approved.accepts_repayments());
        assert!(!LoanStatus::Completed.accepts_repayments());
    }

    #[test]
    fn test_total_owed() {
        let loan = Loan {
            id: LoanId::new(),
            member_id: MemberId::new(),
            loan_account_id: LoanAccountId::new(),
            loan_product_id: Uuid::new_v4(),
            principal_amount: dec!(5000),
            interest_rate: dec!(12),
            total_amount: dec!(5600),
            repayment_period_months: 12,
            monthly_payment: dec!(444.24),
            status: LoanStatus::Active,
            outstanding_balance: dec!(5350),
            principal_balance: dec!(5000),
            interest_balance: dec!(300),
            penalty_balance: dec!(50),
            total_paid: Decimal::ZERO,
            disbursement_date: None,
        };
        assert_eq!(loan.total_owed(), dec!(5350));
    }
}
