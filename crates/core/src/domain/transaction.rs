//! Transaction records and the intents that request them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sacco_shared::types::{AccountId, LoanId, MemberId, TransactionId, UserId};
use serde::{Deserialize, Serialize};

/// Which way a transaction moves its account's balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BalanceDirection {
    /// Balance increases by the net amount.
    Credit,
    /// Balance decreases by the gross amount (fees included).
    Debit,
}

/// Transaction type classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Cash deposit into savings.
    Deposit,
    /// Cash withdrawal from savings.
    Withdrawal,
    /// Purchase of share capital.
    SharePurchase,
    /// Payout of an approved loan.
    LoanDisbursement,
    /// Repayment against a disbursed loan.
    LoanRepayment,
    /// Wallet movement; the operation is carried separately.
    Wallet,
    /// Dividend credited to savings.
    DividendPayment,
    /// Mirror of a previously completed transaction.
    Reversal,
}

string_enum!(TransactionType {
    Deposit => "deposit",
    Withdrawal => "withdrawal",
    SharePurchase => "share_purchase",
    LoanDisbursement => "loan_disbursement",
    LoanRepayment => "loan_repayment",
    Wallet => "wallet",
    DividendPayment => "dividend_payment",
    Reversal => "reversal",
});

impl TransactionType {
    /// All types accepted by the processing pipeline.
    pub const PROCESSABLE: [Self; 7] = [
        Self::Deposit,
        Self::Withdrawal,
        Self::SharePurchase,
        Self::LoanDisbursement,
        Self::LoanRepayment,
        Self::Wallet,
        Self::DividendPayment,
    ];

    /// Short code used in transaction numbers.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Deposit => "DEP",
            Self::Withdrawal => "WDR",
            Self::SharePurchase => "SHR",
            Self::LoanDisbursement => "LDB",
            Self::LoanRepayment => "LRP",
            Self::Wallet => "WAL",
            Self::DividendPayment => "DIV",
            Self::Reversal => "REV",
        }
    }

    /// Reporting category of the type.
    #[must_use]
    pub const fn category(&self) -> TransactionCategory {
        match self {
            Self::Deposit | Self::Withdrawal => TransactionCategory::Savings,
            Self::SharePurchase => TransactionCategory::Shares,
            Self::LoanDisbursement | Self::LoanRepayment => TransactionCategory::Loans,
            Self::Wallet => TransactionCategory::Wallet,
            Self::DividendPayment => TransactionCategory::Dividends,
            Self::Reversal => TransactionCategory::Reversal,
        }
    }
}

/// Sub-type of a wallet transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalletOperation {
    /// Cash into the wallet.
    Topup,
    /// Cash out of the wallet.
    Withdrawal,
    /// Wallet into a savings account.
    ToSavings,
    /// Wallet into a loan repayment.
    ToLoan,
}

string_enum!(WalletOperation {
    Topup => "topup",
    Withdrawal => "withdrawal",
    ToSavings => "to_savings",
    ToLoan => "to_loan",
});

impl WalletOperation {
    /// Balance direction on the wallet itself.
    #[must_use]
    pub const fn direction(&self) -> BalanceDirection {
        match self {
            Self::Topup => BalanceDirection::Credit,
            Self::Withdrawal | Self::ToSavings | Self::ToLoan => BalanceDirection::Debit,
        }
    }
}

/// Reporting category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionCategory {
    /// Savings deposits and withdrawals.
    Savings,
    /// Share capital.
    Shares,
    /// Loan disbursements and repayments.
    Loans,
    /// Wallet movements.
    Wallet,
    /// Dividend payouts.
    Dividends,
    /// Reversals.
    Reversal,
}

string_enum!(TransactionCategory {
    Savings => "savings",
    Shares => "shares",
    Loans => "loans",
    Wallet => "wallet",
    Dividends => "dividends",
    Reversal => "reversal",
});

/// Transaction status.
///
/// Created `Pending`, finalized `Completed`, and later possibly `Reversed`.
/// `Failed` is reserved for records written by outer adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Being processed.
    Pending,
    /// All postings succeeded.
    Completed,
    /// Processing failed.
    Failed,
    /// Mirrored by a reversal transaction.
    Reversed,
}

string_enum!(TransactionStatus {
    Pending => "pending",
    Completed => "completed",
    Failed => "failed",
    Reversed => "reversed",
});

/// Append-only record of a ledger movement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier.
    pub id: TransactionId,
    /// Unique human-readable number.
    pub transaction_number: String,
    /// Owning member.
    pub member_id: MemberId,
    /// Account whose balance moves, if any.
    pub account_id: Option<AccountId>,
    /// Transaction type.
    pub transaction_type: TransactionType,
    /// Wallet sub-type, for wallet transactions.
    pub wallet_operation: Option<WalletOperation>,
    /// Reporting category.
    pub category: TransactionCategory,
    /// Gross amount.
    pub amount: Decimal,
    /// Fee charged.
    pub fee_amount: Decimal,
    /// Amount after fees.
    pub net_amount: Decimal,
    /// Account balance before the movement.
    pub balance_before: Decimal,
    /// Account balance after the movement.
    pub balance_after: Decimal,
    /// Current status.
    pub status: TransactionStatus,
    /// When the transaction happened.
    pub transaction_date: DateTime<Utc>,
    /// Loan affected, for loan and wallet-to-loan transactions.
    pub related_loan_id: Option<LoanId>,
    /// Counterpart account, for transfers.
    pub related_account_id: Option<AccountId>,
    /// Free-form description.
    pub description: Option<String>,
    /// Staff user who processed the transaction.
    pub processed_by: UserId,
    /// Reason given for the reversal.
    pub reversal_reason: Option<String>,
    /// Staff user who reversed the transaction.
    pub reversed_by: Option<UserId>,
    /// When the transaction was reversed.
    pub reversed_at: Option<DateTime<Utc>>,
    /// Handler-specific details.
    pub metadata: serde_json::Value,
}

impl Transaction {
    /// Direction this transaction moves its account's balance.
    ///
    /// Returns `None` for reversals, which undo another transaction's delta.
    #[must_use]
    pub fn direction(&self) -> Option<BalanceDirection> {
        match self.transaction_type {
            TransactionType::Deposit
            | TransactionType::SharePurchase
            | TransactionType::LoanDisbursement
            | TransactionType::DividendPayment => Some(BalanceDirection::Credit),
            TransactionType::Withdrawal | TransactionType::LoanRepayment => {
                Some(BalanceDirection::Debit)
            }
            TransactionType::Wallet => self.wallet_operation.map(|op| op.direction()),
            TransactionType::Reversal => None,
        }
    }

    /// Signed change this transaction applies to its account's balance.
    ///
    /// Credits add the net amount; debits subtract the gross amount, which
    /// already includes fees.
    #[must_use]
    pub fn balance_delta(&self) -> Option<Decimal> {
        self.direction().map(|direction| match direction {
            BalanceDirection::Credit => self.net_amount,
            BalanceDirection::Debit => -self.amount,
        })
    }

    /// Returns true if the transaction was mirrored by a reversal.
    #[must_use]
    pub fn is_reversed(&self) -> bool {
        self.status == TransactionStatus::Reversed
    }
}

/// A caller's request for a financial movement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionIntent {
    /// Member on whose behalf the movement happens.
    pub member_id: MemberId,
    /// Requested type.
    pub transaction_type: TransactionType,
    /// Requested amount, before fees.
    pub amount: Decimal,
    /// Account whose balance moves.
    pub account_id: Option<AccountId>,
    /// Loan affected.
    pub related_loan_id: Option<LoanId>,
    /// Counterpart account for transfers.
    pub related_account_id: Option<AccountId>,
    /// Wallet sub-type.
    pub wallet_operation: Option<WalletOperation>,
    /// Free-form description.
    pub description: Option<String>,
    /// Fee to charge.
    pub fee_amount: Option<Decimal>,
    /// Staff user submitting the intent.
    pub processed_by: UserId,
    /// Caller-supplied details.
    pub metadata: Option<serde_json::Value>,
    /// Set by onboarding flows, where the member is not yet active.
    #[serde(default)]
    pub onboarding: bool,
}

impl TransactionIntent {
    /// Creates an intent with no account, loan, or fee.
    #[must_use]
    pub fn new(
        member_id: MemberId,
        transaction_type: TransactionType,
        amount: Decimal,
        processed_by: UserId,
    ) -> Self {
        Self {
            member_id,
            transaction_type,
            amount,
            account_id: None,
            related_loan_id: None,
            related_account_id: None,
            wallet_operation: None,
            description: None,
            fee_amount: None,
            processed_by,
            metadata: None,
            onboarding: false,
        }
    }

    /// Sets the account whose balance moves.
    #[must_use]
    pub fn with_account(mut self, account_id: AccountId) -> Self {
        self.account_id = Some(account_id);
        self
    }

    /// Sets the loan affected.
    #[must_use]
    pub fn with_loan(mut self, loan_id: LoanId) -> Self {
        self.related_loan_id = Some(loan_id);
        self
    }

    /// Sets the counterpart account.
    #[must_use]
    pub fn with_related_account(mut self, account_id: AccountId) -> Self {
        self.related_account_id = Some(account_id);
        self
    }

    /// Sets the wallet sub-type.
    #[must_use]
    pub fn with_wallet_operation(mut self, operation: WalletOperation) -> Self {
        self.wallet_operation = Some(operation);
        self
    }

    /// Sets the fee.
    #[must_use]
    pub fn with_fee(mut self, fee: Decimal) -> Self {
        self.fee_amount = Some(fee);
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Marks the intent as part of an onboarding flow.
    #[must_use]
    pub fn during_onboarding(mut self) -> Self {
        self.onboarding = true;
        self
    }

    /// Fee to charge, defaulting to zero.
    #[must_use]
    pub fn fee(&self) -> Decimal {
        self.fee_amount.unwrap_or(Decimal::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;
    use std::str::FromStr;

    fn transaction(
        transaction_type: TransactionType,
        wallet_operation: Option<WalletOperation>,
    ) -> Transaction {
        Transaction {
            id: TransactionId::new(),
            transaction_number: "TXN-20260115-DEP-0001".to_string(),
            member_id: MemberId::new(),
            account_id: Some(AccountId::new()),
            transaction_type,
            wallet_operation,
            category: transaction_type.category(),
            amount: dec!(250),
            fee_amount: dec!(50),
            net_amount: dec!(200),
            balance_before: Decimal::ZERO,
            balance_after: Decimal::ZERO,
            status: TransactionStatus::Pending,
            transaction_date: Utc::now(),
            related_loan_id: None,
            related_account_id: None,
            description: None,
            processed_by: UserId::new(),
            reversal_reason: None,
            reversed_by: None,
            reversed_at: None,
            metadata: serde_json::Value::Null,
        }
    }

    #[rstest]
    #[case(TransactionType::Deposit, None, Some(dec!(200)))]
    #[case(TransactionType::Withdrawal, None, Some(dec!(-250)))]
    #[case(TransactionType::SharePurchase, None, Some(dec!(200)))]
    #[case(TransactionType::LoanDisbursement, None, Some(dec!(200)))]
    #[case(TransactionType::LoanRepayment, None, Some(dec!(-250)))]
    #[case(TransactionType::Wallet, Some(WalletOperation::Topup), Some(dec!(200)))]
    #[case(TransactionType::Wallet, Some(WalletOperation::ToSavings), Some(dec!(-250)))]
    #[case(TransactionType::Wallet, None, None)]
    #[case(TransactionType::Reversal, None, None)]
    fn test_balance_delta(
        #[case] transaction_type: TransactionType,
        #[case] operation: Option<WalletOperation>,
        #[case] expected: Option<Decimal>,
    ) {
        assert_eq!(transaction(transaction_type, operation).balance_delta(), expected);
    }

    #[test]
    fn test_type_codes_are_unique() {
        let mut codes: Vec<&str> = TransactionType::PROCESSABLE
            .iter()
            .map(TransactionType::code)
            .collect();
        codes.push(TransactionType::Reversal.code());
        let count = codes.len();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), count);
    }

    #[test]
    fn test_type_string_forms() {
        assert_eq!(TransactionType::SharePurchase.as_str(), "share_purchase");
        assert_eq!(
            TransactionType::from_str("loan_repayment").unwrap(),
            TransactionType::LoanRepayment
        );
        assert_eq!(WalletOperation::from_str("to_loan").unwrap(), WalletOperation::ToLoan);
        assert!(TransactionType::from_str("transfer").is_err());
    }

    #[test]
    fn test_intent_builder() {
        let account = AccountId::new();
        let intent = TransactionIntent::new(
            MemberId::new(),
            TransactionType::Withdrawal,
            dec!(200),
            UserId::new(),
        )
        .with_account(account)
        .with_fee(dec!(50))
        .with_description("ATM");

        assert_eq!(intent.account_id, Some(account));
        assert_eq!(intent.fee(), dec!(50));
        assert!(!intent.onboarding);
        assert_eq!(intent.description.as_deref(), Some("ATM"));
    }
}
