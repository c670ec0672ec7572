//! Core error taxonomy for transaction processing.
//!
//! Caller errors (`InvalidTransaction`, `InsufficientBalance`) are surfaced
//! with a specific reason. Everything else that happens inside a unit of work
//! is wrapped in `ProcessingFailure` by the orchestrator after rollback.

use rust_decimal::Decimal;
use sacco_shared::AppError;
use sacco_shared::types::{BatchId, TransactionId};
use thiserror::Error;

use crate::loan::LoanCalculationError;
use crate::store::StoreError;

/// Result type alias using `CoreError`.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in the transaction processing core.
#[derive(Debug, Error)]
pub enum CoreError {
    // ========== Caller Errors ==========
    /// Bad input, unknown type, exceeded limit, or inactive member/account.
    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),

    /// Available balance does not cover the requested amount.
    #[error("Insufficient balance: available {available}, requested {requested}")]
    InsufficientBalance {
        /// Available balance at the time of the check.
        available: Decimal,
        /// Amount requested.
        requested: Decimal,
    },

    /// Transaction not found.
    #[error("Transaction not found: {0}")]
    TransactionNotFound(TransactionId),

    // ========== Internal Invariant Violations ==========
    /// A posted batch does not balance.
    #[error("Ledger batch {batch_id} is not balanced. Debit: {debit}, Credit: {credit}")]
    LedgerImbalance {
        /// The offending batch.
        batch_id: BatchId,
        /// Total debits in the batch.
        debit: Decimal,
        /// Total credits in the batch.
        credit: Decimal,
    },

    /// A handler produced a ledger leg that cannot be posted.
    #[error("Invalid ledger entry for account {account_code}: {reason}")]
    InvalidLedgerEntry {
        /// Account code of the offending leg.
        account_code: String,
        /// What was wrong.
        reason: String,
    },

    /// A loan calculation could not be carried out.
    #[error(transparent)]
    LoanCalculation(#[from] LoanCalculationError),

    // ========== Downstream Errors ==========
    /// Persistence port error.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Any failure during execution, after rollback.
    #[error("Transaction processing failed: {0}")]
    ProcessingFailure(#[source] Box<CoreError>),
}

impl CoreError {
    /// Shorthand for an `InvalidTransaction` with a reason.
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidTransaction(reason.into())
    }

    /// Returns true for errors caused by the caller's input.
    #[must_use]
    pub fn is_invalid_transaction(&self) -> bool {
        matches!(
            self,
            Self::InvalidTransaction(_)
                | Self::InsufficientBalance { .. }
                | Self::TransactionNotFound(_)
        )
    }

    /// Wraps internal errors in `ProcessingFailure`, leaving caller errors as they are.
    #[must_use]
    pub fn into_processing_failure(self) -> Self {
        if self.is_invalid_transaction() || matches!(self, Self::ProcessingFailure(_)) {
            self
        } else {
            Self::ProcessingFailure(Box::new(self))
        }
    }

    /// Returns the innermost error, unwrapping `ProcessingFailure`.
    #[must_use]
    pub fn root(&self) -> &Self {
        match self {
            Self::ProcessingFailure(inner) => inner.root(),
            other => other,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidTransaction(_) => "INVALID_TRANSACTION",
            Self::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            Self::TransactionNotFound(_) => "TRANSACTION_NOT_FOUND",
            Self::LedgerImbalance { .. } => "LEDGER_IMBALANCE",
            Self::InvalidLedgerEntry { .. } => "INVALID_LEDGER_ENTRY",
            Self::LoanCalculation(_) => "LOAN_CALCULATION_ERROR",
            Self::Store(_) => "STORE_ERROR",
            Self::ProcessingFailure(_) => "TRANSACTION_PROCESSING_FAILURE",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            // 422 Unprocessable - business rule rejections
            Self::InvalidTransaction(_) | Self::InsufficientBalance { .. } => 422,

            // 404 Not Found
            Self::TransactionNotFound(_) => 404,

            // 500 Internal Server Error
            Self::LedgerImbalance { .. }
            | Self::InvalidLedgerEntry { .. }
            | Self::LoanCalculation(_)
            | Self::Store(_)
            | Self::ProcessingFailure(_) => 500,
        }
    }

    /// Returns true if this error is retryable.
    ///
    /// The core never retries; callers resubmit a corrected intent.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        false
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidTransaction(_) | CoreError::InsufficientBalance { .. } => {
                Self::BusinessRule(err.to_string())
            }
            CoreError::TransactionNotFound(_) => Self::NotFound(err.to_string()),
            CoreError::Store(StoreError::Backend(message)) => Self::Database(message),
            // Internal details stay in the logs.
            CoreError::LedgerImbalance { .. }
            | CoreError::InvalidLedgerEntry { .. }
            | CoreError::LoanCalculation(_)
            | CoreError::Store(_)
            | CoreError::ProcessingFailure(_) => {
                Self::Internal("Transaction processing failed".to_string())
            }
        }
    }
}
