//! Per-transaction-type validation, side effects, and ledger legs.
//!
//! Each processable [`TransactionType`] has one [`TransactionHandler`]
//! registered in a [`HandlerRegistry`]. Adding a type means adding a handler;
//! the orchestrator does not change.

mod deposit;
mod dividend;
mod loan_disbursement;
mod loan_repayment;
mod share_purchase;
mod wallet;
mod withdrawal;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::balance::BalanceLedger;
use crate::domain::{
    Account, Accountable, BalanceDirection, Transaction, TransactionIntent, TransactionType,
};
use crate::error::{CoreError, CoreResult};
use crate::general_ledger::{AccountingEntry, GlAccount};
use crate::loan::LoanCalculationEngine;
use crate::numbering::NumberGenerator;
use crate::store::{StoreError, UnitOfWork};

pub use deposit::DepositHandler;
pub use dividend::DividendPaymentHandler;
pub use loan_disbursement::LoanDisbursementHandler;
pub use loan_repayment::LoanRepaymentHandler;
pub use share_purchase::{SharePurchaseHandler, ShareSettings};
pub use wallet::WalletHandler;
pub use withdrawal::WithdrawalHandler;

/// Everything a handler may use while a transaction is processed.
pub struct HandlerContext<'a> {
    /// The unit of work the transaction runs in.
    pub uow: &'a mut dyn UnitOfWork,
    /// Processing time.
    pub now: DateTime<Utc>,
    /// Number allocation.
    pub numbers: NumberGenerator,
    /// Account balance queries.
    pub balances: BalanceLedger,
    /// Loan calculations.
    pub loans: LoanCalculationEngine,
}

/// Amount, fee, and net amount recorded on a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionAmounts {
    /// Gross amount.
    pub amount: Decimal,
    /// Fee charged.
    pub fee: Decimal,
    /// Amount after fees.
    pub net: Decimal,
}

impl TransactionAmounts {
    /// Derives the recorded amounts from an intent.
    ///
    /// Credits record the requested amount with the fee taken out of the net.
    /// Debits record the requested amount as net with the fee added on top.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransaction` for a negative fee or a credit whose fee
    /// consumes the whole amount.
    pub fn for_intent(intent: &TransactionIntent, direction: BalanceDirection) -> CoreResult<Self> {
        let fee = intent.fee();
        if fee < Decimal::ZERO {
            return Err(CoreError::invalid("Fee must not be negative"));
        }

        match direction {
            BalanceDirection::Credit => {
                if fee >= intent.amount {
                    return Err(CoreError::invalid("Fee must be less than the amount"));
                }
                Ok(Self {
                    amount: intent.amount,
                    fee,
                    net: intent.amount - fee,
                })
            }
            BalanceDirection::Debit => Ok(Self {
                amount: intent.amount + fee,
                fee,
                net: intent.amount,
            }),
        }
    }
}

/// Type-specific behaviour plugged into the orchestrator.
#[async_trait]
pub trait TransactionHandler: Send + Sync {
    /// The type this handler processes.
    fn transaction_type(&self) -> TransactionType;

    /// Which way the intent moves its account's balance.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransaction` if the intent lacks what decides it.
    fn direction(&self, intent: &TransactionIntent) -> CoreResult<BalanceDirection>;

    /// Checks type-specific preconditions before anything is written.
    async fn validate(
        &self,
        ctx: &mut HandlerContext<'_>,
        intent: &TransactionIntent,
    ) -> CoreResult<()>;

    /// Applies type-specific side effects to the pending transaction.
    async fn execute(
        &self,
        ctx: &mut HandlerContext<'_>,
        transaction: &mut Transaction,
        intent: &TransactionIntent,
    ) -> CoreResult<()>;

    /// Returns the ledger legs of the executed transaction.
    async fn accounting_entries(
        &self,
        ctx: &mut HandlerContext<'_>,
        transaction: &Transaction,
        intent: &TransactionIntent,
    ) -> CoreResult<Vec<AccountingEntry>>;
}

/// Handlers keyed by transaction type.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<TransactionType, Arc<dyn TransactionHandler>>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with a handler for every processable type.
    #[must_use]
    pub fn standard(shares: ShareSettings) -> Self {
        let mut registry = Self::new();
        registry.register(DepositHandler);
        registry.register(WithdrawalHandler);
        registry.register(SharePurchaseHandler::new(shares));
        registry.register(LoanDisbursementHandler);
        registry.register(LoanRepaymentHandler);
        registry.register(WalletHandler);
        registry.register(DividendPaymentHandler);
        registry
    }

    /// Registers a handler, replacing any handler of the same type.
    pub fn register(&mut self, handler: impl TransactionHandler + 'static) {
        self.handlers
            .insert(handler.transaction_type(), Arc::new(handler));
    }

    /// Returns the handler of a type.
    #[must_use]
    pub fn get(&self, transaction_type: TransactionType) -> Option<Arc<dyn TransactionHandler>> {
        self.handlers.get(&transaction_type).cloned()
    }
}

/// Reads the intent's account and its accountable without locking.
async fn intent_account(
    ctx: &mut HandlerContext<'_>,
    intent: &TransactionIntent,
) -> CoreResult<(Account, Accountable)> {
    let account_id = intent.account_id.ok_or_else(|| {
        CoreError::invalid(format!(
            "An account is required for {}",
            intent.transaction_type
        ))
    })?;
    let account = ctx
        .uow
        .find_account(account_id)
        .await?
        .ok_or_else(|| CoreError::invalid(format!("Account {account_id} not found")))?;
    let accountable = ctx
        .uow
        .find_accountable(account.accountable)
        .await?
        .ok_or_else(|| StoreError::missing("accountable", account.accountable.id()))?;
    Ok((account, accountable))
}

/// Reads the intent's account and requires a savings product behind it.
async fn intent_savings_account(
    ctx: &mut HandlerContext<'_>,
    intent: &TransactionIntent,
) -> CoreResult<(Account, Accountable)> {
    let (account, accountable) = intent_account(ctx, intent).await?;
    if !accountable.is_savings() {
        return Err(CoreError::invalid(format!(
            "Account {} is not a savings account",
            account.account_number
        )));
    }
    Ok((account, accountable))
}

/// Member liability account a savings accountable posts to.
fn savings_gl_account(accountable: &Accountable) -> GlAccount {
    if accountable.is_wallet() {
        GlAccount::MEMBER_WALLETS
    } else {
        GlAccount::MEMBER_SAVINGS
    }
}

/// Fee income leg; zero fees produce a zero leg the poster drops.
fn fee_leg(transaction: &Transaction) -> AccountingEntry {
    GlAccount::FEE_INCOME.credit(
        transaction.fee_amount,
        format!("Fee on {}", transaction.transaction_number),
    )
}

/// Adds `details` to the transaction's metadata object, keeping caller keys.
fn merge_metadata(transaction: &mut Transaction, details: serde_json::Value) {
    if !transaction.metadata.is_object() {
        transaction.metadata = serde_json::Value::Object(serde_json::Map::new());
    }
    if let (Some(target), serde_json::Value::Object(source)) =
        (transaction.metadata.as_object_mut(), details)
    {
        target.extend(source);
    }
}

/// Line description shared by a transaction's legs.
fn describe(transaction: &Transaction, fallback: &str) -> String {
    transaction
        .description
        .clone()
        .unwrap_or_else(|| format!("{fallback} {}", transaction.transaction_number))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;
    use sacco_shared::types::{MemberId, UserId};

    fn intent(amount: Decimal, fee: Option<Decimal>) -> TransactionIntent {
        let intent = TransactionIntent::new(
            MemberId::new(),
            TransactionType::Deposit,
            amount,
            UserId::new(),
        );
        match fee {
            Some(fee) => intent.with_fee(fee),
            None => intent,
        }
    }

    #[rstest]
    #[case(BalanceDirection::Credit, dec!(500), None, dec!(500), dec!(500))]
    #[case(BalanceDirection::Credit, dec!(500), Some(dec!(20)), dec!(500), dec!(480))]
    #[case(BalanceDirection::Debit, dec!(200), Some(dec!(50)), dec!(250), dec!(200))]
    #[case(BalanceDirection::Debit, dec!(200), None, dec!(200), dec!(200))]
    fn test_amounts_for_intent(
        #[case] direction: BalanceDirection,
        #[case] requested: Decimal,
        #[case] fee: Option<Decimal>,
        #[case] amount: Decimal,
        #[case] net: Decimal,
    ) {
        let amounts = TransactionAmounts::for_intent(&intent(requested, fee), direction).unwrap();
        assert_eq!(amounts.amount, amount);
        assert_eq!(amounts.net, net);
        assert_eq!(amounts.amount - amounts.net, amounts.fee);
    }

    #[test]
    fn test_amounts_reject_bad_fees() {
        let negative = intent(dec!(100), Some(dec!(-1)));
        assert!(TransactionAmounts::for_intent(&negative, BalanceDirection::Debit).is_err());
        let whole = intent(dec!(100), Some(dec!(100)));
        assert!(TransactionAmounts::for_intent(&whole, BalanceDirection::Credit).is_err());
    }

    #[test]
    fn test_merge_metadata_keeps_caller_keys() {
        let mut transaction = crate::fixtures::transaction(dec!(1000));
        transaction.metadata = serde_json::json!({ "channel": "branch" });

        merge_metadata(&mut transaction, serde_json::json!({ "units": 1 }));

        assert_eq!(transaction.metadata["channel"], "branch");
        assert_eq!(transaction.metadata["units"], 1);
    }

    #[test]
    fn test_standard_registry_covers_processable_types() {
        let registry = HandlerRegistry::standard(ShareSettings::default());
        for transaction_type in TransactionType::PROCESSABLE {
            let handler = registry.get(transaction_type).unwrap();
            assert_eq!(handler.transaction_type(), transaction_type);
        }
        assert!(registry.get(TransactionType::Reversal).is_none());
    }
}
