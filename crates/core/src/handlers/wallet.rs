use async_trait::async_trait;
use sacco_shared::types::{AccountId, LoanId};
use serde_json::json;

use super::loan_repayment::{allocation_legs, apply_repayment, check_repayable, stored_allocation};
use super::{HandlerContext, TransactionHandler, describe, fee_leg, intent_account, merge_metadata};
use crate::domain::{
    BalanceDirection, Transaction, TransactionIntent, TransactionType, WalletOperation,
};
use crate::error::{CoreError, CoreResult};
use crate::general_ledger::{AccountingEntry, GlAccount};
use crate::store::StoreError;

/// Mobile wallet movements: top-ups, cash-outs, and transfers out of the
/// wallet into savings or a loan.
///
/// | operation    | debit                | credit                          |
/// |--------------|----------------------|---------------------------------|
/// | `topup`      | Cash (amount)        | Member Wallets (net)            |
/// | `withdrawal` | Member Wallets (amt) | Cash (net)                      |
/// | `to_savings` | Member Wallets (amt) | Member Savings (net)            |
/// | `to_loan`    | Member Wallets (amt) | Penalty, Interest, Loans (net)  |
///
/// Every operation credits Fee Income with the fee.
#[derive(Debug, Clone, Copy, Default)]
pub struct WalletHandler;

fn operation(intent: &TransactionIntent) -> CoreResult<WalletOperation> {
    intent
        .wallet_operation
        .ok_or_else(|| CoreError::invalid("A wallet operation is required"))
}

fn related_account(intent: &TransactionIntent) -> CoreResult<AccountId> {
    intent
        .related_account_id
        .ok_or_else(|| CoreError::invalid("A destination savings account is required"))
}

fn related_loan(intent: &TransactionIntent) -> CoreResult<LoanId> {
    intent
        .related_loan_id
        .ok_or_else(|| CoreError::invalid("A loan is required for a wallet repayment"))
}

#[async_trait]
impl TransactionHandler for WalletHandler {
    fn transaction_type(&self) -> TransactionType {
        TransactionType::Wallet
    }

    fn direction(&self, intent: &TransactionIntent) -> CoreResult<BalanceDirection> {
        Ok(operation(intent)?.direction())
    }

    async fn validate(
        &self,
        ctx: &mut HandlerContext<'_>,
        intent: &TransactionIntent,
    ) -> CoreResult<()> {
        let operation = operation(intent)?;
        let (account, accountable) = intent_account(ctx, intent).await?;
        if !accountable.is_wallet() {
            return Err(CoreError::invalid(format!(
                "Account {} is not a wallet",
                account.account_number
            )));
        }

        if operation.direction() == BalanceDirection::Debit {
            let available = ctx
                .balances
                .get_available_balance(ctx.uow, &account, &accountable, None)
                .await?;
            if available < intent.amount {
                return Err(CoreError::InsufficientBalance {
                    available,
                    requested: intent.amount,
                });
            }
        }

        match operation {
            WalletOperation::Topup | WalletOperation::Withdrawal => {}
            WalletOperation::ToSavings => {
                let target_id = related_account(intent)?;
                if target_id == account.id {
                    return Err(CoreError::invalid(
                        "A wallet cannot transfer to itself",
                    ));
                }
                let target = ctx
                    .uow
                    .find_account(target_id)
                    .await?
                    .ok_or_else(|| CoreError::invalid(format!("Account {target_id} not found")))?;
                if target.member_id != intent.member_id {
                    return Err(CoreError::invalid(format!(
                        "Account {} does not belong to member {}",
                        target.account_number, intent.member_id
                    )));
                }
                if !target.is_active() {
                    return Err(CoreError::invalid(format!(
                        "Account {} is {}",
                        target.account_number, target.status
                    )));
                }
                let target_accountable = ctx
                    .uow
                    .find_accountable(target.accountable)
                    .await?
                    .ok_or_else(|| StoreError::missing("accountable", target.accountable.id()))?;
                if !target_accountable.is_savings() || target_accountable.is_wallet() {
                    return Err(CoreError::invalid(format!(
                        "Account {} is not a savings account",
                        target.account_number
                    )));
                }
            }
            WalletOperation::ToLoan => {
                let loan_id = related_loan(intent)?;
                let loan = ctx
                    .uow
                    .find_loan(loan_id)
                    .await?
                    .ok_or_else(|| CoreError::invalid(format!("Loan {loan_id} not found")))?;
                check_repayable(&loan, intent.member_id, intent.amount)?;
            }
        }
        Ok(())
    }

    async fn execute(
        &self,
        ctx: &mut HandlerContext<'_>,
        transaction: &mut Transaction,
        intent: &TransactionIntent,
    ) -> CoreResult<()> {
        match operation(intent)? {
            WalletOperation::Topup | WalletOperation::Withdrawal => {}
            WalletOperation::ToSavings => {
                let target_id = related_account(intent)?;
                let (before, after) = ctx
                    .balances
                    .credit_related_account(ctx.uow, target_id, transaction.net_amount, ctx.now)
                    .await?;
                merge_metadata(
                    transaction,
                    json!({
                        "target_account_id": target_id,
                        "target_balance_before": before,
                        "target_balance_after": after,
                    }),
                );
            }
            WalletOperation::ToLoan => {
                let loan_id = related_loan(intent)?;
                apply_repayment(ctx, loan_id, transaction).await?;
            }
        }
        Ok(())
    }

    async fn accounting_entries(
        &self,
        _ctx: &mut HandlerContext<'_>,
        transaction: &Transaction,
        intent: &TransactionIntent,
    ) -> CoreResult<Vec<AccountingEntry>> {
        let operation = operation(intent)?;
        let description = describe(transaction, &format!("Wallet {operation}"));

        let mut legs = match operation {
            WalletOperation::Topup => vec![
                GlAccount::CASH.debit(transaction.amount, description.clone()),
                GlAccount::MEMBER_WALLETS.credit(transaction.net_amount, description),
            ],
            WalletOperation::Withdrawal => vec![
                GlAccount::MEMBER_WALLETS.debit(transaction.amount, description.clone()),
                GlAccount::CASH.credit(transaction.net_amount, description),
            ],
            WalletOperation::ToSavings => vec![
                GlAccount::MEMBER_WALLETS.debit(transaction.amount, description.clone()),
                GlAccount::MEMBER_SAVINGS.credit(transaction.net_amount, description),
            ],
            WalletOperation::ToLoan => {
                let mut legs =
                    vec![GlAccount::MEMBER_WALLETS.debit(transaction.amount, description.clone())];
                legs.extend(allocation_legs(&stored_allocation(transaction)?, &description));
                legs
            }
        };
        legs.push(fee_leg(transaction));
        Ok(legs)
    }
}
