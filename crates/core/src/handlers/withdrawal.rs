use async_trait::async_trait;

use super::{
    HandlerContext, TransactionHandler, describe, fee_leg, intent_savings_account,
    savings_gl_account,
};
use crate::domain::{BalanceDirection, Transaction, TransactionIntent, TransactionType};
use crate::error::{CoreError, CoreResult};
use crate::general_ledger::{AccountingEntry, GlAccount};

/// Cash withdrawal from a savings account.
///
/// The available balance must cover the requested amount; the fee is charged
/// on top. Dr Member Savings (amount) / Cr Cash (net) / Cr Fee Income (fee).
#[derive(Debug, Clone, Copy, Default)]
pub struct WithdrawalHandler;

#[async_trait]
impl TransactionHandler for WithdrawalHandler {
    fn transaction_type(&self) -> TransactionType {
        TransactionType::Withdrawal
    }

    fn direction(&self, _intent: &TransactionIntent) -> CoreResult<BalanceDirection> {
        Ok(BalanceDirection::Debit)
    }

    async fn validate(
        &self,
        ctx: &mut HandlerContext<'_>,
        intent: &TransactionIntent,
    ) -> CoreResult<()> {
        let (account, accountable) = intent_savings_account(ctx, intent).await?;

        // Rechecked under the account lock when the balance moves.
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
        Ok(())
    }

    async fn execute(
        &self,
        _ctx: &mut HandlerContext<'_>,
        _transaction: &mut Transaction,
        _intent: &TransactionIntent,
    ) -> CoreResult<()> {
        Ok(())
    }

    async fn accounting_entries(
        &self,
        ctx: &mut HandlerContext<'_>,
        transaction: &Transaction,
        intent: &TransactionIntent,
    ) -> CoreResult<Vec<AccountingEntry>> {
        let (_, accountable) = intent_savings_account(ctx, intent).await?;
        let description = describe(transaction, "Withdrawal");

        Ok(vec![
            savings_gl_account(&accountable).debit(transaction.amount, description.clone()),
            GlAccount::CASH.credit(transaction.net_amount, description),
            fee_leg(transaction),
        ])
    }
}
