use async_trait::async_trait;

use super::{
    HandlerContext, TransactionHandler, describe, fee_leg, intent_savings_account,
    savings_gl_account,
};
use crate::domain::{BalanceDirection, Transaction, TransactionIntent, TransactionType};
use crate::error::CoreResult;
use crate::general_ledger::{AccountingEntry, GlAccount};

/// Cash deposit into a savings account.
///
/// Dr Cash (amount) / Cr Member Savings (net) / Cr Fee Income (fee).
#[derive(Debug, Clone, Copy, Default)]
pub struct DepositHandler;

#[async_trait]
impl TransactionHandler for DepositHandler {
    fn transaction_type(&self) -> TransactionType {
        TransactionType::Deposit
    }

    fn direction(&self, _intent: &TransactionIntent) -> CoreResult<BalanceDirection> {
        Ok(BalanceDirection::Credit)
    }

    async fn validate(
        &self,
        ctx: &mut HandlerContext<'_>,
        intent: &TransactionIntent,
    ) -> CoreResult<()> {
        intent_savings_account(ctx, intent).await?;
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
        let description = describe(transaction, "Deposit");

        Ok(vec![
            GlAccount::CASH.debit(transaction.amount, description.clone()),
            savings_gl_account(&accountable).credit(transaction.net_amount, description),
            fee_leg(transaction),
        ])
    }
}
