use async_trait::async_trait;
use rust_decimal::Decimal;
use sacco_shared::types::LoanId;
use serde_json::json;

use super::{
    HandlerContext, TransactionHandler, describe, fee_leg, intent_savings_account, merge_metadata,
    savings_gl_account,
};
use crate::domain::{
    Accountable, AccountableRef, BalanceDirection, Loan, LoanStatus, Transaction,
    TransactionIntent, TransactionType,
};
use crate::error::{CoreError, CoreResult};
use crate::general_ledger::{AccountingEntry, GlAccount};
use crate::store::StoreError;

/// Payout of an approved loan into savings or in cash.
///
/// Dr Loans to Members (amount) / Cr Member Savings or Cash (net) /
/// Cr Fee Income (fee).
#[derive(Debug, Clone, Copy, Default)]
pub struct LoanDisbursementHandler;

#[async_trait]
impl TransactionHandler for LoanDisbursementHandler {
    fn transaction_type(&self) -> TransactionType {
        TransactionType::LoanDisbursement
    }

    fn direction(&self, _intent: &TransactionIntent) -> CoreResult<BalanceDirection> {
        Ok(BalanceDirection::Credit)
    }

    async fn validate(
        &self,
        ctx: &mut HandlerContext<'_>,
        intent: &TransactionIntent,
    ) -> CoreResult<()> {
        let loan_id = required_loan(intent)?;
        let loan = ctx
            .uow
            .find_loan(loan_id)
            .await?
            .ok_or_else(|| CoreError::invalid(format!("Loan {loan_id} not found")))?;
        check_disbursable(&loan, intent)?;

        if intent.account_id.is_some() {
            intent_savings_account(ctx, intent).await?;
        }
        Ok(())
    }

    async fn execute(
        &self,
        ctx: &mut HandlerContext<'_>,
        transaction: &mut Transaction,
        intent: &TransactionIntent,
    ) -> CoreResult<()> {
        let loan_id = required_loan(intent)?;
        let mut loan = ctx
            .uow
            .lock_loan_for_update(loan_id)
            .await?
            .ok_or_else(|| CoreError::invalid(format!("Loan {loan_id} not found")))?;
        check_disbursable(&loan, intent)?;

        if loan.monthly_payment <= Decimal::ZERO {
            loan.monthly_payment = ctx.loans.calculate_monthly_payment(&loan)?;
        }
        if loan.total_amount < loan.principal_amount {
            loan.total_amount = loan.principal_amount + ctx.loans.calculate_total_interest(&loan)?;
        }

        loan.status = LoanStatus::Active;
        loan.outstanding_balance = loan.total_amount;
        loan.principal_balance = loan.principal_amount;
        loan.interest_balance = loan.total_amount - loan.principal_amount;
        loan.penalty_balance = Decimal::ZERO;
        loan.disbursement_date = Some(ctx.now.date_naive());
        ctx.uow.save_loan(&loan).await?;

        let reference = AccountableRef::Loan(loan.loan_account_id);
        let Some(Accountable::Loan(mut loan_account)) =
            ctx.uow.lock_accountable_for_update(reference).await?
        else {
            return Err(StoreError::missing("loan_account", reference.id()).into());
        };
        loan_account.total_disbursed_amount += loan.principal_amount;
        loan_account.outstanding_balance += loan.total_amount;
        ctx.uow
            .save_accountable(&Accountable::Loan(loan_account))
            .await?;

        merge_metadata(
            transaction,
            json!({
                "loan_id": loan_id,
                "disbursed_to": if intent.account_id.is_some() { "savings" } else { "cash" },
                "total_amount": loan.total_amount,
                "monthly_payment": loan.monthly_payment,
            }),
        );

        tracing::debug!(
            loan_id = %loan_id,
            principal = %loan.principal_amount,
            total = %loan.total_amount,
            "Disbursed loan"
        );
        Ok(())
    }

    async fn accounting_entries(
        &self,
        ctx: &mut HandlerContext<'_>,
        transaction: &Transaction,
        intent: &TransactionIntent,
    ) -> CoreResult<Vec<AccountingEntry>> {
        let description = describe(transaction, "Loan disbursement");
        let target = if intent.account_id.is_some() {
            let (_, accountable) = intent_savings_account(ctx, intent).await?;
            savings_gl_account(&accountable)
        } else {
            GlAccount::CASH
        };

        Ok(vec![
            GlAccount::LOANS_RECEIVABLE.debit(transaction.amount, description.clone()),
            target.credit(transaction.net_amount, description),
            fee_leg(transaction),
        ])
    }
}

fn required_loan(intent: &TransactionIntent) -> CoreResult<LoanId> {
    intent
        .related_loan_id
        .ok_or_else(|| CoreError::invalid("A loan is required for a disbursement"))
}

fn check_disbursable(loan: &Loan, intent: &TransactionIntent) -> CoreResult<()> {
    if loan.member_id != intent.member_id {
        return Err(CoreError::invalid(format!(
            "Loan {} does not belong to member {}",
            loan.id, intent.member_id
        )));
    }
    if loan.status != LoanStatus::Approved {
        return Err(CoreError::invalid(format!(
            "Loan {} is {}; only approved loans can be disbursed",
            loan.id, loan.status
        )));
    }
    if intent.amount != loan.principal_amount {
        return Err(CoreError::invalid(format!(
            "Disbursement {} must equal the loan principal {}",
            intent.amount, loan.principal_amount
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use rust_decimal_macros::dec;
    use sacco_shared::types::UserId;

    fn intent(loan: &Loan, amount: Decimal) -> TransactionIntent {
        TransactionIntent::new(
            loan.member_id,
            TransactionType::LoanDisbursement,
            amount,
            UserId::new(),
        )
        .with_loan(loan.id)
    }

    #[test]
    fn test_check_disbursable() {
        let mut loan = fixtures::active_loan(dec!(5000), Decimal::ZERO);
        loan.status = LoanStatus::Approved;

        assert!(check_disbursable(&loan, &intent(&loan, dec!(5000))).is_ok());
        assert!(check_disbursable(&loan, &intent(&loan, dec!(4000))).is_err());

        loan.status = LoanStatus::Active;
        let err = check_disbursable(&loan, &intent(&loan, dec!(5000))).unwrap_err();
        assert!(err.to_string().contains("only approved"));
    }
}
