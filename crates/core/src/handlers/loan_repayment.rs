use async_trait::async_trait;
use rust_decimal::Decimal;
use sacco_shared::types::{LoanId, LoanRepaymentId, MemberId};
use serde_json::json;

use super::{
    HandlerContext, TransactionHandler, describe, fee_leg, intent_savings_account, merge_metadata,
    savings_gl_account,
};
use crate::domain::{
    Accountable, AccountableRef, BalanceDirection, Loan, LoanRepayment, LoanStatus, Transaction,
    TransactionIntent, TransactionType,
};
use crate::error::{CoreError, CoreResult};
use crate::general_ledger::{AccountingEntry, GlAccount};
use crate::loan::PaymentAllocation;
use crate::store::StoreError;

/// Repayment of a disbursed loan, from savings or in cash.
///
/// The payment is split penalty, then interest, then principal.
/// Dr Member Savings or Cash (amount) / Cr Penalty Income / Cr Loan Interest
/// Income / Cr Loans to Members / Cr Fee Income (fee).
#[derive(Debug, Clone, Copy, Default)]
pub struct LoanRepaymentHandler;

#[async_trait]
impl TransactionHandler for LoanRepaymentHandler {
    fn transaction_type(&self) -> TransactionType {
        TransactionType::LoanRepayment
    }

    fn direction(&self, _intent: &TransactionIntent) -> CoreResult<BalanceDirection> {
        Ok(BalanceDirection::Debit)
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
        check_repayable(&loan, intent.member_id, intent.amount)?;

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
        apply_repayment(ctx, loan_id, transaction).await?;
        Ok(())
    }

    async fn accounting_entries(
        &self,
        ctx: &mut HandlerContext<'_>,
        transaction: &Transaction,
        intent: &TransactionIntent,
    ) -> CoreResult<Vec<AccountingEntry>> {
        let description = describe(transaction, "Loan repayment");
        let source = if intent.account_id.is_some() {
            let (_, accountable) = intent_savings_account(ctx, intent).await?;
            savings_gl_account(&accountable)
        } else {
            GlAccount::CASH
        };

        let mut legs = vec![source.debit(transaction.amount, description.clone())];
        legs.extend(allocation_legs(&stored_allocation(transaction)?, &description));
        legs.push(fee_leg(transaction));
        Ok(legs)
    }
}

fn required_loan(intent: &TransactionIntent) -> CoreResult<LoanId> {
    intent
        .related_loan_id
        .ok_or_else(|| CoreError::invalid("A loan is required for a repayment"))
}

/// Checks ownership, status, and that `payment` does not exceed what is owed.
pub(super) fn check_repayable(
    loan: &Loan,
    member_id: MemberId,
    payment: Decimal,
) -> CoreResult<()> {
    if loan.member_id != member_id {
        return Err(CoreError::invalid(format!(
            "Loan {} does not belong to member {member_id}",
            loan.id
        )));
    }
    if !loan.status.accepts_repayments() {
        return Err(CoreError::invalid(format!(
            "Loan {} is {} and cannot be repaid",
            loan.id, loan.status
        )));
    }
    let owed = loan.total_owed();
    if payment > owed {
        return Err(CoreError::invalid(format!(
            "Repayment {payment} exceeds the {owed} owed on loan {}",
            loan.id
        )));
    }
    Ok(())
}

/// Applies the transaction's net amount to a loan under its row lock.
///
/// Updates the loan's buckets and the member's loan account, records a
/// [`LoanRepayment`], and stores the allocation in the transaction metadata.
pub(super) async fn apply_repayment(
    ctx: &mut HandlerContext<'_>,
    loan_id: LoanId,
    transaction: &mut Transaction,
) -> CoreResult<PaymentAllocation> {
    let mut loan = ctx
        .uow
        .lock_loan_for_update(loan_id)
        .await?
        .ok_or_else(|| CoreError::invalid(format!("Loan {loan_id} not found")))?;
    let payment = transaction.net_amount;
    check_repayable(&loan, transaction.member_id, payment)?;

    let allocation = ctx.loans.calculate_payment_allocation(&loan, payment);
    let applied = allocation.total();

    loan.penalty_balance -= allocation.penalty;
    loan.interest_balance -= allocation.interest;
    loan.principal_balance -= allocation.principal;
    loan.total_paid += applied;
    loan.outstanding_balance = (loan.outstanding_balance - applied).max(Decimal::ZERO);
    loan.status = if loan.total_owed().is_zero() {
        LoanStatus::Completed
    } else {
        LoanStatus::Active
    };
    ctx.uow.save_loan(&loan).await?;

    let reference = AccountableRef::Loan(loan.loan_account_id);
    let Some(Accountable::Loan(mut loan_account)) =
        ctx.uow.lock_accountable_for_update(reference).await?
    else {
        return Err(StoreError::missing("loan_account", reference.id()).into());
    };
    loan_account.total_repaid_amount += applied;
    loan_account.outstanding_balance =
        (loan_account.outstanding_balance - applied).max(Decimal::ZERO);
    ctx.uow
        .save_accountable(&Accountable::Loan(loan_account))
        .await?;

    ctx.uow
        .insert_repayment(&LoanRepayment {
            id: LoanRepaymentId::new(),
            loan_id,
            transaction_id: transaction.id,
            amount: applied,
            principal_amount: allocation.principal,
            interest_amount: allocation.interest,
            penalty_amount: allocation.penalty,
            balance_after: loan.outstanding_balance,
            payment_date: ctx.now.date_naive(),
        })
        .await?;

    merge_metadata(
        transaction,
        json!({
            "loan_id": loan_id,
            "allocation": allocation,
            "loan_balance_after": loan.outstanding_balance,
        }),
    );

    tracing::debug!(
        loan_id = %loan_id,
        penalty = %allocation.penalty,
        interest = %allocation.interest,
        principal = %allocation.principal,
        status = %loan.status,
        "Applied loan repayment"
    );
    Ok(allocation)
}

/// Reads back the allocation [`apply_repayment`] stored on the transaction.
pub(super) fn stored_allocation(transaction: &Transaction) -> CoreResult<PaymentAllocation> {
    let value = transaction
        .metadata
        .get("allocation")
        .cloned()
        .ok_or_else(|| StoreError::Corrupt {
            entity: "transaction",
            reason: format!("{} has no repayment allocation", transaction.transaction_number),
        })?;
    serde_json::from_value(value).map_err(|err| {
        StoreError::Corrupt {
            entity: "transaction",
            reason: err.to_string(),
        }
        .into()
    })
}

/// Income and receivable legs of a repayment allocation.
pub(super) fn allocation_legs(
    allocation: &PaymentAllocation,
    description: &str,
) -> [AccountingEntry; 3] {
    [
        GlAccount::PENALTY_INCOME.credit(allocation.penalty, description),
        GlAccount::LOAN_INTEREST_INCOME.credit(allocation.interest, description),
        GlAccount::LOANS_RECEIVABLE.credit(allocation.principal, description),
    ]
}
