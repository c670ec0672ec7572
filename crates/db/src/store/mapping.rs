//! Conversions between `SeaORM` models and core domain types.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use sacco_core::domain::{
    Account, Accountable, AccountableRef, LoanAccount, Loan, LoanRepayment, Member,
    SavingsAccount, ShareAccount, ShareCertificate, Transaction,
};
use sacco_core::general_ledger::GeneralLedgerEntry;
use sacco_core::store::{StoreError, StoreResult};
use sacco_shared::types::{
    AccountId, BatchId, LedgerEntryId, LoanAccountId, LoanId, MemberId, SavingsAccountId,
    ShareAccountId, TransactionId, UserId,
};
use sea_orm::ActiveValue::Set;
use sea_orm::prelude::DateTimeWithTimeZone;

use crate::entities::{
    accounts, general_ledger_entries, loan_accounts, loan_repayments, loans, members,
    savings_accounts, share_accounts, share_certificates, transactions,
};

fn parse<T>(entity: &'static str, value: &str) -> StoreResult<T>
where
    T: FromStr<Err = String>,
{
    value
        .parse()
        .map_err(|reason| StoreError::Corrupt { entity, reason })
}

fn utc(value: DateTimeWithTimeZone) -> DateTime<Utc> {
    value.with_timezone(&Utc)
}

fn months(entity: &'static str, value: i32) -> StoreResult<u32> {
    u32::try_from(value).map_err(|_| StoreError::Corrupt {
        entity,
        reason: format!("negative repayment period {value}"),
    })
}

pub(super) fn member(model: members::Model) -> StoreResult<Member> {
    Ok(Member {
        id: MemberId::from_uuid(model.id),
        member_number: model.member_number,
        full_name: model.full_name,
        status: parse("member", &model.status)?,
        membership_status: parse("member", &model.membership_status)?,
    })
}

pub(super) fn account(model: accounts::Model) -> StoreResult<Account> {
    let kind = parse("account", &model.accountable_type)?;
    Ok(Account {
        id: AccountId::from_uuid(model.id),
        member_id: MemberId::from_uuid(model.member_id),
        account_number: model.account_number,
        accountable: AccountableRef::from_parts(kind, model.accountable_id),
        status: parse("account", &model.status)?,
        minimum_balance: model.minimum_balance,
        balance: model.balance,
        last_transaction_date: model.last_transaction_date.map(utc),
    })
}

pub(super) fn account_model(account: &Account) -> accounts::ActiveModel {
    accounts::ActiveModel {
        id: Set(account.id.into_inner()),
        member_id: Set(account.member_id.into_inner()),
        account_number: Set(account.account_number.clone()),
        accountable_type: Set(account.accountable.kind().to_string()),
        accountable_id: Set(account.accountable.id()),
        status: Set(account.status.to_string()),
        minimum_balance: Set(account.minimum_balance),
        balance: Set(account.balance),
        last_transaction_date: Set(account.last_transaction_date.map(Into::into)),
    }
}

pub(super) fn savings(model: savings_accounts::Model) -> StoreResult<Accountable> {
    Ok(Accountable::Savings(SavingsAccount {
        id: SavingsAccountId::from_uuid(model.id),
        product: parse("savings_account", &model.product)?,
        balance: model.balance,
        interest_rate: model.interest_rate,
        interest_method: parse("savings_account", &model.interest_method)?,
        interest_earned: model.interest_earned,
    }))
}

pub(super) fn savings_model(savings: &SavingsAccount) -> savings_accounts::ActiveModel {
    savings_accounts::ActiveModel {
        id: Set(savings.id.into_inner()),
        product: Set(savings.product.to_string()),
        balance: Set(savings.balance),
        interest_rate: Set(savings.interest_rate),
        interest_method: Set(savings.interest_method.to_string()),
        interest_earned: Set(savings.interest_earned),
    }
}

pub(super) fn loan_account(model: loan_accounts::Model) -> Accountable {
    Accountable::Loan(LoanAccount {
        id: LoanAccountId::from_uuid(model.id),
        total_disbursed_amount: model.total_disbursed_amount,
        total_repaid_amount: model.total_repaid_amount,
        outstanding_balance: model.outstanding_balance,
    })
}

pub(super) fn loan_account_model(loan: &LoanAccount) -> loan_accounts::ActiveModel {
    loan_accounts::ActiveModel {
        id: Set(loan.id.into_inner()),
        total_disbursed_amount: Set(loan.total_disbursed_amount),
        total_repaid_amount: Set(loan.total_repaid_amount),
        outstanding_balance: Set(loan.outstanding_balance),
    }
}

pub(super) fn share_account(model: share_accounts::Model) -> Accountable {
    Accountable::Share(ShareAccount {
        id: ShareAccountId::from_uuid(model.id),
        share_units: model.share_units,
        total_value: model.total_value,
    })
}

pub(super) fn share_account_model(share: &ShareAccount) -> share_accounts::ActiveModel {
    share_accounts::ActiveModel {
        id: Set(share.id.into_inner()),
        share_units: Set(share.share_units),
        total_value: Set(share.total_value),
    }
}

pub(super) fn certificate_model(
    certificate: &ShareCertificate,
) -> share_certificates::ActiveModel {
    share_certificates::ActiveModel {
        id: Set(certificate.id.into_inner()),
        share_account_id: Set(certificate.share_account_id.into_inner()),
        member_id: Set(certificate.member_id.into_inner()),
        certificate_number: Set(certificate.certificate_number.clone()),
        units: Set(certificate.units),
        amount: Set(certificate.amount),
        transaction_id: Set(certificate.transaction_id.into_inner()),
        issued_at: Set(certificate.issued_at.into()),
    }
}

pub(super) fn transaction(model: transactions::Model) -> StoreResult<Transaction> {
    Ok(Transaction {
        id: TransactionId::from_uuid(model.id),
        transaction_number: model.transaction_number,
        member_id: MemberId::from_uuid(model.member_id),
        account_id: model.account_id.map(AccountId::from_uuid),
        transaction_type: parse("transaction", &model.transaction_type)?,
        wallet_operation: model
            .wallet_operation
            .as_deref()
            .map(|operation| parse("transaction", operation))
            .transpose()?,
        category: parse("transaction", &model.category)?,
        amount: model.amount,
        fee_amount: model.fee_amount,
        net_amount: model.net_amount,
        balance_before: model.balance_before,
        balance_after: model.balance_after,
        status: parse("transaction", &model.status)?,
        transaction_date: utc(model.transaction_date),
        related_loan_id: model.related_loan_id.map(LoanId::from_uuid),
        related_account_id: model.related_account_id.map(AccountId::from_uuid),
        description: model.description,
        processed_by: UserId::from_uuid(model.processed_by),
        reversal_reason: model.reversal_reason,
        reversed_by: model.reversed_by.map(UserId::from_uuid),
        reversed_at: model.reversed_at.map(utc),
        metadata: model.metadata,
    })
}

pub(super) fn transaction_model(transaction: &Transaction) -> transactions::ActiveModel {
    transactions::ActiveModel {
        id: Set(transaction.id.into_inner()),
        transaction_number: Set(transaction.transaction_number.clone()),
        member_id: Set(transaction.member_id.into_inner()),
        account_id: Set(transaction.account_id.map(AccountId::into_inner)),
        transaction_type: Set(transaction.transaction_type.to_string()),
        wallet_operation: Set(transaction.wallet_operation.map(|op| op.to_string())),
        category: Set(transaction.category.to_string()),
        amount: Set(transaction.amount),
        fee_amount: Set(transaction.fee_amount),
        net_amount: Set(transaction.net_amount),
        balance_before: Set(transaction.balance_before),
        balance_after: Set(transaction.balance_after),
        status: Set(transaction.status.to_string()),
        transaction_date: Set(transaction.transaction_date.into()),
        related_loan_id: Set(transaction.related_loan_id.map(LoanId::into_inner)),
        related_account_id: Set(transaction.related_account_id.map(AccountId::into_inner)),
        description: Set(transaction.description.clone()),
        processed_by: Set(transaction.processed_by.into_inner()),
        reversal_reason: Set(transaction.reversal_reason.clone()),
        reversed_by: Set(transaction.reversed_by.map(UserId::into_inner)),
        reversed_at: Set(transaction.reversed_at.map(Into::into)),
        metadata: Set(transaction.metadata.clone()),
    }
}

pub(super) fn ledger_entry(
    model: general_ledger_entries::Model,
) -> StoreResult<GeneralLedgerEntry> {
    Ok(GeneralLedgerEntry {
        id: LedgerEntryId::from_uuid(model.id),
        transaction_ref: model.transaction_ref,
        transaction_id: TransactionId::from_uuid(model.transaction_id),
        transaction_date: model.transaction_date,
        account_code: model.account_code,
        account_name: model.account_name,
        account_type: parse("general_ledger_entry", &model.account_type)?,
        debit_amount: model.debit_amount,
        credit_amount: model.credit_amount,
        description: model.description,
        reference_type: model.reference_type,
        reference_id: model.reference_id,
        member_id: MemberId::from_uuid(model.member_id),
        batch_id: BatchId::from_uuid(model.batch_id),
        status: parse("general_ledger_entry", &model.status)?,
        posted_by: UserId::from_uuid(model.posted_by),
        posted_at: utc(model.posted_at),
    })
}

pub(super) fn ledger_entry_model(
    entry: &GeneralLedgerEntry,
    entry_order: i32,
) -> general_ledger_entries::ActiveModel {
    general_ledger_entries::ActiveModel {
        id: Set(entry.id.into_inner()),
        transaction_ref: Set(entry.transaction_ref.clone()),
        transaction_id: Set(entry.transaction_id.into_inner()),
        transaction_date: Set(entry.transaction_date),
        account_code: Set(entry.account_code.clone()),
        account_name: Set(entry.account_name.clone()),
        account_type: Set(entry.account_type.to_string()),
        debit_amount: Set(entry.debit_amount),
        credit_amount: Set(entry.credit_amount),
        description: Set(entry.description.clone()),
        reference_type: Set(entry.reference_type.clone()),
        reference_id: Set(entry.reference_id.clone()),
        member_id: Set(entry.member_id.into_inner()),
        batch_id: Set(entry.batch_id.into_inner()),
        status: Set(entry.status.to_string()),
        posted_by: Set(entry.posted_by.into_inner()),
        posted_at: Set(entry.posted_at.into()),
        entry_order: Set(entry_order),
    }
}

pub(super) fn loan(model: loans::Model) -> StoreResult<Loan> {
    Ok(Loan {
        id: LoanId::from_uuid(model.id),
        member_id: MemberId::from_uuid(model.member_id),
        loan_account_id: LoanAccountId::from_uuid(model.loan_account_id),
        loan_product_id: model.loan_product_id,
        principal_amount: model.principal_amount,
        interest_rate: model.interest_rate,
        total_amount: model.total_amount,
        repayment_period_months: months("loan", model.repayment_period_months)?,
        monthly_payment: model.monthly_payment,
        status: parse("loan", &model.status)?,
        outstanding_balance: model.outstanding_balance,
        principal_balance: model.principal_balance,
        interest_balance: model.interest_balance,
        penalty_balance: model.penalty_balance,
        total_paid: model.total_paid,
        disbursement_date: model.disbursement_date,
    })
}

pub(super) fn loan_model(loan: &Loan) -> StoreResult<loans::ActiveModel> {
    let period = i32::try_from(loan.repayment_period_months).map_err(|_| StoreError::Corrupt {
        entity: "loan",
        reason: format!("repayment period {} out of range", loan.repayment_period_months),
    })?;
    Ok(loans::ActiveModel {
        id: Set(loan.id.into_inner()),
        member_id: Set(loan.member_id.into_inner()),
        loan_account_id: Set(loan.loan_account_id.into_inner()),
        loan_product_id: Set(loan.loan_product_id),
        principal_amount: Set(loan.principal_amount),
        interest_rate: Set(loan.interest_rate),
        total_amount: Set(loan.total_amount),
        repayment_period_months: Set(period),
        monthly_payment: Set(loan.monthly_payment),
        status: Set(loan.status.to_string()),
        outstanding_balance: Set(loan.outstanding_balance),
        principal_balance: Set(loan.principal_balance),
        interest_balance: Set(loan.interest_balance),
        penalty_balance: Set(loan.penalty_balance),
        total_paid: Set(loan.total_paid),
        disbursement_date: Set(loan.disbursement_date),
    })
}

pub(super) fn repayment_model(repayment: &LoanRepayment) -> loan_repayments::ActiveModel {
    loan_repayments::ActiveModel {
        id: Set(repayment.id.into_inner()),
        loan_id: Set(repayment.loan_id.into_inner()),
        transaction_id: Set(repayment.transaction_id.into_inner()),
        amount: Set(repayment.amount),
        principal_amount: Set(repayment.principal_amount),
        interest_amount: Set(repayment.interest_amount),
        penalty_amount: Set(repayment.penalty_amount),
        balance_after: Set(repayment.balance_after),
        payment_date: Set(repayment.payment_date),
    }
}
