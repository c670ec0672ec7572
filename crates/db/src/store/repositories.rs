//! Repository port implementations for [`SeaOrmWork`].

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use sacco_core::domain::{
    Account, Accountable, AccountableRef, Loan, LoanRepayment, Member, ShareCertificate,
    Transaction, TransactionStatus, TransactionType,
};
use sacco_core::general_ledger::{AccountTotals, BatchTotals, GeneralLedgerEntry};
use sacco_core::store::{
    AccountRepository, LedgerRepository, LoanRepository, MemberRepository, SequenceRepository,
    StoreError, StoreResult, TransactionRepository,
};
use sacco_shared::types::{AccountId, BatchId, LoanId, MemberId, TransactionId};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Statement,
};

use super::{SeaOrmWork, classify, mapping};
use crate::entities::{
    accounts, general_ledger_entries, loan_accounts, loan_repayments, loans, members,
    savings_accounts, share_accounts, share_certificates, transactions,
};

const NEXT_SEQUENCE_SQL: &str = r"
INSERT INTO sequences (scope, value) VALUES ($1, 1)
ON CONFLICT (scope) DO UPDATE SET value = sequences.value + 1
RETURNING value
";

/// Maps the outcome of an update by primary key.
fn updated<T>(
    entity: &'static str,
    id: impl ToString,
    result: Result<T, DbErr>,
) -> StoreResult<()> {
    match result {
        Ok(_) => Ok(()),
        Err(DbErr::RecordNotUpdated) => Err(StoreError::missing(entity, id)),
        Err(err) => Err(classify(entity, err)),
    }
}

/// `[start, end)` of a UTC calendar day.
fn day_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = date.and_time(NaiveTime::MIN).and_utc();
    (start, start + Duration::days(1))
}

impl SeaOrmWork {
    async fn load_accountable(
        &mut self,
        reference: AccountableRef,
        lock: bool,
    ) -> StoreResult<Option<Accountable>> {
        match reference {
            AccountableRef::Savings(id) => {
                let mut query = savings_accounts::Entity::find_by_id(id.into_inner());
                if lock {
                    query = query.lock_exclusive();
                }
                query
                    .one(&self.txn)
                    .await
                    .map_err(|err| classify("savings_account", err))?
                    .map(mapping::savings)
                    .transpose()
            }
            AccountableRef::Loan(id) => {
                let mut query = loan_accounts::Entity::find_by_id(id.into_inner());
                if lock {
                    query = query.lock_exclusive();
                }
                Ok(query
                    .one(&self.txn)
                    .await
                    .map_err(|err| classify("loan_account", err))?
                    .map(mapping::loan_account))
            }
            AccountableRef::Share(id) => {
                let mut query = share_accounts::Entity::find_by_id(id.into_inner());
                if lock {
                    query = query.lock_exclusive();
                }
                Ok(query
                    .one(&self.txn)
                    .await
                    .map_err(|err| classify("share_account", err))?
                    .map(mapping::share_account))
            }
        }
    }

    async fn load_account(&mut self, id: AccountId, lock: bool) -> StoreResult<Option<Account>> {
        let mut query = accounts::Entity::find_by_id(id.into_inner());
        if lock {
            query = query.lock_exclusive();
        }
        query
            .one(&self.txn)
            .await
            .map_err(|err| classify("account", err))?
            .map(mapping::account)
            .transpose()
    }

    async fn sum_amounts(
        &mut self,
        query: sea_orm::Select<transactions::Entity>,
    ) -> StoreResult<Decimal> {
        let total: Option<Option<Decimal>> = query
            .select_only()
            .column_as(transactions::Column::Amount.sum(), "total")
            .into_tuple()
            .one(&self.txn)
            .await
            .map_err(|err| classify("transaction", err))?;
        Ok(total.flatten().unwrap_or_default())
    }
}

#[async_trait]
impl MemberRepository for SeaOrmWork {
    async fn find_member(&mut self, id: MemberId) -> StoreResult<Option<Member>> {
        members::Entity::find_by_id(id.into_inner())
            .one(&self.txn)
            .await
            .map_err(|err| classify("member", err))?
            .map(mapping::member)
            .transpose()
    }
}

#[async_trait]
impl AccountRepository for SeaOrmWork {
    async fn find_account(&mut self, id: AccountId) -> StoreResult<Option<Account>> {
        self.load_account(id, false).await
    }

    async fn lock_account_for_update(&mut self, id: AccountId) -> StoreResult<Option<Account>> {
        let Some(account) = self.load_account(id, true).await? else {
            return Ok(None);
        };
        self.load_accountable(account.accountable, true).await?;
        Ok(Some(account))
    }

    async fn find_accountable(
        &mut self,
        reference: AccountableRef,
    ) -> StoreResult<Option<Accountable>> {
        self.load_accountable(reference, false).await
    }

    async fn lock_accountable_for_update(
        &mut self,
        reference: AccountableRef,
    ) -> StoreResult<Option<Accountable>> {
        self.load_accountable(reference, true).await
    }

    async fn save_account(&mut self, account: &Account) -> StoreResult<()> {
        let result = mapping::account_model(account).update(&self.txn).await;
        updated("account", account.id, result)
    }

    async fn save_accountable(&mut self, accountable: &Accountable) -> StoreResult<()> {
        let id = accountable.reference().id();
        match accountable {
            Accountable::Savings(savings) => {
                let result = mapping::savings_model(savings).update(&self.txn).await;
                updated("savings_account", id, result)
            }
            Accountable::Loan(loan) => {
                let result = mapping::loan_account_model(loan).update(&self.txn).await;
                updated("loan_account", id, result)
            }
            Accountable::Share(share) => {
                let result = mapping::share_account_model(share).update(&self.txn).await;
                updated("share_account", id, result)
            }
        }
    }

    async fn create_share_certificate(
        &mut self,
        certificate: &ShareCertificate,
    ) -> StoreResult<()> {
        share_certificates::Entity::insert(mapping::certificate_model(certificate))
            .exec(&self.txn)
            .await
            .map_err(|err| classify("share_certificate", err))?;
        Ok(())
    }
}

#[async_trait]
impl TransactionRepository for SeaOrmWork {
    async fn insert_transaction(&mut self, transaction: &Transaction) -> StoreResult<()> {
        transactions::Entity::insert(mapping::transaction_model(transaction))
            .exec(&self.txn)
            .await
            .map_err(|err| classify("transaction", err))?;
        Ok(())
    }

    async fn update_transaction(&mut self, transaction: &Transaction) -> StoreResult<()> {
        let result = mapping::transaction_model(transaction)
            .update(&self.txn)
            .await;
        updated("transaction", transaction.id, result)
    }

    async fn find_transaction(&mut self, id: TransactionId) -> StoreResult<Option<Transaction>> {
        transactions::Entity::find_by_id(id.into_inner())
            .one(&self.txn)
            .await
            .map_err(|err| classify("transaction", err))?
            .map(mapping::transaction)
            .transpose()
    }

    async fn find_transaction_by_number(
        &mut self,
        number: &str,
    ) -> StoreResult<Option<Transaction>> {
        transactions::Entity::find()
            .filter(transactions::Column::TransactionNumber.eq(number))
            .one(&self.txn)
            .await
            .map_err(|err| classify("transaction", err))?
            .map(mapping::transaction)
            .transpose()
    }

    async fn lock_transaction_for_update(
        &mut self,
        id: TransactionId,
    ) -> StoreResult<Option<Transaction>> {
        transactions::Entity::find_by_id(id.into_inner())
            .lock_exclusive()
            .one(&self.txn)
            .await
            .map_err(|err| classify("transaction", err))?
            .map(mapping::transaction)
            .transpose()
    }

    async fn count_completed_on(
        &mut self,
        member_id: MemberId,
        date: NaiveDate,
    ) -> StoreResult<u32> {
        let (start, end) = day_bounds(date);
        let count = transactions::Entity::find()
            .filter(transactions::Column::MemberId.eq(member_id.into_inner()))
            .filter(transactions::Column::Status.eq(TransactionStatus::Completed.as_str()))
            .filter(transactions::Column::TransactionDate.gte(start))
            .filter(transactions::Column::TransactionDate.lt(end))
            .count(&self.txn)
            .await
            .map_err(|err| classify("transaction", err))?;
        u32::try_from(count).map_err(|_| StoreError::Corrupt {
            entity: "transaction",
            reason: format!("{count} completed transactions on {date}"),
        })
    }

    async fn sum_completed_on(
        &mut self,
        member_id: MemberId,
        date: NaiveDate,
        transaction_type: TransactionType,
    ) -> StoreResult<Decimal> {
        let (start, end) = day_bounds(date);
        let query = transactions::Entity::find()
            .filter(transactions::Column::MemberId.eq(member_id.into_inner()))
            .filter(transactions::Column::TransactionType.eq(transaction_type.as_str()))
            .filter(transactions::Column::Status.eq(TransactionStatus::Completed.as_str()))
            .filter(transactions::Column::TransactionDate.gte(start))
            .filter(transactions::Column::TransactionDate.lt(end));
        self.sum_amounts(query).await
    }

    async fn pending_withdrawals_sum(
        &mut self,
        account_id: AccountId,
        exclude: Option<TransactionId>,
    ) -> StoreResult<Decimal> {
        let mut query = transactions::Entity::find()
            .filter(transactions::Column::AccountId.eq(account_id.into_inner()))
            .filter(
                transactions::Column::TransactionType.eq(TransactionType::Withdrawal.as_str()),
            )
            .filter(transactions::Column::Status.eq(TransactionStatus::Pending.as_str()));
        if let Some(exclude) = exclude {
            query = query.filter(transactions::Column::Id.ne(exclude.into_inner()));
        }
        self.sum_amounts(query).await
    }
}

#[async_trait]
impl LedgerRepository for SeaOrmWork {
    async fn insert_ledger_entries(&mut self, entries: &[GeneralLedgerEntry]) -> StoreResult<()> {
        if entries.is_empty() {
            return Ok(());
        }
        let models = entries
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                let order = i32::try_from(index).map_err(|_| StoreError::Corrupt {
                    entity: "general_ledger_entry",
                    reason: format!("batch of {} entries", entries.len()),
                })?;
                Ok(mapping::ledger_entry_model(entry, order))
            })
            .collect::<StoreResult<Vec<_>>>()?;

        general_ledger_entries::Entity::insert_many(models)
            .exec(&self.txn)
            .await
            .map_err(|err| classify("general_ledger_entry", err))?;
        Ok(())
    }

    async fn ledger_entries_for_transaction(
        &mut self,
        transaction_id: TransactionId,
    ) -> StoreResult<Vec<GeneralLedgerEntry>> {
        general_ledger_entries::Entity::find()
            .filter(general_ledger_entries::Column::TransactionId.eq(transaction_id.into_inner()))
            .order_by_asc(general_ledger_entries::Column::EntryOrder)
            .all(&self.txn)
            .await
            .map_err(|err| classify("general_ledger_entry", err))?
            .into_iter()
            .map(mapping::ledger_entry)
            .collect()
    }

    async fn batch_totals(&mut self, batch_id: BatchId) -> StoreResult<BatchTotals> {
        let row: Option<(Option<Decimal>, Option<Decimal>, i64)> =
            general_ledger_entries::Entity::find()
                .select_only()
                .column_as(general_ledger_entries::Column::DebitAmount.sum(), "debit")
                .column_as(general_ledger_entries::Column::CreditAmount.sum(), "credit")
                .column_as(general_ledger_entries::Column::Id.count(), "entry_count")
                .filter(general_ledger_entries::Column::BatchId.eq(batch_id.into_inner()))
                .into_tuple()
                .one(&self.txn)
                .await
                .map_err(|err| classify("general_ledger_entry", err))?;

        let Some((debit, credit, count)) = row else {
            return Ok(BatchTotals::default());
        };
        let entry_count = u32::try_from(count).map_err(|_| StoreError::Corrupt {
            entity: "general_ledger_entry",
            reason: format!("batch {batch_id} has {count} entries"),
        })?;
        Ok(BatchTotals {
            debit: debit.unwrap_or_default(),
            credit: credit.unwrap_or_default(),
            entry_count,
        })
    }

    async fn account_totals_until(&mut self, as_of: NaiveDate) -> StoreResult<Vec<AccountTotals>> {
        let rows: Vec<(String, String, String, Option<Decimal>, Option<Decimal>)> =
            general_ledger_entries::Entity::find()
                .select_only()
                .column(general_ledger_entries::Column::AccountCode)
                .column(general_ledger_entries::Column::AccountName)
                .column(general_ledger_entries::Column::AccountType)
                .column_as(general_ledger_entries::Column::DebitAmount.sum(), "total_debit")
                .column_as(general_ledger_entries::Column::CreditAmount.sum(), "total_credit")
                .filter(general_ledger_entries::Column::TransactionDate.lte(as_of))
                .group_by(general_ledger_entries::Column::AccountCode)
                .group_by(general_ledger_entries::Column::AccountName)
                .group_by(general_ledger_entries::Column::AccountType)
                .order_by_asc(general_ledger_entries::Column::AccountCode)
                .into_tuple()
                .all(&self.txn)
                .await
                .map_err(|err| classify("general_ledger_entry", err))?;

        rows.into_iter()
            .map(|(account_code, account_name, account_type, debit, credit)| {
                Ok(AccountTotals {
                    account_code,
                    account_name,
                    account_type: account_type.parse().map_err(|reason| StoreError::Corrupt {
                        entity: "general_ledger_entry",
                        reason,
                    })?,
                    total_debit: debit.unwrap_or_default(),
                    total_credit: credit.unwrap_or_default(),
                })
            })
            .collect()
    }
}

#[async_trait]
impl LoanRepository for SeaOrmWork {
    async fn find_loan(&mut self, id: LoanId) -> StoreResult<Option<Loan>> {
        loans::Entity::find_by_id(id.into_inner())
            .one(&self.txn)
            .await
            .map_err(|err| classify("loan", err))?
            .map(mapping::loan)
            .transpose()
    }

    async fn lock_loan_for_update(&mut self, id: LoanId) -> StoreResult<Option<Loan>> {
        loans::Entity::find_by_id(id.into_inner())
            .lock_exclusive()
            .one(&self.txn)
            .await
            .map_err(|err| classify("loan", err))?
            .map(mapping::loan)
            .transpose()
    }

    async fn save_loan(&mut self, loan: &Loan) -> StoreResult<()> {
        let result = mapping::loan_model(loan)?.update(&self.txn).await;
        updated("loan", loan.id, result)
    }

    async fn insert_repayment(&mut self, repayment: &LoanRepayment) -> StoreResult<()> {
        loan_repayments::Entity::insert(mapping::repayment_model(repayment))
            .exec(&self.txn)
            .await
            .map_err(|err| classify("loan_repayment", err))?;
        Ok(())
    }
}

#[async_trait]
impl SequenceRepository for SeaOrmWork {
    async fn next_sequence(&mut self, scope: &str) -> StoreResult<u64> {
        let statement = Statement::from_sql_and_values(
            self.txn.get_database_backend(),
            NEXT_SEQUENCE_SQL,
            [sea_orm::Value::from(scope)],
        );
        let row = self
            .txn
            .query_one(statement)
            .await
            .map_err(|err| classify("sequence", err))?
            .ok_or_else(|| StoreError::Backend(format!("sequence {scope} returned no row")))?;
        let value: i64 = row
            .try_get("", "value")
            .map_err(|err| classify("sequence", err))?;

        tracing::debug!(scope, value, "Sequence advanced");
        u64::try_from(value).map_err(|_| StoreError::Corrupt {
            entity: "sequence",
            reason: format!("{scope} is at {value}"),
        })
    }
}
