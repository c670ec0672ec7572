//! Persistence ports for the processing core.
//!
//! The core never talks to a database directly. Every read and write goes
//! through a [`UnitOfWork`]: all writes made through one unit of work become
//! visible together on [`Store::commit`] or not at all on
//! [`Store::rollback`]. Row locks taken with the `lock_*_for_update` methods
//! are held until the unit of work ends.
//!
//! - `memory` - `dashmap`-backed adapter used by tests and embedded setups
//! - `error` - Port error type

pub mod error;
pub mod memory;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sacco_shared::types::{AccountId, BatchId, LoanId, MemberId, TransactionId};

use crate::domain::{
    Account, Accountable, AccountableRef, Loan, LoanRepayment, Member, ShareCertificate,
    Transaction, TransactionType,
};
use crate::general_ledger::{AccountTotals, BatchTotals, GeneralLedgerEntry};

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryStore;

/// Member lookups.
#[async_trait]
pub trait MemberRepository: Send {
    /// Finds a member by id.
    async fn find_member(&mut self, id: MemberId) -> StoreResult<Option<Member>>;
}

/// Account wrappers and their accountables.
#[async_trait]
pub trait AccountRepository: Send {
    /// Finds an account without locking it.
    async fn find_account(&mut self, id: AccountId) -> StoreResult<Option<Account>>;

    /// Locks the account and its accountable exclusively, then reads the account.
    async fn lock_account_for_update(&mut self, id: AccountId) -> StoreResult<Option<Account>>;

    /// Finds an accountable without locking it.
    async fn find_accountable(
        &mut self,
        reference: AccountableRef,
    ) -> StoreResult<Option<Accountable>>;

    /// Locks an accountable exclusively, then reads it.
    async fn lock_accountable_for_update(
        &mut self,
        reference: AccountableRef,
    ) -> StoreResult<Option<Accountable>>;

    /// Persists an account wrapper.
    async fn save_account(&mut self, account: &Account) -> StoreResult<()>;

    /// Persists an accountable.
    async fn save_accountable(&mut self, accountable: &Accountable) -> StoreResult<()>;

    /// Records an issued share certificate.
    async fn create_share_certificate(&mut self, certificate: &ShareCertificate)
    -> StoreResult<()>;
}

/// Transaction records and their aggregates.
#[async_trait]
pub trait TransactionRepository: Send {
    /// Inserts a new transaction record.
    async fn insert_transaction(&mut self, transaction: &Transaction) -> StoreResult<()>;

    /// Overwrites an existing transaction record.
    async fn update_transaction(&mut self, transaction: &Transaction) -> StoreResult<()>;

    /// Finds a transaction by id.
    async fn find_transaction(&mut self, id: TransactionId) -> StoreResult<Option<Transaction>>;

    /// Finds a transaction by its human-readable number.
    async fn find_transaction_by_number(
        &mut self,
        number: &str,
    ) -> StoreResult<Option<Transaction>>;

    /// Locks a transaction exclusively, then reads it.
    async fn lock_transaction_for_update(
        &mut self,
        id: TransactionId,
    ) -> StoreResult<Option<Transaction>>;

    /// Counts the member's completed transactions dated `date` (UTC).
    async fn count_completed_on(&mut self, member_id: MemberId, date: NaiveDate)
    -> StoreResult<u32>;

    /// Sums the member's completed amounts of one type dated `date` (UTC).
    async fn sum_completed_on(
        &mut self,
        member_id: MemberId,
        date: NaiveDate,
        transaction_type: TransactionType,
    ) -> StoreResult<Decimal>;

    /// Sums the account's pending withdrawals, ignoring `exclude`.
    async fn pending_withdrawals_sum(
        &mut self,
        account_id: AccountId,
        exclude: Option<TransactionId>,
    ) -> StoreResult<Decimal>;
}

/// General ledger entries.
#[async_trait]
pub trait LedgerRepository: Send {
    /// Inserts a batch of entries.
    async fn insert_ledger_entries(&mut self, entries: &[GeneralLedgerEntry]) -> StoreResult<()>;

    /// Lists a transaction's entries in posting order.
    async fn ledger_entries_for_transaction(
        &mut self,
        transaction_id: TransactionId,
    ) -> StoreResult<Vec<GeneralLedgerEntry>>;

    /// Sums one batch's debits and credits.
    async fn batch_totals(&mut self, batch_id: BatchId) -> StoreResult<BatchTotals>;

    /// Sums posted entries dated on or before `as_of`, per account code.
    async fn account_totals_until(&mut self, as_of: NaiveDate) -> StoreResult<Vec<AccountTotals>>;
}

/// Loans and repayment records.
#[async_trait]
pub trait LoanRepository: Send {
    /// Finds a loan without locking it.
    async fn find_loan(&mut self, id: LoanId) -> StoreResult<Option<Loan>>;

    /// Locks a loan exclusively, then reads it.
    async fn lock_loan_for_update(&mut self, id: LoanId) -> StoreResult<Option<Loan>>;

    /// Persists a loan.
    async fn save_loan(&mut self, loan: &Loan) -> StoreResult<()>;

    /// Records a repayment.
    async fn insert_repayment(&mut self, repayment: &LoanRepayment) -> StoreResult<()>;
}

/// Atomic counters backing human-readable numbers.
#[async_trait]
pub trait SequenceRepository: Send {
    /// Returns the next value (starting at 1) of the named sequence.
    ///
    /// No two committed units of work receive the same value. Adapters may
    /// leave gaps where a unit of work was rolled back.
    async fn next_sequence(&mut self, scope: &str) -> StoreResult<u64>;
}

/// Every repository, sharing one atomic scope.
pub trait UnitOfWork:
    MemberRepository
    + AccountRepository
    + TransactionRepository
    + LedgerRepository
    + LoanRepository
    + SequenceRepository
    + Send
{
}

impl<T> UnitOfWork for T where
    T: MemberRepository
        + AccountRepository
        + TransactionRepository
        + LedgerRepository
        + LoanRepository
        + SequenceRepository
        + Send
{
}

/// Opens and finishes units of work.
#[async_trait]
pub trait Store: Send + Sync {
    /// The unit of work type.
    type Work: UnitOfWork + 'static;

    /// Begins a unit of work.
    async fn begin(&self) -> StoreResult<Self::Work>;

    /// Applies every write of the unit of work and releases its locks.
    async fn commit(&self, work: Self::Work) -> StoreResult<()>;

    /// Discards every write of the unit of work and releases its locks.
    async fn rollback(&self, work: Self::Work) -> StoreResult<()>;
}
