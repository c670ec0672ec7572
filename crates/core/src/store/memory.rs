//! In-memory store adapter.
//!
//! Committed rows live in `dashmap` tables shared by every unit of work. A
//! unit of work buffers its writes locally and reads its own writes first, so
//! other units of work never see uncommitted state. Row locks are
//! `tokio::sync::Mutex` owned guards kept by the unit of work until it is
//! committed or rolled back. Sequences are shared counters that advance
//! immediately and are not rolled back.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;
use rust_decimal::Decimal;
use sacco_shared::types::{
    AccountId, BatchId, LoanId, LoanRepaymentId, MemberId, ShareCertificateId, TransactionId,
};
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{
    AccountRepository, LedgerRepository, LoanRepository, MemberRepository, SequenceRepository,
    Store, StoreError, StoreResult, TransactionRepository,
};
use crate::domain::{
    Account, Accountable, AccountableRef, Loan, LoanRepayment, Member, ShareCertificate,
    Transaction, TransactionStatus, TransactionType,
};
use crate::general_ledger::{AccountTotals, BatchTotals, GeneralLedgerEntry};

/// Default time a unit of work waits for a row lock.
const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Rows that can be locked for update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum LockKey {
    Accountable(AccountableRef),
    Loan(LoanId),
    Transaction(TransactionId),
}

impl fmt::Display for LockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accountable(reference) => {
                write!(f, "{} account {}", reference.kind(), reference.id())
            }
            Self::Loan(id) => write!(f, "loan {id}"),
            Self::Transaction(id) => write!(f, "transaction {id}"),
        }
    }
}

#[derive(Default)]
struct Tables {
    members: DashMap<MemberId, Member>,
    accounts: DashMap<AccountId, Account>,
    accountables: DashMap<AccountableRef, Accountable>,
    certificates: DashMap<ShareCertificateId, ShareCertificate>,
    transactions: DashMap<TransactionId, Transaction>,
    ledger: DashMap<TransactionId, Vec<GeneralLedgerEntry>>,
    loans: DashMap<LoanId, Loan>,
    repayments: DashMap<LoanRepaymentId, LoanRepayment>,
    sequences: DashMap<String, u64>,
    locks: DashMap<LockKey, Arc<Mutex<()>>>,
    // Readers share it; commits take it exclusively so a commit is seen whole.
    gate: RwLock<()>,
}

/// `dashmap`-backed [`Store`].
#[derive(Clone)]
pub struct InMemoryStore {
    tables: Arc<Tables>,
    lock_timeout: Duration,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::with_lock_timeout(DEFAULT_LOCK_TIMEOUT)
    }

    /// Creates an empty store whose row locks give up after `lock_timeout`.
    #[must_use]
    pub fn with_lock_timeout(lock_timeout: Duration) -> Self {
        Self {
            tables: Arc::new(Tables::default()),
            lock_timeout,
        }
    }

    /// Adds or replaces a member.
    pub fn insert_member(&self, member: Member) {
        self.tables.members.insert(member.id, member);
    }

    /// Adds or replaces an account together with its accountable.
    pub fn insert_account(&self, account: Account, accountable: Accountable) {
        self.tables
            .accountables
            .insert(accountable.reference(), accountable);
        self.tables.accounts.insert(account.id, account);
    }

    /// Adds or replaces a loan.
    pub fn insert_loan(&self, loan: Loan) {
        self.tables.loans.insert(loan.id, loan);
    }

    /// Returns the committed account.
    #[must_use]
    pub fn account(&self, id: AccountId) -> Option<Account> {
        self.tables.accounts.get(&id).map(|row| row.clone())
    }

    /// Returns the committed accountable.
    #[must_use]
    pub fn accountable(&self, reference: AccountableRef) -> Option<Accountable> {
        self.tables
            .accountables
            .get(&reference)
            .map(|row| row.clone())
    }

    /// Returns the committed transaction.
    #[must_use]
    pub fn transaction(&self, id: TransactionId) -> Option<Transaction> {
        self.tables.transactions.get(&id).map(|row| row.clone())
    }

    /// Returns every committed transaction.
    #[must_use]
    pub fn transactions(&self) -> Vec<Transaction> {
        self.tables
            .transactions
            .iter()
            .map(|row| row.clone())
            .collect()
    }

    /// Returns the committed loan.
    #[must_use]
    pub fn loan(&self, id: LoanId) -> Option<Loan> {
        self.tables.loans.get(&id).map(|row| row.clone())
    }

    /// Returns the committed repayments of a loan.
    #[must_use]
    pub fn repayments(&self, loan_id: LoanId) -> Vec<LoanRepayment> {
        self.tables
            .repayments
            .iter()
            .filter(|row| row.loan_id == loan_id)
            .map(|row| row.clone())
            .collect()
    }

    /// Returns the committed share certificates of a member.
    #[must_use]
    pub fn certificates(&self, member_id: MemberId) -> Vec<ShareCertificate> {
        self.tables
            .certificates
            .iter()
            .filter(|row| row.member_id == member_id)
            .map(|row| row.clone())
            .collect()
    }

    /// Returns every committed ledger entry.
    #[must_use]
    pub fn ledger_entries(&self) -> Vec<GeneralLedgerEntry> {
        self.tables
            .ledger
            .iter()
            .flat_map(|row| row.value().clone())
            .collect()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    type Work = InMemoryWork;

    async fn begin(&self) -> StoreResult<Self::Work> {
        Ok(InMemoryWork {
            tables: Arc::clone(&self.tables),
            lock_timeout: self.lock_timeout,
            held: HashMap::new(),
            writes: Writes::default(),
        })
    }

    async fn commit(&self, work: Self::Work) -> StoreResult<()> {
        let InMemoryWork { tables, held, writes, .. } = work;
        {
            let _gate = tables.gate.write().unwrap_or_else(PoisonError::into_inner);
            writes.apply(&tables);
        }
        drop(held);
        Ok(())
    }

    async fn rollback(&self, work: Self::Work) -> StoreResult<()> {
        drop(work);
        Ok(())
    }
}

#[derive(Default)]
struct Writes {
    accounts: HashMap<AccountId, Account>,
    accountables: HashMap<AccountableRef, Accountable>,
    certificates: Vec<ShareCertificate>,
    transactions: HashMap<TransactionId, Transaction>,
    ledger: Vec<GeneralLedgerEntry>,
    loans: HashMap<LoanId, Loan>,
    repayments: Vec<LoanRepayment>,
}

impl Writes {
    fn apply(self, tables: &Tables) {
        for (id, account) in self.accounts {
            tables.accounts.insert(id, account);
        }
        for (reference, accountable) in self.accountables {
            tables.accountables.insert(reference, accountable);
        }
        for certificate in self.certificates {
            tables.certificates.insert(certificate.id, certificate);
        }
        for (id, transaction) in self.transactions {
            tables.transactions.insert(id, transaction);
        }
        for entry in self.ledger {
            tables
                .ledger
                .entry(entry.transaction_id)
                .or_default()
                .push(entry);
        }
        for (id, loan) in self.loans {
            tables.loans.insert(id, loan);
        }
        for repayment in self.repayments {
            tables.repayments.insert(repayment.id, repayment);
        }
    }
}

/// Unit of work over an [`InMemoryStore`].
pub struct InMemoryWork {
    tables: Arc<Tables>,
    lock_timeout: Duration,
    held: HashMap<LockKey, OwnedMutexGuard<()>>,
    writes: Writes,
}

impl InMemoryWork {
    async fn acquire(&mut self, key: LockKey) -> StoreResult<()> {
        if self.held.contains_key(&key) {
            return Ok(());
        }

        let mutex = Arc::clone(
            self.tables
                .locks
                .entry(key)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .value(),
        );
        let guard = tokio::time::timeout(self.lock_timeout, mutex.lock_owned())
            .await
            .map_err(|_| StoreError::LockTimeout(key.to_string()))?;

        self.held.insert(key, guard);
        Ok(())
    }

    fn committed<T>(&self, read: impl FnOnce(&Tables) -> T) -> T {
        let _gate = self
            .tables
            .gate
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        read(&self.tables)
    }

    fn read_account(&self, id: AccountId) -> Option<Account> {
        self.writes.accounts.get(&id).cloned().or_else(|| {
            self.committed(|tables| tables.accounts.get(&id).map(|row| row.clone()))
        })
    }

    fn read_accountable(&self, reference: AccountableRef) -> Option<Accountable> {
        self.writes
            .accountables
            .get(&reference)
            .cloned()
            .or_else(|| {
                self.committed(|tables| {
                    tables.accountables.get(&reference).map(|row| row.clone())
                })
            })
    }

    fn read_transaction(&self, id: TransactionId) -> Option<Transaction> {
        self.writes.transactions.get(&id).cloned().or_else(|| {
            self.committed(|tables| tables.transactions.get(&id).map(|row| row.clone()))
        })
    }

    fn read_loan(&self, id: LoanId) -> Option<Loan> {
        self.writes.loans.get(&id).cloned().or_else(|| {
            self.committed(|tables| tables.loans.get(&id).map(|row| row.clone()))
        })
    }

    /// Committed transactions overlaid with this unit of work's writes.
    fn visible_transactions(&self) -> Vec<Transaction> {
        let mut visible: Vec<Transaction> = self.committed(|tables| {
            tables
                .transactions
                .iter()
                .filter(|row| !self.writes.transactions.contains_key(row.key()))
                .map(|row| row.clone())
                .collect()
        });
        visible.extend(self.writes.transactions.values().cloned());
        visible
    }

    fn visible_ledger(&self) -> Vec<GeneralLedgerEntry> {
        let mut visible: Vec<GeneralLedgerEntry> = self.committed(|tables| {
            tables
                .ledger
                .iter()
                .flat_map(|row| row.value().clone())
                .collect()
        });
        visible.extend(self.writes.ledger.iter().cloned());
        visible
    }
}

#[async_trait]
impl MemberRepository for InMemoryWork {
    async fn find_member(&mut self, id: MemberId) -> StoreResult<Option<Member>> {
        Ok(self.committed(|tables| tables.members.get(&id).map(|row| row.clone())))
    }
}

#[async_trait]
impl AccountRepository for InMemoryWork {
    async fn find_account(&mut self, id: AccountId) -> StoreResult<Option<Account>> {
        Ok(self.read_account(id))
    }

    async fn lock_account_for_update(&mut self, id: AccountId) -> StoreResult<Option<Account>> {
        let Some(account) = self.read_account(id) else {
            return Ok(None);
        };
        self.acquire(LockKey::Accountable(account.accountable)).await?;
        Ok(self.read_account(id))
    }

    async fn find_accountable(
        &mut self,
        reference: AccountableRef,
    ) -> StoreResult<Option<Accountable>> {
        Ok(self.read_accountable(reference))
    }

    async fn lock_accountable_for_update(
        &mut self,
        reference: AccountableRef,
    ) -> StoreResult<Option<Accountable>> {
        self.acquire(LockKey::Accountable(reference)).await?;
        Ok(self.read_accountable(reference))
    }

    async fn save_account(&mut self, account: &Account) -> StoreResult<()> {
        if self.read_account(account.id).is_none() {
            return Err(StoreError::missing("account", account.id));
        }
        self.writes.accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn save_accountable(&mut self, accountable: &Accountable) -> StoreResult<()> {
        let reference = accountable.reference();
        if self.read_accountable(reference).is_none() {
            return Err(StoreError::missing("accountable", reference.id()));
        }
        self.writes
            .accountables
            .insert(reference, accountable.clone());
        Ok(())
    }

    async fn create_share_certificate(
        &mut self,
        certificate: &ShareCertificate,
    ) -> StoreResult<()> {
        let number_taken = self.committed(|tables| {
            tables
                .certificates
                .iter()
                .any(|row| row.certificate_number == certificate.certificate_number)
        }) || self
            .writes
            .certificates
            .iter()
            .any(|row| row.certificate_number == certificate.certificate_number);
        if number_taken {
            return Err(StoreError::Duplicate {
                entity: "share_certificate",
                key: certificate.certificate_number.clone(),
            });
        }
        self.writes.certificates.push(certificate.clone());
        Ok(())
    }
}

#[async_trait]
impl TransactionRepository for InMemoryWork {
    async fn insert_transaction(&mut self, transaction: &Transaction) -> StoreResult<()> {
        let number_taken = self
            .visible_transactions()
            .iter()
            .any(|row| {
                row.id == transaction.id
                    || row.transaction_number == transaction.transaction_number
            });
        if number_taken {
            return Err(StoreError::Duplicate {
                entity: "transaction",
                key: transaction.transaction_number.clone(),
            });
        }
        self.writes
            .transactions
            .insert(transaction.id, transaction.clone());
        Ok(())
    }

    async fn update_transaction(&mut self, transaction: &Transaction) -> StoreResult<()> {
        if self.read_transaction(transaction.id).is_none() {
            return Err(StoreError::missing("transaction", transaction.id));
        }
        self.writes
            .transactions
            .insert(transaction.id, transaction.clone());
        Ok(())
    }

    async fn find_transaction(&mut self, id: TransactionId) -> StoreResult<Option<Transaction>> {
        Ok(self.read_transaction(id))
    }

    async fn find_transaction_by_number(
        &mut self,
        number: &str,
    ) -> StoreResult<Option<Transaction>> {
        Ok(self
            .visible_transactions()
            .into_iter()
            .find(|row| row.transaction_number == number))
    }

    async fn lock_transaction_for_update(
        &mut self,
        id: TransactionId,
    ) -> StoreResult<Option<Transaction>> {
        self.acquire(LockKey::Transaction(id)).await?;
        Ok(self.read_transaction(id))
    }

    async fn count_completed_on(
        &mut self,
        member_id: MemberId,
        date: NaiveDate,
    ) -> StoreResult<u32> {
        let count = self
            .visible_transactions()
            .iter()
            .filter(|row| {
                row.member_id == member_id
                    && row.status == TransactionStatus::Completed
                    && row.transaction_date.date_naive() == date
            })
            .count();
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
        Ok(self
            .visible_transactions()
            .iter()
            .filter(|row| {
                row.member_id == member_id
                    && row.transaction_type == transaction_type
                    && row.status == TransactionStatus::Completed
                    && row.transaction_date.date_naive() == date
            })
            .map(|row| row.amount)
            .sum())
    }

    async fn pending_withdrawals_sum(
        &mut self,
        account_id: AccountId,
        exclude: Option<TransactionId>,
    ) -> StoreResult<Decimal> {
        Ok(self
            .visible_transactions()
            .iter()
            .filter(|row| {
                row.account_id == Some(account_id)
                    && row.transaction_type == TransactionType::Withdrawal
                    && row.status == TransactionStatus::Pending
                    && Some(row.id) != exclude
            })
            .map(|row| row.amount)
            .sum())
    }
}

#[async_trait]
impl LedgerRepository for InMemoryWork {
    async fn insert_ledger_entries(&mut self, entries: &[GeneralLedgerEntry]) -> StoreResult<()> {
        let mut refs: HashSet<&str> = HashSet::new();
        for entry in entries {
            if !refs.insert(entry.transaction_ref.as_str()) {
                return Err(StoreError::Duplicate {
                    entity: "general_ledger_entry",
                    key: entry.transaction_ref.clone(),
                });
            }
        }
        self.writes.ledger.extend(entries.iter().cloned());
        Ok(())
    }

    async fn ledger_entries_for_transaction(
        &mut self,
        transaction_id: TransactionId,
    ) -> StoreResult<Vec<GeneralLedgerEntry>> {
        let mut entries: Vec<GeneralLedgerEntry> = self.committed(|tables| {
            tables
                .ledger
                .get(&transaction_id)
                .map(|row| row.value().clone())
                .unwrap_or_default()
        });
        entries.extend(
            self.writes
                .ledger
                .iter()
                .filter(|entry| entry.transaction_id == transaction_id)
                .cloned(),
        );
        Ok(entries)
    }

    async fn batch_totals(&mut self, batch_id: BatchId) -> StoreResult<BatchTotals> {
        let batch: Vec<GeneralLedgerEntry> = self
            .visible_ledger()
            .into_iter()
            .filter(|entry| entry.batch_id == batch_id)
            .collect();
        Ok(BatchTotals::of(&batch))
    }

    async fn account_totals_until(&mut self, as_of: NaiveDate) -> StoreResult<Vec<AccountTotals>> {
        let mut totals: HashMap<String, AccountTotals> = HashMap::new();
        for entry in self.visible_ledger() {
            if entry.transaction_date > as_of {
                continue;
            }
            let account = totals
                .entry(entry.account_code.clone())
                .or_insert_with(|| AccountTotals {
                    account_code: entry.account_code.clone(),
                    account_name: entry.account_name.clone(),
                    account_type: entry.account_type,
                    total_debit: Decimal::ZERO,
                    total_credit: Decimal::ZERO,
                });
            account.total_debit += entry.debit_amount;
            account.total_credit += entry.credit_amount;
        }
        Ok(totals.into_values().collect())
    }
}

#[async_trait]
impl LoanRepository for InMemoryWork {
    async fn find_loan(&mut self, id: LoanId) -> StoreResult<Option<Loan>> {
        Ok(self.read_loan(id))
    }

    async fn lock_loan_for_update(&mut self, id: LoanId) -> StoreResult<Option<Loan>> {
        self.acquire(LockKey::Loan(id)).await?;
        Ok(self.read_loan(id))
    }

    async fn save_loan(&mut self, loan: &Loan) -> StoreResult<()> {
        if self.read_loan(loan.id).is_none() {
            return Err(StoreError::missing("loan", loan.id));
        }
        self.writes.loans.insert(loan.id, loan.clone());
        Ok(())
    }

    async fn insert_repayment(&mut self, repayment: &LoanRepayment) -> StoreResult<()> {
        self.writes.repayments.push(repayment.clone());
        Ok(())
    }
}

#[async_trait]
impl SequenceRepository for InMemoryWork {
    async fn next_sequence(&mut self, scope: &str) -> StoreResult<u64> {
        let mut counter = self.tables.sequences.entry(scope.to_string()).or_insert(0);
        *counter += 1;
        Ok(*counter)
    }
}
