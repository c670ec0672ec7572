//! General ledger domain types.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sacco_shared::types::{
    BatchId, LedgerEntryId, MemberId, TransactionId, UserId, within_tolerance,
};
use serde::{Deserialize, Serialize};

/// Classification of a general ledger account.
///
/// - Asset/Expense accounts are debit-normal
/// - Liability/Equity/Revenue accounts are credit-normal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GlAccountType {
    /// Things the SACCO owns (cash, loans receivable).
    Asset,
    /// Things the SACCO owes (member savings).
    Liability,
    /// Member share capital.
    Equity,
    /// Interest, fee, and penalty income.
    Revenue,
    /// Operating expenses.
    Expense,
}

string_enum!(GlAccountType {
    Asset => "asset",
    Liability => "liability",
    Equity => "equity",
    Revenue => "revenue",
    Expense => "expense",
});

impl GlAccountType {
    /// Returns true for debit-normal account types.
    #[must_use]
    pub const fn is_debit_normal(&self) -> bool {
        matches!(self, Self::Asset | Self::Expense)
    }
}

/// One leg of a posting, as supplied by a transaction handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountingEntry {
    /// Chart of accounts code.
    pub account_code: String,
    /// Chart of accounts name.
    pub account_name: String,
    /// Account classification.
    pub account_type: GlAccountType,
    /// Debit amount (0 if credit).
    pub debit_amount: Decimal,
    /// Credit amount (0 if debit).
    pub credit_amount: Decimal,
    /// Line description.
    pub description: String,
}

/// Posting status of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    /// Posted and immutable.
    Posted,
}

string_enum!(EntryStatus {
    Posted => "posted",
});

/// A posted general ledger row. Never mutated after posting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralLedgerEntry {
    /// Unique identifier.
    pub id: LedgerEntryId,
    /// Entry tag, `GL-{transactionId}-{index}`.
    pub transaction_ref: String,
    /// Transaction that produced the entry.
    pub transaction_id: TransactionId,
    /// Accounting date.
    pub transaction_date: NaiveDate,
    /// Chart of accounts code.
    pub account_code: String,
    /// Chart of accounts name.
    pub account_name: String,
    /// Account classification.
    pub account_type: GlAccountType,
    /// Debit amount.
    pub debit_amount: Decimal,
    /// Credit amount.
    pub credit_amount: Decimal,
    /// Line description.
    pub description: String,
    /// What the entry refers to (`transaction` or `reversal`).
    pub reference_type: String,
    /// Id of the referenced record.
    pub reference_id: String,
    /// Member the movement belongs to.
    pub member_id: MemberId,
    /// Posting batch.
    pub batch_id: BatchId,
    /// Posting status.
    pub status: EntryStatus,
    /// Staff user who posted the entry.
    pub posted_by: UserId,
    /// Posting timestamp.
    pub posted_at: DateTime<Utc>,
}

/// Debit and credit sums of one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BatchTotals {
    /// Total debits.
    pub debit: Decimal,
    /// Total credits.
    pub credit: Decimal,
    /// Number of entries in the batch.
    pub entry_count: u32,
}

impl BatchTotals {
    /// Sums a slice of entries.
    #[must_use]
    pub fn of(entries: &[GeneralLedgerEntry]) -> Self {
        entries.iter().fold(Self::default(), |mut totals, entry| {
            totals.debit += entry.debit_amount;
            totals.credit += entry.credit_amount;
            totals.entry_count += 1;
            totals
        })
    }

    /// Returns true if debits equal credits within tolerance.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        within_tolerance(self.debit, self.credit)
    }
}

/// Debit and credit sums of one account code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountTotals {
    /// Chart of accounts code.
    pub account_code: String,
    /// Chart of accounts name.
    pub account_name: String,
    /// Account classification.
    pub account_type: GlAccountType,
    /// Total debits.
    pub total_debit: Decimal,
    /// Total credits.
    pub total_credit: Decimal,
}
