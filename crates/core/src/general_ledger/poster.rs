//! Batch posting of accounting legs to the general ledger.
//!
//! Every transaction posts exactly one batch. A batch is written, summed, and
//! rejected with [`CoreError::LedgerImbalance`] when debits and credits differ
//! by more than the ledger tolerance. Reversals post a mirrored batch that
//! references the original one.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sacco_shared::types::{BatchId, LedgerEntryId, UserId};

use super::types::{AccountingEntry, BatchTotals, EntryStatus, GeneralLedgerEntry};
use crate::domain::Transaction;
use crate::error::{CoreError, CoreResult};
use crate::store::UnitOfWork;

/// Reference type of entries posted for an ordinary transaction.
pub const REFERENCE_TRANSACTION: &str = "transaction";

/// Reference type of entries posted for a reversal.
pub const REFERENCE_REVERSAL: &str = "reversal";

/// Description prefix of mirrored entries.
pub const REVERSAL_PREFIX: &str = "REVERSAL: ";

/// A batch written to the ledger.
#[derive(Debug, Clone)]
pub struct PostedBatch {
    /// Batch identifier shared by every entry.
    pub batch_id: BatchId,
    /// The rows as written.
    pub entries: Vec<GeneralLedgerEntry>,
    /// Sums of the written rows.
    pub totals: BatchTotals,
}

/// Stateless poster for general ledger batches.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeneralLedgerPoster;

impl GeneralLedgerPoster {
    /// Creates a poster.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Turns handler legs into ledger rows for `transaction`.
    ///
    /// Legs with both sides zero are dropped. Each remaining row is tagged
    /// `GL-{transactionId}-{index}` with the index starting at 1.
    ///
    /// # Errors
    ///
    /// Returns `InvalidLedgerEntry` for a negative side or a leg that
    /// debits and credits at once.
    pub fn build_entries(
        transaction: &Transaction,
        legs: Vec<AccountingEntry>,
        batch_id: BatchId,
        posted_at: DateTime<Utc>,
    ) -> CoreResult<Vec<GeneralLedgerEntry>> {
        let mut rows = Vec::with_capacity(legs.len());

        for leg in legs {
            check_leg(&leg)?;
            if leg.debit_amount.is_zero() && leg.credit_amount.is_zero() {
                continue;
            }

            rows.push(GeneralLedgerEntry {
                id: LedgerEntryId::new(),
                transaction_ref: format!("GL-{}-{}", transaction.id, rows.len() + 1),
                transaction_id: transaction.id,
                transaction_date: transaction.transaction_date.date_naive(),
                account_code: leg.account_code,
                account_name: leg.account_name,
                account_type: leg.account_type,
                debit_amount: leg.debit_amount,
                credit_amount: leg.credit_amount,
                description: leg.description,
                reference_type: REFERENCE_TRANSACTION.to_string(),
                reference_id: transaction.id.to_string(),
                member_id: transaction.member_id,
                batch_id,
                status: EntryStatus::Posted,
                posted_by: transaction.processed_by,
                posted_at,
            });
        }

        Ok(rows)
    }

    /// Mirrors the original transaction's rows for its reversal.
    ///
    /// Debits and credits swap, descriptions gain the `REVERSAL: ` prefix,
    /// and each row references the original row's batch.
    #[must_use]
    pub fn mirror_entries(
        original: &[GeneralLedgerEntry],
        reversal: &Transaction,
        posted_by: UserId,
        batch_id: BatchId,
        posted_at: DateTime<Utc>,
    ) -> Vec<GeneralLedgerEntry> {
        original
            .iter()
            .enumerate()
            .map(|(index, entry)| GeneralLedgerEntry {
                id: LedgerEntryId::new(),
                transaction_ref: format!("GL-{}-{}", reversal.id, index + 1),
                transaction_id: reversal.id,
                transaction_date: reversal.transaction_date.date_naive(),
                account_code: entry.account_code.clone(),
                account_name: entry.account_name.clone(),
                account_type: entry.account_type,
                debit_amount: entry.credit_amount,
                credit_amount: entry.debit_amount,
                description: format!("{REVERSAL_PREFIX}{}", entry.description),
                reference_type: REFERENCE_REVERSAL.to_string(),
                reference_id: entry.batch_id.to_string(),
                member_id: entry.member_id,
                batch_id,
                status: EntryStatus::Posted,
                posted_by,
                posted_at,
            })
            .collect()
    }

    /// Posts the handler's legs for `transaction` as one batch.
    ///
    /// # Errors
    ///
    /// Returns `InvalidLedgerEntry` for malformed legs, `LedgerImbalance`
    /// when the written batch does not balance, or a store error.
    pub async fn post(
        &self,
        uow: &mut dyn UnitOfWork,
        transaction: &Transaction,
        legs: Vec<AccountingEntry>,
        posted_at: DateTime<Utc>,
    ) -> CoreResult<PostedBatch> {
        let batch_id = BatchId::new();
        let entries = Self::build_entries(transaction, legs, batch_id, posted_at)?;
        Self::write(uow, batch_id, entries).await
    }

    /// Posts the mirror of `original`'s batch for `reversal`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransaction` if the original has no ledger entries,
    /// `LedgerImbalance` if the mirror does not balance, or a store error.
    pub async fn post_reversal(
        &self,
        uow: &mut dyn UnitOfWork,
        original: &Transaction,
        reversal: &Transaction,
        posted_at: DateTime<Utc>,
    ) -> CoreResult<PostedBatch> {
        let original_entries = uow.ledger_entries_for_transaction(original.id).await?;
        if original_entries.is_empty() {
            return Err(CoreError::invalid(format!(
                "Transaction {} has no ledger entries to reverse",
                original.transaction_number
            )));
        }

        let batch_id = BatchId::new();
        let entries = Self::mirror_entries(
            &original_entries,
            reversal,
            reversal.processed_by,
            batch_id,
            posted_at,
        );
        Self::write(uow, batch_id, entries).await
    }

    /// Re-reads a batch from the store and checks that it balances.
    ///
    /// # Errors
    ///
    /// Returns `LedgerImbalance` if the stored batch does not balance.
    pub async fn verify_batch(
        &self,
        uow: &mut dyn UnitOfWork,
        batch_id: BatchId,
    ) -> CoreResult<BatchTotals> {
        let totals = uow.batch_totals(batch_id).await?;
        ensure_balanced(batch_id, totals)?;
        Ok(totals)
    }

    async fn write(
        uow: &mut dyn UnitOfWork,
        batch_id: BatchId,
        entries: Vec<GeneralLedgerEntry>,
    ) -> CoreResult<PostedBatch> {
        uow.insert_ledger_entries(&entries).await?;

        let totals = BatchTotals::of(&entries);
        ensure_balanced(batch_id, totals)?;

        tracing::debug!(
            batch_id = %batch_id,
            entries = totals.entry_count,
            debit = %totals.debit,
            credit = %totals.credit,
            "Posted ledger batch"
        );

        Ok(PostedBatch {
            batch_id,
            entries,
            totals,
        })
    }
}

fn check_leg(leg: &AccountingEntry) -> CoreResult<()> {
    let reason = if leg.debit_amount < Decimal::ZERO || leg.credit_amount < Decimal::ZERO {
        "amounts must not be negative"
    } else if leg.debit_amount > Decimal::ZERO && leg.credit_amount > Decimal::ZERO {
        "a leg is either a debit or a credit"
    } else {
        return Ok(());
    };

    Err(CoreError::InvalidLedgerEntry {
        account_code: leg.account_code.clone(),
        reason: reason.to_string(),
    })
}

fn ensure_balanced(batch_id: BatchId, totals: BatchTotals) -> CoreResult<()> {
    if totals.is_balanced() {
        Ok(())
    } else {
        Err(CoreError::LedgerImbalance {
            batch_id,
            debit: totals.debit,
            credit: totals.credit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::general_ledger::GlAccount;
    use rust_decimal_macros::dec;

    #[test]
    fn test_build_entries_tags_and_skips_zero_legs() {
        let transaction = fixtures::transaction(dec!(500));
        let legs = vec![
            GlAccount::CASH.debit(dec!(500), "Deposit"),
            GlAccount::MEMBER_SAVINGS.credit(dec!(500), "Deposit"),
            GlAccount::FEE_INCOME.credit(Decimal::ZERO, "Fee"),
        ];

        let rows =
            GeneralLedgerPoster::build_entries(&transaction, legs, BatchId::new(), Utc::now())
                .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].transaction_ref, format!("GL-{}-1", transaction.id));
        assert_eq!(rows[1].transaction_ref, format!("GL-{}-2", transaction.id));
        assert!(rows.iter().all(|row| row.reference_type == "transaction"));
    }

    #[test]
    fn test_build_entries_rejects_two_sided_leg() {
        let transaction = fixtures::transaction(dec!(100));
        let mut leg = GlAccount::CASH.debit(dec!(100), "Broken");
        leg.credit_amount = dec!(100);

        let err = GeneralLedgerPoster::build_entries(
            &transaction,
            vec![leg],
            BatchId::new(),
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidLedgerEntry { .. }));
    }

    #[test]
    fn test_build_entries_rejects_negative_amount() {
        let transaction = fixtures::transaction(dec!(100));
        let leg = GlAccount::CASH.debit(dec!(-100), "Broken");

        let result = GeneralLedgerPoster::build_entries(
            &transaction,
            vec![leg],
            BatchId::new(),
            Utc::now(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_mirror_swaps_sides() {
        let transaction = fixtures::transaction(dec!(500));
        let original_batch = BatchId::new();
        let rows = GeneralLedgerPoster::build_entries(
            &transaction,
            vec![
                GlAccount::CASH.debit(dec!(500), "Deposit"),
                GlAccount::MEMBER_SAVINGS.credit(dec!(500), "Deposit"),
            ],
            original_batch,
            Utc::now(),
        )
        .unwrap();

        let reversal = fixtures::transaction(dec!(-500));
        let mirrored = GeneralLedgerPoster::mirror_entries(
            &rows,
            &reversal,
            reversal.processed_by,
            BatchId::new(),
            Utc::now(),
        );

        assert_eq!(mirrored[0].credit_amount, dec!(500));
        assert_eq!(mirrored[0].debit_amount, Decimal::ZERO);
        assert_eq!(mirrored[1].debit_amount, dec!(500));
        assert_eq!(mirrored[0].description, "REVERSAL: Deposit");
        assert_eq!(mirrored[0].reference_type, "reversal");
        assert_eq!(mirrored[0].reference_id, original_batch.to_string());
        assert_eq!(mirrored[0].transaction_id, reversal.id);
    }

    #[tokio::test]
    async fn test_post_rejects_unbalanced_batch() {
        let store = crate::store::InMemoryStore::new();
        let mut uow = crate::store::Store::begin(&store).await.unwrap();
        let transaction = fixtures::transaction(dec!(100));

        let err = GeneralLedgerPoster::new()
            .post(
                &mut uow,
                &transaction,
                vec![
                    GlAccount::CASH.debit(dec!(100), "Deposit"),
                    GlAccount::MEMBER_SAVINGS.credit(dec!(90), "Deposit"),
                ],
                Utc::now(),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CoreError::LedgerImbalance { debit, credit, .. }
                if debit == dec!(100) && credit == dec!(90)
        ));
    }

    #[tokio::test]
    async fn test_post_accepts_rounding_within_tolerance() {
        let store = crate::store::InMemoryStore::new();
        let mut uow = crate::store::Store::begin(&store).await.unwrap();
        let transaction = fixtures::transaction(dec!(100));

        let batch = GeneralLedgerPoster::new()
            .post(
                &mut uow,
                &transaction,
                vec![
                    GlAccount::CASH.debit(dec!(100.00), "Deposit"),
                    GlAccount::MEMBER_SAVINGS.credit(dec!(99.99), "Deposit"),
                ],
                Utc::now(),
            )
            .await
            .unwrap();

        let verified = GeneralLedgerPoster::new()
            .verify_batch(&mut uow, batch.batch_id)
            .await
            .unwrap();
        assert_eq!(verified.entry_count, 2);
    }

    #[tokio::test]
    async fn test_post_reversal_requires_original_entries() {
        let store = crate::store::InMemoryStore::new();
        let mut uow = crate::store::Store::begin(&store).await.unwrap();
        let original = fixtures::transaction(dec!(100));
        let reversal = fixtures::transaction(dec!(-100));

        let err = GeneralLedgerPoster::new()
            .post_reversal(&mut uow, &original, &reversal, Utc::now())
            .await
            .unwrap_err();
        assert!(err.is_invalid_transaction());
    }
}
