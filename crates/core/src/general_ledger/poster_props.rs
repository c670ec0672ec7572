//! Property-based tests for GeneralLedgerPoster.
//!
//! - Balanced legs always produce a balanced batch
//! - Mirroring a batch swaps every side and keeps the batch balanced
//! - Posting a batch and its mirror nets every account to zero

use std::collections::HashMap;

use chrono::Utc;
use proptest::prelude::*;
use rust_decimal::Decimal;
use sacco_shared::types::BatchId;

use super::chart::GlAccount;
use super::poster::GeneralLedgerPoster;
use super::types::{AccountingEntry, BatchTotals};
use crate::fixtures;

/// Strategy to generate positive amounts (0.01 to 10,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to pick a credit-side account.
fn credit_account() -> impl Strategy<Value = GlAccount> {
    prop_oneof![
        Just(GlAccount::MEMBER_SAVINGS),
        Just(GlAccount::MEMBER_WALLETS),
        Just(GlAccount::SHARE_CAPITAL),
        Just(GlAccount::FEE_INCOME),
        Just(GlAccount::LOAN_INTEREST_INCOME),
        Just(GlAccount::PENALTY_INCOME),
    ]
}

/// One cash debit balanced by several credits.
fn balanced_legs() -> impl Strategy<Value = Vec<AccountingEntry>> {
    prop::collection::vec((credit_account(), positive_amount()), 1..6).prop_map(|credits| {
        let total: Decimal = credits.iter().map(|(_, amount)| *amount).sum();
        let mut legs = vec![GlAccount::CASH.debit(total, "Receipt")];
        legs.extend(
            credits
                .into_iter()
                .map(|(account, amount)| account.credit(amount, "Receipt")),
        );
        legs
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_balanced_legs_build_balanced_batch(legs in balanced_legs()) {
        let transaction = fixtures::transaction(Decimal::from(1));
        let leg_count = legs.len();
        let rows =
            GeneralLedgerPoster::build_entries(&transaction, legs, BatchId::new(), Utc::now())
                .unwrap();

        let totals = BatchTotals::of(&rows);
        prop_assert!(totals.is_balanced());
        prop_assert_eq!(rows.len(), leg_count);
        for (index, row) in rows.iter().enumerate() {
            prop_assert_eq!(&row.transaction_ref, &format!("GL-{}-{}", transaction.id, index + 1));
        }
    }

    #[test]
    fn prop_mirror_swaps_every_side(legs in balanced_legs()) {
        let transaction = fixtures::transaction(Decimal::from(1));
        let reversal = fixtures::transaction(Decimal::from(-1));
        let rows =
            GeneralLedgerPoster::build_entries(&transaction, legs, BatchId::new(), Utc::now())
                .unwrap();
        let mirrored = GeneralLedgerPoster::mirror_entries(
            &rows,
            &reversal,
            reversal.processed_by,
            BatchId::new(),
            Utc::now(),
        );

        prop_assert_eq!(mirrored.len(), rows.len());
        for (original, mirror) in rows.iter().zip(&mirrored) {
            prop_assert_eq!(original.debit_amount, mirror.credit_amount);
            prop_assert_eq!(original.credit_amount, mirror.debit_amount);
            prop_assert_eq!(&original.account_code, &mirror.account_code);
        }
        prop_assert!(BatchTotals::of(&mirrored).is_balanced());
    }

    #[test]
    fn prop_batch_and_mirror_net_to_zero(legs in balanced_legs()) {
        let transaction = fixtures::transaction(Decimal::from(1));
        let reversal = fixtures::transaction(Decimal::from(-1));
        let rows =
            GeneralLedgerPoster::build_entries(&transaction, legs, BatchId::new(), Utc::now())
                .unwrap();
        let mirrored = GeneralLedgerPoster::mirror_entries(
            &rows,
            &reversal,
            reversal.processed_by,
            BatchId::new(),
            Utc::now(),
        );

        let mut net: HashMap<String, Decimal> = HashMap::new();
        for row in rows.iter().chain(&mirrored) {
            let change = row.debit_amount - row.credit_amount;
            *net.entry(row.account_code.clone()).or_default() += change;
        }
        prop_assert!(net.values().all(Decimal::is_zero));
    }
}
