//! Double-entry general ledger.
//!
//! This module implements:
//! - Ledger entry types (accounting legs and posted rows)
//! - The SACCO chart of accounts
//! - Batch posting with balance verification
//! - Mirrored reversal postings
//! - Trial balance

pub mod chart;
pub mod poster;
pub mod trial_balance;
pub mod types;

#[cfg(test)]
mod poster_props;

pub use chart::GlAccount;
pub use poster::{GeneralLedgerPoster, PostedBatch};
pub use trial_balance::{TrialBalance, TrialBalanceLine};
pub use types::{
    AccountTotals, AccountingEntry, BatchTotals, EntryStatus, GeneralLedgerEntry, GlAccountType,
};
