//! `SeaORM` entity definitions for the SACCO ledger schema.
//!
//! Enum-like columns are stored as lowercase text and parsed through the
//! core domain's `FromStr` impls.

pub mod accounts;
pub mod general_ledger_entries;
pub mod loan_accounts;
pub mod loan_repayments;
pub mod loans;
pub mod members;
pub mod savings_accounts;
pub mod sequences;
pub mod share_accounts;
pub mod share_certificates;
pub mod transactions;
