//! Transaction processing and ledger posting core for the SACCO backend.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Persistence is reached through the repository ports in [`store`].
//!
//! # Modules
//!
//! - `domain` - Members, accounts, transactions, and loans
//! - `numbering` - Human-readable transaction and certificate numbers
//! - `validation` - Amount bounds, member/account status, and daily limits
//! - `balance` - Account balance updates under row locks
//! - `general_ledger` - Double-entry batch posting, reversal, and trial balance
//! - `loan` - Amortization, payment allocation, and repayment schedules
//! - `handlers` - Per-transaction-type validation, side effects, and entries
//! - `processing` - The orchestrator tying the pipeline together
//! - `store` - Persistence ports and the in-memory adapter

/// Generates `as_str`, `Display`, and `FromStr` for a fieldless enum
/// stored as a lowercase string.
macro_rules! string_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// Returns the stored string form.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(format!("Unknown {}: {s}", stringify!($name))),
                }
            }
        }
    };
}

pub mod balance;
pub mod domain;
pub mod error;
pub mod general_ledger;
pub mod handlers;
pub mod loan;
pub mod numbering;
pub mod processing;
pub mod store;
pub mod validation;

#[cfg(test)]
mod fixtures;

pub use error::{CoreError, CoreResult};
