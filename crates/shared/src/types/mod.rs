//! Common types used across the application.

pub mod id;
pub mod money;

pub use id::*;
pub use money::{LEDGER_TOLERANCE, MONEY_SCALE, round_money, within_tolerance};
