//! Account balance updates under row locks.
//!
//! - `ledger` - Applies and reverses transaction deltas, computes available balance
//! - `interest` - Daily savings interest accrual

mod interest;
mod ledger;

pub use interest::daily_interest;
pub use ledger::BalanceLedger;
