//! Domain model for member accounts, transactions, and loans.
//!
//! - `member` - SACCO members and their membership state
//! - `account` - Account wrappers and their product-specific accountables
//! - `transaction` - Transaction records, intents, and type classification
//! - `loan` - Loans and repayment records

pub mod account;
pub mod loan;
pub mod member;
pub mod transaction;

pub use account::{
    Account, AccountStatus, Accountable, AccountableRef, AccountableType, InterestMethod,
    LoanAccount, SavingsAccount, SavingsProduct, ShareAccount, ShareCertificate,
};
pub use loan::{Loan, LoanRepayment, LoanStatus};
pub use member::{Member, MemberStatus, MembershipStatus};
pub use transaction::{
    BalanceDirection, Transaction, TransactionCategory, TransactionIntent, TransactionStatus,
    TransactionType, WalletOperation,
};
