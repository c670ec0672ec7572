//! SACCO chart of accounts used by the transaction handlers.

use rust_decimal::Decimal;

use super::types::{AccountingEntry, GlAccountType};

/// A general ledger account the core posts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlAccount {
    /// Account code.
    pub code: &'static str,
    /// Account name.
    pub name: &'static str,
    /// Account classification.
    pub account_type: GlAccountType,
}

impl GlAccount {
    /// Cash held at the branch.
    pub const CASH: Self = Self::new("1001", "Cash on Hand", GlAccountType::Asset);
    /// Principal owed by members.
    pub const LOANS_RECEIVABLE: Self =
        Self::new("1201", "Loans to Members", GlAccountType::Asset);
    /// Member savings deposits.
    pub const MEMBER_SAVINGS: Self =
        Self::new("2001", "Member Savings Deposits", GlAccountType::Liability);
    /// Member wallet balances.
    pub const MEMBER_WALLETS: Self =
        Self::new("2002", "Member Wallet Balances", GlAccountType::Liability);
    /// Dividends declared and not yet paid.
    pub const DIVIDENDS_PAYABLE: Self =
        Self::new("2101", "Dividends Payable", GlAccountType::Liability);
    /// Member share capital.
    pub const SHARE_CAPITAL: Self =
        Self::new("3001", "Member Share Capital", GlAccountType::Equity);
    /// Interest earned on loans.
    pub const LOAN_INTEREST_INCOME: Self =
        Self::new("4001", "Loan Interest Income", GlAccountType::Revenue);
    /// Transaction fees.
    pub const FEE_INCOME: Self = Self::new("4002", "Fee Income", GlAccountType::Revenue);
    /// Loan penalties.
    pub const PENALTY_INCOME: Self =
        Self::new("4003", "Penalty Income", GlAccountType::Revenue);

    const fn new(code: &'static str, name: &'static str, account_type: GlAccountType) -> Self {
        Self {
            code,
            name,
            account_type,
        }
    }

    /// Builds a debit leg against this account.
    #[must_use]
    pub fn debit(&self, amount: Decimal, description: impl Into<String>) -> AccountingEntry {
        self.entry(amount, Decimal::ZERO, description.into())
    }

    /// Builds a credit leg against this account.
    #[must_use]
    pub fn credit(&self, amount: Decimal, description: impl Into<String>) -> AccountingEntry {
        self.entry(Decimal::ZERO, amount, description.into())
    }

    fn entry(&self, debit: Decimal, credit: Decimal, description: String) -> AccountingEntry {
        AccountingEntry {
            account_code: self.code.to_string(),
            account_name: self.name.to_string(),
            account_type: self.account_type,
            debit_amount: debit,
            credit_amount: credit,
            description,
        }
    }
}
