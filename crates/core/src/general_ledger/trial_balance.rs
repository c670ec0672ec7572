//! Trial balance over posted ledger entries.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sacco_shared::types::within_tolerance;
use serde::Serialize;

use super::types::{AccountTotals, GlAccountType};
use crate::error::CoreResult;
use crate::store::UnitOfWork;

/// One account's line in a trial balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrialBalanceLine {
    /// Chart of accounts code.
    pub account_code: String,
    /// Chart of accounts name.
    pub account_name: String,
    /// Account classification.
    pub account_type: GlAccountType,
    /// Net debit balance (0 if the account nets to a credit).
    pub debit_balance: Decimal,
    /// Net credit balance (0 if the account nets to a debit).
    pub credit_balance: Decimal,
}

/// Debit and credit balances of every account as of a date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrialBalance {
    /// Last accounting date included.
    pub as_of: NaiveDate,
    /// Lines ordered by account code.
    pub lines: Vec<TrialBalanceLine>,
    /// Sum of debit balances.
    pub total_debit: Decimal,
    /// Sum of credit balances.
    pub total_credit: Decimal,
}

impl TrialBalance {
    /// Builds a trial balance from per-account totals.
    #[must_use]
    pub fn from_totals(as_of: NaiveDate, mut totals: Vec<AccountTotals>) -> Self {
        totals.sort_by(|a, b| a.account_code.cmp(&b.account_code));

        let lines: Vec<TrialBalanceLine> = totals
            .into_iter()
            .map(|account| {
                let net = account.total_debit - account.total_credit;
                let (debit_balance, credit_balance) = if net >= Decimal::ZERO {
                    (net, Decimal::ZERO)
                } else {
                    (Decimal::ZERO, -net)
                };
                TrialBalanceLine {
                    account_code: account.account_code,
                    account_name: account.account_name,
                    account_type: account.account_type,
                    debit_balance,
                    credit_balance,
                }
            })
            .collect();

        let total_debit = lines.iter().map(|line| line.debit_balance).sum();
        let total_credit = lines.iter().map(|line| line.credit_balance).sum();

        Self {
            as_of,
            lines,
            total_debit,
            total_credit,
        }
    }

    /// Reads the ledger through `uow` and builds the trial balance.
    ///
    /// # Errors
    ///
    /// Returns a store error if the totals cannot be read.
    pub async fn load(uow: &mut dyn UnitOfWork, as_of: NaiveDate) -> CoreResult<Self> {
        let totals = uow.account_totals_until(as_of).await?;
        Ok(Self::from_totals(as_of, totals))
    }

    /// Returns true if total debits equal total credits within tolerance.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        within_tolerance(self.total_debit, self.total_credit)
    }

    /// Finds the line for an account code.
    #[must_use]
    pub fn line(&self, account_code: &str) -> Option<&TrialBalanceLine> {
        self.lines
            .iter()
            .find(|line| line.account_code == account_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn totals(
        code: &str,
        account_type: GlAccountType,
        debit: Decimal,
        credit: Decimal,
    ) -> AccountTotals {
        AccountTotals {
            account_code: code.to_string(),
            account_name: format!("Account {code}"),
            account_type,
            total_debit: debit,
            total_credit: credit,
        }
    }

    #[test]
    fn test_nets_each_account_to_one_side() {
        let as_of = NaiveDate::from_ymd_opt(2026, 3, 31).unwrap();
        let trial = TrialBalance::from_totals(
            as_of,
            vec![
                totals("2001", GlAccountType::Liability, dec!(200), dec!(1000)),
                totals("1001", GlAccountType::Asset, dec!(1000), dec!(200)),
            ],
        );

        assert_eq!(trial.lines[0].account_code, "1001");
        assert_eq!(trial.line("1001").unwrap().debit_balance, dec!(800));
        assert_eq!(trial.line("2001").unwrap().credit_balance, dec!(800));
        assert!(trial.is_balanced());
    }

    #[test]
    fn test_detects_imbalance() {
        let as_of = NaiveDate::from_ymd_opt(2026, 3, 31).unwrap();
        let trial = TrialBalance::from_totals(
            as_of,
            vec![
                totals("1001", GlAccountType::Asset, dec!(100), Decimal::ZERO),
                totals("2001", GlAccountType::Liability, Decimal::ZERO, dec!(99.98)),
            ],
        );
        assert!(!trial.is_balanced());
    }

    #[test]
    fn test_empty_ledger_is_balanced() {
        let as_of = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let trial = TrialBalance::from_totals(as_of, Vec::new());
        assert!(trial.lines.is_empty());
        assert!(trial.is_balanced());
    }
}
