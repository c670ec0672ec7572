use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;
use sacco_shared::config::LimitsConfig;

use crate::domain::TransactionType;

/// Limits enforced by the [`ValidationEngine`](super::ValidationEngine).
///
/// Built once at start-up from [`LimitsConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    /// Largest amount accepted for a single transaction.
    pub max_transaction_amount: Decimal,
    /// Completed transactions a member may have per day.
    pub max_daily_transactions: u32,
    allowed_types: HashSet<TransactionType>,
    daily_type_limits: HashMap<TransactionType, Decimal>,
}

impl Limits {
    /// Returns the daily amount cap for a type, if it has one.
    #[must_use]
    pub fn daily_limit_for(&self, transaction_type: TransactionType) -> Option<Decimal> {
        self.daily_type_limits.get(&transaction_type).copied()
    }

    /// Returns true if intents of this type may be processed.
    #[must_use]
    pub fn allows(&self, transaction_type: TransactionType) -> bool {
        self.allowed_types.contains(&transaction_type)
    }

    /// Overrides the daily amount cap of one type.
    #[must_use]
    pub fn with_daily_limit(mut self, transaction_type: TransactionType, limit: Decimal) -> Self {
        self.daily_type_limits.insert(transaction_type, limit);
        self
    }

    /// Overrides the daily transaction count.
    #[must_use]
    pub fn with_max_daily_transactions(mut self, max: u32) -> Self {
        self.max_daily_transactions = max;
        self
    }

    /// Removes a type from the allow-list.
    #[must_use]
    pub fn without_type(mut self, transaction_type: TransactionType) -> Self {
        self.allowed_types.remove(&transaction_type);
        self
    }
}

impl From<&LimitsConfig> for Limits {
    fn from(config: &LimitsConfig) -> Self {
        let daily_type_limits = HashMap::from([
            (TransactionType::Deposit, config.daily_deposit_limit),
            (TransactionType::Withdrawal, config.daily_withdrawal_limit),
            (
                TransactionType::SharePurchase,
                config.daily_share_purchase_limit,
            ),
            (TransactionType::Wallet, config.wallet_daily_limit),
        ]);

        Self {
            max_transaction_amount: config.max_transaction_amount,
            max_daily_transactions: config.max_daily_transactions,
            allowed_types: TransactionType::PROCESSABLE.into_iter().collect(),
            daily_type_limits,
        }
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self::from(&LimitsConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(TransactionType::Deposit, Some(dec!(1000000)))]
    #[case(TransactionType::Withdrawal, Some(dec!(500000)))]
    #[case(TransactionType::SharePurchase, Some(dec!(1000000)))]
    #[case(TransactionType::Wallet, Some(dec!(5000000)))]
    #[case(TransactionType::LoanRepayment, None)]
    fn test_default_daily_limits(
        #[case] transaction_type: TransactionType,
        #[case] expected: Option<Decimal>,
    ) {
        assert_eq!(Limits::default().daily_limit_for(transaction_type), expected);
    }

    #[test]
    fn test_reversal_is_not_processable() {
        let limits = Limits::default();
        assert!(limits.allows(TransactionType::Deposit));
        assert!(!limits.allows(TransactionType::Reversal));
        assert!(!limits.without_type(TransactionType::Deposit).allows(TransactionType::Deposit));
    }

    #[test]
    fn test_defaults() {
        let limits = Limits::default();
        assert_eq!(limits.max_transaction_amount, dec!(10000000));
        assert_eq!(limits.max_daily_transactions, 10);
    }
}
