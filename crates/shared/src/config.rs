//! Application configuration management.

use rust_decimal::Decimal;
use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Transaction limits enforced by the validation engine.
    #[serde(default)]
    pub limits: LimitsConfig,
    /// Share capital settings.
    #[serde(default)]
    pub shares: SharesConfig,
    /// Loan product settings.
    #[serde(default)]
    pub loans: LoansConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Numeric limits for transaction validation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LimitsConfig {
    /// Largest amount accepted for a single transaction.
    #[serde(default = "default_max_transaction_amount")]
    pub max_transaction_amount: Decimal,
    /// Completed transactions a member may have per day.
    #[serde(default = "default_max_daily_transactions")]
    pub max_daily_transactions: u32,
    /// Daily cap on deposits per member.
    #[serde(default = "default_daily_deposit_limit")]
    pub daily_deposit_limit: Decimal,
    /// Daily cap on withdrawals per member.
    #[serde(default = "default_daily_withdrawal_limit")]
    pub daily_withdrawal_limit: Decimal,
    /// Daily cap on share purchases per member.
    #[serde(default = "default_daily_share_purchase_limit")]
    pub daily_share_purchase_limit: Decimal,
    /// Daily cap on wallet movements per member.
    #[serde(default = "default_wallet_daily_limit")]
    pub wallet_daily_limit: Decimal,
}

fn default_max_transaction_amount() -> Decimal {
    Decimal::from(10_000_000)
}

fn default_max_daily_transactions() -> u32 {
    10
}

fn default_daily_deposit_limit() -> Decimal {
    Decimal::from(1_000_000)
}

fn default_daily_withdrawal_limit() -> Decimal {
    Decimal::from(500_000)
}

fn default_daily_share_purchase_limit() -> Decimal {
    Decimal::from(1_000_000)
}

fn default_wallet_daily_limit() -> Decimal {
    Decimal::from(5_000_000)
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_transaction_amount: default_max_transaction_amount(),
            max_daily_transactions: default_max_daily_transactions(),
            daily_deposit_limit: default_daily_deposit_limit(),
            daily_withdrawal_limit: default_daily_withdrawal_limit(),
            daily_share_purchase_limit: default_daily_share_purchase_limit(),
            wallet_daily_limit: default_wallet_daily_limit(),
        }
    }
}

/// Share capital configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SharesConfig {
    /// Price of a single share unit.
    #[serde(default = "default_share_unit_price")]
    pub unit_price: Decimal,
}

fn default_share_unit_price() -> Decimal {
    Decimal::from(1_000)
}

impl Default for SharesConfig {
    fn default() -> Self {
        Self {
            unit_price: default_share_unit_price(),
        }
    }
}

/// Loan configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoansConfig {
    /// Penalty charged per month on overdue amounts, in percent.
    #[serde(default = "default_penalty_rate")]
    pub penalty_rate_per_month: Decimal,
    /// Days after the due date before penalties start accruing.
    #[serde(default)]
    pub grace_period_days: u32,
}

fn default_penalty_rate() -> Decimal {
    Decimal::from(5)
}

impl Default for LoansConfig {
    fn default() -> Self {
        Self {
            penalty_rate_per_month: default_penalty_rate(),
            grace_period_days: 0,
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("SACCO").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_limit_defaults() {
        let limits = LimitsConfig::default();
        assert_eq!(limits.max_transaction_amount, dec!(10000000));
        assert_eq!(limits.max_daily_transactions, 10);
        assert_eq!(limits.daily_deposit_limit, dec!(1000000));
        assert_eq!(limits.daily_withdrawal_limit, dec!(500000));
        assert_eq!(limits.daily_share_purchase_limit, dec!(1000000));
        assert_eq!(limits.wallet_daily_limit, dec!(5000000));
    }

    #[test]
    fn test_share_and_loan_defaults() {
        assert_eq!(SharesConfig::default().unit_price, dec!(1000));
        let loans = LoansConfig::default();
        assert_eq!(loans.penalty_rate_per_month, dec!(5));
        assert_eq!(loans.grace_period_days, 0);
    }

    #[test]
    fn test_load_from_environment() {
        temp_env::with_vars(
            [
                ("SACCO__DATABASE__URL", Some("postgres://localhost/sacco_test")),
                ("SACCO__LIMITS__MAX_DAILY_TRANSACTIONS", Some("3")),
                ("RUN_MODE", Some("test-nonexistent")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.database.url, "postgres://localhost/sacco_test");
                assert_eq!(config.database.max_connections, 10);
                assert_eq!(config.limits.max_daily_transactions, 3);
                assert_eq!(config.limits.daily_deposit_limit, dec!(1000000));
                assert_eq!(config.shares.unit_price, dec!(1000));
            },
        );
    }

    #[test]
    fn test_load_requires_database_url() {
        temp_env::with_vars(
            [
                ("SACCO__DATABASE__URL", None::<&str>),
                ("RUN_MODE", Some("test-nonexistent")),
            ],
            || {
                assert!(AppConfig::load().is_err());
            },
        );
    }
}
