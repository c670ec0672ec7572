//! Trial balance report.
//!
//! Usage:
//!   trial-balance [YYYY-MM-DD]
//!
//! Prints debit and credit balances per general ledger account as of the
//! given date (today, UTC, by default). Exits with status 1 if total debits
//! and credits differ.

use std::process::ExitCode;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use sacco_core::general_ledger::TrialBalance;
use sacco_core::store::Store;
use sacco_db::{SeaOrmStore, connect_with};
use sacco_shared::AppConfig;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sacco=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let as_of = match std::env::args().nth(1) {
        Some(arg) => NaiveDate::parse_from_str(&arg, "%Y-%m-%d")
            .with_context(|| format!("invalid date {arg:?}, expected YYYY-MM-DD"))?,
        None => Utc::now().date_naive(),
    };

    let config = AppConfig::load().context("failed to load configuration")?;
    let db = connect_with(&config.database).await?;
    info!("Connected to database");

    let store = SeaOrmStore::new(db);
    let mut work = store.begin().await?;
    let report = TrialBalance::load(&mut work, as_of).await;
    store.rollback(work).await?;
    let report = report?;

    println!("Trial balance as of {}", report.as_of);
    println!("{:<8} {:<28} {:>18} {:>18}", "Code", "Account", "Debit", "Credit");
    for line in &report.lines {
        println!(
            "{:<8} {:<28} {:>18} {:>18}",
            line.account_code, line.account_name, line.debit_balance, line.credit_balance
        );
    }
    println!(
        "{:<8} {:<28} {:>18} {:>18}",
        "", "Total", report.total_debit, report.total_credit
    );

    if report.is_balanced() {
        info!(%as_of, "Trial balance is balanced");
        Ok(ExitCode::SUCCESS)
    } else {
        error!(
            %as_of,
            total_debit = %report.total_debit,
            total_credit = %report.total_credit,
            "Trial balance does not balance"
        );
        Ok(ExitCode::FAILURE)
    }
}
