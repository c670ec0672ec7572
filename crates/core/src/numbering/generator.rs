use chrono::{DateTime, Datelike, Utc};

use crate::domain::TransactionType;
use crate::error::CoreResult;
use crate::store::UnitOfWork;

/// Allocates unique transaction and certificate numbers.
///
/// Sequences come from the store's atomic counters, so two concurrent callers
/// never receive the same number.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberGenerator;

impl NumberGenerator {
    /// Creates a generator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Returns the next transaction number for `transaction_type` on `now`'s date.
    ///
    /// # Errors
    ///
    /// Returns a store error if the sequence cannot be advanced.
    pub async fn next_transaction_number(
        &self,
        sequences: &mut dyn UnitOfWork,
        transaction_type: TransactionType,
        now: DateTime<Utc>,
    ) -> CoreResult<String> {
        let date = now.format("%Y%m%d").to_string();
        let code = transaction_type.code();
        let sequence = sequences
            .next_sequence(&format!("txn:{date}:{code}"))
            .await?;
        Ok(format_transaction_number(&date, code, sequence))
    }

    /// Returns the next share certificate number for `now`'s year.
    ///
    /// # Errors
    ///
    /// Returns a store error if the sequence cannot be advanced.
    pub async fn next_certificate_number(
        &self,
        sequences: &mut dyn UnitOfWork,
        now: DateTime<Utc>,
    ) -> CoreResult<String> {
        let year = now.year();
        let sequence = sequences.next_sequence(&format!("cert:{year}")).await?;
        Ok(format!("SC-{year}-{sequence:05}"))
    }
}

fn format_transaction_number(date: &str, code: &str, sequence: u64) -> String {
    format!("TXN-{date}-{code}-{sequence:04}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryStore, Store};
    use chrono::TimeZone;
    use rstest::rstest;

    #[rstest]
    #[case("20260115", "DEP", 1, "TXN-20260115-DEP-0001")]
    #[case("20260115", "WDR", 42, "TXN-20260115-WDR-0042")]
    #[case("20261231", "REV", 12345, "TXN-20261231-REV-12345")]
    fn test_format_transaction_number(
        #[case] date: &str,
        #[case] code: &str,
        #[case] sequence: u64,
        #[case] expected: &str,
    ) {
        assert_eq!(format_transaction_number(date, code, sequence), expected);
    }

    #[tokio::test]
    async fn test_sequence_per_day_and_type() {
        let store = InMemoryStore::new();
        let mut uow = store.begin().await.unwrap();
        let generator = NumberGenerator::new();
        let day_one = Utc.with_ymd_and_hms(2026, 1, 15, 9, 0, 0).unwrap();
        let day_two = Utc.with_ymd_and_hms(2026, 1, 16, 9, 0, 0).unwrap();

        let first = generator
            .next_transaction_number(&mut uow, TransactionType::Deposit, day_one)
            .await
            .unwrap();
        let second = generator
            .next_transaction_number(&mut uow, TransactionType::Deposit, day_one)
            .await
            .unwrap();
        let other_type = generator
            .next_transaction_number(&mut uow, TransactionType::Withdrawal, day_one)
            .await
            .unwrap();
        let next_day = generator
            .next_transaction_number(&mut uow, TransactionType::Deposit, day_two)
            .await
            .unwrap();

        assert_eq!(first, "TXN-20260115-DEP-0001");
        assert_eq!(second, "TXN-20260115-DEP-0002");
        assert_eq!(other_type, "TXN-20260115-WDR-0001");
        assert_eq!(next_day, "TXN-20260116-DEP-0001");
    }

    #[tokio::test]
    async fn test_certificate_numbers() {
        let store = InMemoryStore::new();
        let mut uow = store.begin().await.unwrap();
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();

        let number = NumberGenerator::new()
            .next_certificate_number(&mut uow, now)
            .await
            .unwrap();
        assert_eq!(number, "SC-2026-00001");
    }

    #[tokio::test]
    async fn test_concurrent_callers_get_distinct_numbers() {
        let store = InMemoryStore::new();
        let now = Utc.with_ymd_and_hms(2026, 1, 15, 9, 0, 0).unwrap();

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move {
                    let mut uow = store.begin().await.unwrap();
                    NumberGenerator::new()
                        .next_transaction_number(&mut uow, TransactionType::Deposit, now)
                        .await
                        .unwrap()
                })
            })
            .collect();

        let mut numbers = Vec::new();
        for task in tasks {
            numbers.push(task.await.unwrap());
        }
        numbers.sort();
        numbers.dedup();
        assert_eq!(numbers.len(), 16);
    }
}
