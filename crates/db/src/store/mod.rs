//! PostgreSQL adapter for the core persistence ports.
//!
//! Every unit of work is one database transaction. Row locks are taken with
//! `SELECT ... FOR UPDATE` and held until the transaction ends; waiting for a
//! lock is bounded by a per-transaction `lock_timeout`. Sequences are bumped
//! with an atomic upsert inside the unit of work; the sequence row stays
//! locked until commit, so numbers of one scope are issued in commit order.

mod mapping;
mod repositories;

use std::time::Duration;

use async_trait::async_trait;
use sacco_core::store::{Store, StoreError, StoreResult};
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr, SqlErr, TransactionTrait,
};

/// Default time a unit of work waits for a row lock.
const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// [`Store`] backed by a `SeaORM` connection pool.
#[derive(Debug, Clone)]
pub struct SeaOrmStore {
    db: DatabaseConnection,
    lock_timeout: Duration,
}

impl SeaOrmStore {
    /// Creates a store over an open connection pool.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    /// Sets how long a unit of work waits for a row lock.
    #[must_use]
    pub fn with_lock_timeout(mut self, lock_timeout: Duration) -> Self {
        self.lock_timeout = lock_timeout;
        self
    }

    /// Returns the underlying connection pool.
    #[must_use]
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

#[async_trait]
impl Store for SeaOrmStore {
    type Work = SeaOrmWork;

    async fn begin(&self) -> StoreResult<Self::Work> {
        let txn = self.db.begin().await.map_err(backend)?;
        let millis = self.lock_timeout.as_millis();
        txn.execute_unprepared(&format!("SET LOCAL lock_timeout = '{millis}ms'"))
            .await
            .map_err(backend)?;
        Ok(SeaOrmWork { txn })
    }

    async fn commit(&self, work: Self::Work) -> StoreResult<()> {
        work.txn.commit().await.map_err(backend)
    }

    async fn rollback(&self, work: Self::Work) -> StoreResult<()> {
        work.txn.rollback().await.map_err(backend)
    }
}

/// Unit of work over a [`SeaOrmStore`]: one open database transaction.
pub struct SeaOrmWork {
    txn: DatabaseTransaction,
}

/// Maps a database error raised while touching `entity` rows.
#[allow(clippy::needless_pass_by_value)]
fn classify(entity: &'static str, err: DbErr) -> StoreError {
    if let Some(SqlErr::UniqueConstraintViolation(detail)) = err.sql_err() {
        return StoreError::Duplicate {
            entity,
            key: detail,
        };
    }
    let message = err.to_string();
    if message.contains("lock timeout") {
        StoreError::LockTimeout(entity.to_string())
    } else {
        StoreError::Backend(message)
    }
}

#[allow(clippy::needless_pass_by_value)]
fn backend(err: DbErr) -> StoreError {
    StoreError::Backend(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_lock_timeout() {
        let err = DbErr::Custom("canceling statement due to lock timeout".to_string());
        assert!(matches!(
            classify("loan", err),
            StoreError::LockTimeout(entity) if entity == "loan"
        ));
    }

    #[test]
    fn test_classify_other_errors_as_backend() {
        let err = DbErr::Custom("connection reset".to_string());
        assert!(matches!(classify("transaction", err), StoreError::Backend(_)));
    }
}
