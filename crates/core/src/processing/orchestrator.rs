//! The transaction processing pipeline.
//!
//! Every call runs inside one unit of work. Validation, numbering, the
//! handler's side effects, the balance update, and the ledger batch are all
//! committed together or rolled back together.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sacco_shared::AppConfig;
use sacco_shared::types::{TransactionId, UserId};
use serde_json::json;

use super::clock::{Clock, SystemClock};
use super::events::{EventSink, TracingEventSink, TransactionEvent};
use crate::balance::BalanceLedger;
use crate::domain::{
    Transaction, TransactionCategory, TransactionIntent, TransactionStatus, TransactionType,
};
use crate::error::{CoreError, CoreResult};
use crate::general_ledger::{GeneralLedgerPoster, PostedBatch};
use crate::handlers::{
    HandlerContext, HandlerRegistry, ShareSettings, TransactionAmounts, TransactionHandler,
};
use crate::loan::{LoanCalculationEngine, LoanSettings};
use crate::numbering::NumberGenerator;
use crate::store::{Store, UnitOfWork};
use crate::validation::{Limits, ValidationEngine};

/// Processes transaction intents and reversals against a [`Store`].
pub struct TransactionOrchestrator<S: Store> {
    store: S,
    handlers: HandlerRegistry,
    validation: ValidationEngine,
    numbers: NumberGenerator,
    balances: BalanceLedger,
    poster: GeneralLedgerPoster,
    loans: LoanCalculationEngine,
    clock: Arc<dyn Clock>,
    events: Arc<dyn EventSink>,
}

impl<S: Store> TransactionOrchestrator<S> {
    /// Creates an orchestrator with the standard handlers, the system clock,
    /// and a tracing event sink.
    #[must_use]
    pub fn new(store: S, limits: Limits, shares: ShareSettings, loans: LoanSettings) -> Self {
        Self {
            store,
            handlers: HandlerRegistry::standard(shares),
            validation: ValidationEngine::new(limits),
            numbers: NumberGenerator::new(),
            balances: BalanceLedger::new(),
            poster: GeneralLedgerPoster::new(),
            loans: LoanCalculationEngine::new(loans),
            clock: Arc::new(SystemClock),
            events: Arc::new(TracingEventSink),
        }
    }

    /// Creates an orchestrator from the application configuration.
    #[must_use]
    pub fn from_config(store: S, config: &AppConfig) -> Self {
        Self::new(
            store,
            Limits::from(&config.limits),
            ShareSettings::from(&config.shares),
            LoanSettings::from(&config.loans),
        )
    }

    /// Replaces the handler registry.
    #[must_use]
    pub fn with_handlers(mut self, handlers: HandlerRegistry) -> Self {
        self.handlers = handlers;
        self
    }

    /// Replaces the clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the event sink.
    #[must_use]
    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Returns the store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Processes an intent and returns the completed transaction.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransaction` or `InsufficientBalance` for rejected
    /// input, and `ProcessingFailure` wrapping anything else. Nothing is
    /// persisted when an error is returned.
    pub async fn process_transaction(&self, intent: TransactionIntent) -> CoreResult<Transaction> {
        let Some(handler) = self.handlers.get(intent.transaction_type) else {
            let err = CoreError::invalid(format!(
                "Unsupported transaction type: {}",
                intent.transaction_type
            ));
            return Err(self.failed(&intent, err));
        };

        let now = self.clock.now();
        let mut work = match self.store.begin().await {
            Ok(work) => work,
            Err(err) => return Err(self.failed(&intent, err.into())),
        };

        let outcome = self.run(&mut work, handler.as_ref(), &intent, now).await;
        let (transaction, batch) = match outcome {
            Ok(done) => done,
            Err(err) => {
                self.discard(work).await;
                return Err(self.failed(&intent, err));
            }
        };

        if let Err(err) = self.store.commit(work).await {
            return Err(self.failed(&intent, err.into()));
        }

        tracing::info!(
            transaction = %transaction.transaction_number,
            transaction_type = %transaction.transaction_type,
            member_id = %transaction.member_id,
            amount = %transaction.amount,
            batch_id = %batch.batch_id,
            "Transaction processed"
        );
        self.events
            .emit(TransactionEvent::processed(&transaction, batch.batch_id));
        Ok(transaction)
    }

    async fn run(
        &self,
        uow: &mut dyn UnitOfWork,
        handler: &dyn TransactionHandler,
        intent: &TransactionIntent,
        now: DateTime<Utc>,
    ) -> CoreResult<(Transaction, PostedBatch)> {
        let direction = handler.direction(intent)?;
        let amounts = TransactionAmounts::for_intent(intent, direction)?;

        self.validation.validate_business_rules(uow, intent).await?;
        let mut ctx = HandlerContext {
            uow,
            now,
            numbers: self.numbers,
            balances: self.balances,
            loans: self.loans,
        };
        handler.validate(&mut ctx, intent).await?;
        self.validation
            .validate_security_constraints(ctx.uow, intent, now.date_naive())
            .await?;
        tracing::debug!(
            transaction_type = %intent.transaction_type,
            member_id = %intent.member_id,
            "Intent validated"
        );

        let number = self
            .numbers
            .next_transaction_number(ctx.uow, intent.transaction_type, now)
            .await?;
        let mut transaction = pending_transaction(intent, amounts, number, now);
        ctx.uow.insert_transaction(&transaction).await?;

        handler.execute(&mut ctx, &mut transaction, intent).await?;
        tracing::debug!(transaction = %transaction.transaction_number, "Handler executed");

        self.balances
            .update_account_balance(ctx.uow, &mut transaction, now)
            .await?;

        let legs = handler
            .accounting_entries(&mut ctx, &transaction, intent)
            .await?;
        let batch = self.poster.post(ctx.uow, &transaction, legs, now).await?;
        self.poster.verify_batch(ctx.uow, batch.batch_id).await?;

        transaction.status = TransactionStatus::Completed;
        ctx.uow.update_transaction(&transaction).await?;
        Ok((transaction, batch))
    }

    /// Reverses a completed transaction and returns the reversal.
    ///
    /// The reversal undoes the original's balance movement, including the
    /// credit a wallet transfer made to savings, and posts the mirror of its
    /// ledger batch. Loan buckets and share units are left as they are.
    ///
    /// # Errors
    ///
    /// Returns `TransactionNotFound` for an unknown id, `InvalidTransaction`
    /// if the original is a reversal, is already reversed, or is not
    /// completed, `InsufficientBalance` if credited funds were already spent,
    /// and `ProcessingFailure` wrapping anything else.
    pub async fn reverse_transaction(
        &self,
        transaction_id: TransactionId,
        reason: &str,
        reversed_by: UserId,
    ) -> CoreResult<Transaction> {
        let now = self.clock.now();
        let mut work = match self.store.begin().await {
            Ok(work) => work,
            Err(err) => return Err(self.reversal_failed(transaction_id, err.into())),
        };

        let outcome = self
            .run_reversal(&mut work, transaction_id, reason, reversed_by, now)
            .await;
        let (original, reversal) = match outcome {
            Ok(done) => done,
            Err(err) => {
                self.discard(work).await;
                return Err(self.reversal_failed(transaction_id, err));
            }
        };

        if let Err(err) = self.store.commit(work).await {
            return Err(self.reversal_failed(transaction_id, err.into()));
        }

        tracing::info!(
            original = %original.transaction_number,
            reversal = %reversal.transaction_number,
            %reason,
            "Transaction reversed"
        );
        self.events
            .emit(TransactionEvent::reversed(&original, &reversal, reason));
        Ok(reversal)
    }

    async fn run_reversal(
        &self,
        uow: &mut dyn UnitOfWork,
        transaction_id: TransactionId,
        reason: &str,
        reversed_by: UserId,
        now: DateTime<Utc>,
    ) -> CoreResult<(Transaction, Transaction)> {
        let mut original = uow
            .lock_transaction_for_update(transaction_id)
            .await?
            .ok_or(CoreError::TransactionNotFound(transaction_id))?;

        if original.transaction_type == TransactionType::Reversal {
            return Err(CoreError::invalid(format!(
                "Transaction {} is a reversal and cannot be reversed",
                original.transaction_number
            )));
        }
        if original.is_reversed() {
            return Err(CoreError::invalid(format!(
                "Transaction {} is already reversed",
                original.transaction_number
            )));
        }
        if original.status != TransactionStatus::Completed {
            return Err(CoreError::invalid(format!(
                "Transaction {} is {}; only completed transactions can be reversed",
                original.transaction_number, original.status
            )));
        }

        let number = self
            .numbers
            .next_transaction_number(uow, TransactionType::Reversal, now)
            .await?;
        let mut reversal = reversal_transaction(&original, number, reason, reversed_by, now);

        self.balances
            .reverse_account_balance(uow, &original, &mut reversal, now)
            .await?;
        uow.insert_transaction(&reversal).await?;

        let batch = self
            .poster
            .post_reversal(uow, &original, &reversal, now)
            .await?;
        self.poster.verify_batch(uow, batch.batch_id).await?;

        original.status = TransactionStatus::Reversed;
        original.reversal_reason = Some(reason.to_string());
        original.reversed_by = Some(reversed_by);
        original.reversed_at = Some(now);
        uow.update_transaction(&original).await?;

        Ok((original, reversal))
    }

    async fn discard(&self, work: S::Work) {
        if let Err(err) = self.store.rollback(work).await {
            tracing::error!(error = %err, "Rollback failed");
        }
    }

    fn failed(&self, intent: &TransactionIntent, err: CoreError) -> CoreError {
        log_failure(&err, || {
            format!(
                "{} of {} for member {}",
                intent.transaction_type, intent.amount, intent.member_id
            )
        });
        let err = err.into_processing_failure();
        self.events.emit(TransactionEvent::failed(intent, &err));
        err
    }

    fn reversal_failed(&self, transaction_id: TransactionId, err: CoreError) -> CoreError {
        log_failure(&err, || format!("reversal of {transaction_id}"));
        let err = err.into_processing_failure();
        self.events
            .emit(TransactionEvent::reversal_failed(transaction_id, &err));
        err
    }
}

fn log_failure(err: &CoreError, attempt: impl Fn() -> String) {
    match err.root() {
        CoreError::LedgerImbalance { .. } => {
            tracing::error!(error = %err, attempt = %attempt(), "Ledger imbalance; rolled back");
        }
        root if root.is_invalid_transaction() => {
            tracing::warn!(error = %err, attempt = %attempt(), "Transaction rejected");
        }
        _ => {
            tracing::error!(error = %err, attempt = %attempt(), "Transaction processing failed");
        }
    }
}

fn pending_transaction(
    intent: &TransactionIntent,
    amounts: TransactionAmounts,
    transaction_number: String,
    now: DateTime<Utc>,
) -> Transaction {
    Transaction {
        id: TransactionId::new(),
        transaction_number,
        member_id: intent.member_id,
        account_id: intent.account_id,
        transaction_type: intent.transaction_type,
        wallet_operation: intent.wallet_operation,
        category: intent.transaction_type.category(),
        amount: amounts.amount,
        fee_amount: amounts.fee,
        net_amount: amounts.net,
        balance_before: Decimal::ZERO,
        balance_after: Decimal::ZERO,
        status: TransactionStatus::Pending,
        transaction_date: now,
        related_loan_id: intent.related_loan_id,
        related_account_id: intent.related_account_id,
        description: intent.description.clone(),
        processed_by: intent.processed_by,
        reversal_reason: None,
        reversed_by: None,
        reversed_at: None,
        metadata: intent
            .metadata
            .clone()
            .unwrap_or_else(|| serde_json::Value::Object(serde_json::Map::new())),
    }
}

fn reversal_transaction(
    original: &Transaction,
    transaction_number: String,
    reason: &str,
    reversed_by: UserId,
    now: DateTime<Utc>,
) -> Transaction {
    Transaction {
        id: TransactionId::new(),
        transaction_number,
        member_id: original.member_id,
        account_id: original.account_id,
        transaction_type: TransactionType::Reversal,
        wallet_operation: None,
        category: TransactionCategory::Reversal,
        amount: -original.amount,
        fee_amount: -original.fee_amount,
        net_amount: -original.net_amount,
        balance_before: original.balance_after,
        balance_after: original.balance_before,
        status: TransactionStatus::Completed,
        transaction_date: now,
        related_loan_id: original.related_loan_id,
        related_account_id: original.related_account_id,
        description: Some(format!(
            "Reversal of {}: {reason}",
            original.transaction_number
        )),
        processed_by: reversed_by,
        reversal_reason: Some(reason.to_string()),
        reversed_by: None,
        reversed_at: None,
        metadata: json!({
            "original_transaction_id": original.id,
            "original_transaction_number": original.transaction_number,
        }),
    }
}
