//! Processing outcome events.
//!
//! The orchestrator emits one event per attempt. Sinks are fire-and-forget:
//! a sink that cannot deliver logs the problem and drops the event.

use rust_decimal::Decimal;
use sacco_shared::types::{BatchId, MemberId, TransactionId};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::domain::{Transaction, TransactionIntent, TransactionType};
use crate::error::CoreError;

/// Outcome of a processing or reversal attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TransactionEvent {
    /// A transaction was committed.
    TransactionProcessed {
        /// Committed transaction.
        transaction_id: TransactionId,
        /// Its number.
        transaction_number: String,
        /// Its type.
        transaction_type: TransactionType,
        /// Owning member.
        member_id: MemberId,
        /// Recorded amount.
        amount: Decimal,
        /// Ledger batch posted for it.
        batch_id: BatchId,
    },
    /// An intent was rejected or failed and nothing was written.
    TransactionFailed {
        /// Requesting member.
        member_id: MemberId,
        /// Requested type.
        transaction_type: TransactionType,
        /// Requested amount.
        amount: Decimal,
        /// Code of the innermost error.
        error_code: String,
        /// Error message.
        reason: String,
    },
    /// A transaction was reversed.
    TransactionReversed {
        /// The reversed transaction.
        original_id: TransactionId,
        /// The reversal transaction.
        reversal_id: TransactionId,
        /// Number of the reversal.
        reversal_number: String,
        /// Reason given by the operator.
        reason: String,
    },
    /// A reversal was rejected or failed and nothing was written.
    ReversalFailed {
        /// Transaction the reversal targeted.
        original_id: TransactionId,
        /// Code of the innermost error.
        error_code: String,
        /// Error message.
        reason: String,
    },
}

impl TransactionEvent {
    pub(crate) fn processed(transaction: &Transaction, batch_id: BatchId) -> Self {
        Self::TransactionProcessed {
            transaction_id: transaction.id,
            transaction_number: transaction.transaction_number.clone(),
            transaction_type: transaction.transaction_type,
            member_id: transaction.member_id,
            amount: transaction.amount,
            batch_id,
        }
    }

    pub(crate) fn failed(intent: &TransactionIntent, error: &CoreError) -> Self {
        Self::TransactionFailed {
            member_id: intent.member_id,
            transaction_type: intent.transaction_type,
            amount: intent.amount,
            error_code: error.root().error_code().to_string(),
            reason: error.to_string(),
        }
    }

    pub(crate) fn reversed(original: &Transaction, reversal: &Transaction, reason: &str) -> Self {
        Self::TransactionReversed {
            original_id: original.id,
            reversal_id: reversal.id,
            reversal_number: reversal.transaction_number.clone(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn reversal_failed(original_id: TransactionId, error: &CoreError) -> Self {
        Self::ReversalFailed {
            original_id,
            error_code: error.root().error_code().to_string(),
            reason: error.to_string(),
        }
    }

    /// Short name of the event kind.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::TransactionProcessed { .. } => "transaction_processed",
            Self::TransactionFailed { .. } => "transaction_failed",
            Self::TransactionReversed { .. } => "transaction_reversed",
            Self::ReversalFailed { .. } => "reversal_failed",
        }
    }
}

/// Receiver of processing events.
pub trait EventSink: Send + Sync {
    /// Emits one event. Must not block.
    fn emit(&self, event: TransactionEvent);
}

/// Drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn emit(&self, _event: TransactionEvent) {}
}

/// Writes events to the `tracing` subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: TransactionEvent) {
        match &event {
            TransactionEvent::TransactionProcessed {
                transaction_number,
                amount,
                ..
            } => tracing::info!(event = event.name(), %transaction_number, %amount),
            TransactionEvent::TransactionFailed {
                member_id,
                error_code,
                reason,
                ..
            } => tracing::warn!(event = event.name(), %member_id, %error_code, %reason),
            TransactionEvent::TransactionReversed {
                reversal_number,
                reason,
                ..
            } => tracing::info!(event = event.name(), %reversal_number, %reason),
            TransactionEvent::ReversalFailed {
                original_id,
                error_code,
                reason,
            } => tracing::warn!(event = event.name(), %original_id, %error_code, %reason),
        }
    }
}

/// Forwards events to an unbounded channel for a background consumer.
#[derive(Debug, Clone)]
pub struct ChannelEventSink {
    sender: mpsc::UnboundedSender<TransactionEvent>,
}

impl ChannelEventSink {
    /// Creates a sink and the receiver its events arrive on.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TransactionEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: TransactionEvent) {
        if let Err(err) = self.sender.send(event) {
            tracing::error!(event = err.0.name(), "Event receiver dropped; event discarded");
        }
    }
}
