use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sacco_shared::types::{AccountId, TransactionId};

use super::interest::daily_interest;
use crate::domain::{Account, Accountable, BalanceDirection, Transaction};
use crate::error::{CoreError, CoreResult};
use crate::store::{StoreError, UnitOfWork};

/// Applies transaction deltas to account balances.
///
/// The account's accountable stays locked from the read of `balance_before`
/// until the unit of work ends, so concurrent movements on one account are
/// serialized and never lose an update.
#[derive(Debug, Clone, Copy, Default)]
pub struct BalanceLedger;

impl BalanceLedger {
    /// Creates a balance ledger.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Applies `transaction`'s delta to its account and records the balances
    /// before and after on the transaction.
    ///
    /// Debits against savings are refused when the available balance does
    /// not cover the net amount or the gross amount would overdraw the
    /// account. Savings with daily-balance interest accrue one day of
    /// interest on the new balance.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientBalance`, `InvalidTransaction` for a transaction
    /// without a balance direction, or a store error.
    pub async fn update_account_balance(
        &self,
        uow: &mut dyn UnitOfWork,
        transaction: &mut Transaction,
        now: DateTime<Utc>,
    ) -> CoreResult<()> {
        let Some(account_id) = transaction.account_id else {
            return Ok(());
        };
        let delta = transaction.balance_delta().ok_or_else(|| {
            CoreError::invalid(format!(
                "Transaction {} has no balance direction",
                transaction.transaction_number
            ))
        })?;

        let (mut account, mut accountable) = lock(uow, account_id).await?;
        let balance_before = accountable.balance();

        if transaction.direction() == Some(BalanceDirection::Debit) && accountable.is_savings() {
            let available = self
                .get_available_balance(uow, &account, &accountable, Some(transaction.id))
                .await?;
            if available < transaction.net_amount {
                return Err(CoreError::InsufficientBalance {
                    available,
                    requested: transaction.net_amount,
                });
            }
            if balance_before + delta < Decimal::ZERO {
                return Err(CoreError::InsufficientBalance {
                    available: balance_before,
                    requested: transaction.amount,
                });
            }
        }

        let balance_after = balance_before + delta;
        accountable.set_balance(balance_after);
        if let Accountable::Savings(savings) = &mut accountable {
            savings.interest_earned += daily_interest(savings);
        }

        persist(uow, &mut account, &accountable, now).await?;

        transaction.balance_before = balance_before;
        transaction.balance_after = balance_after;

        tracing::debug!(
            transaction = %transaction.transaction_number,
            account = %account.account_number,
            %balance_before,
            %balance_after,
            "Updated account balance"
        );
        Ok(())
    }

    /// Undoes `original`'s delta on its account and records the balances
    /// before and after on `reversal`.
    ///
    /// A transfer that credited a second account has that credit taken back
    /// first, in the same lock order as the transfer itself. Neither undo may
    /// take a savings balance below zero.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientBalance` if the credited funds have already been
    /// spent, `InvalidTransaction` if the original has no balance direction,
    /// or a store error.
    pub async fn reverse_account_balance(
        &self,
        uow: &mut dyn UnitOfWork,
        original: &Transaction,
        reversal: &mut Transaction,
        now: DateTime<Utc>,
    ) -> CoreResult<()> {
        let Some(account_id) = original.account_id else {
            return Ok(());
        };
        let delta = original.balance_delta().ok_or_else(|| {
            CoreError::invalid(format!(
                "Transaction {} has no balance to reverse",
                original.transaction_number
            ))
        })?;

        if let Some(target_id) = related_account(original)? {
            let (mut target, mut target_accountable) = lock(uow, target_id).await?;
            let target_before = target_accountable.balance();
            let target_after = undo_credit(&target_accountable, original.net_amount)?;
            target_accountable.set_balance(target_after);
            persist(uow, &mut target, &target_accountable, now).await?;

            tracing::debug!(
                original = %original.transaction_number,
                account = %target.account_number,
                balance_before = %target_before,
                balance_after = %target_after,
                "Reversed related account credit"
            );
        }

        let (mut account, mut accountable) = lock(uow, account_id).await?;
        let balance_before = accountable.balance();
        let balance_after = if delta > Decimal::ZERO {
            undo_credit(&accountable, delta)?
        } else {
            balance_before - delta
        };
        accountable.set_balance(balance_after);

        persist(uow, &mut account, &accountable, now).await?;

        reversal.balance_before = balance_before;
        reversal.balance_after = balance_after;

        tracing::debug!(
            original = %original.transaction_number,
            account = %account.account_number,
            %balance_before,
            %balance_after,
            "Reversed account balance"
        );
        Ok(())
    }

    /// Credits `amount` to a second account touched by a transfer and
    /// returns its balances before and after.
    ///
    /// # Errors
    ///
    /// Returns a store error if the account or its accountable is missing.
    pub async fn credit_related_account(
        &self,
        uow: &mut dyn UnitOfWork,
        account_id: AccountId,
        amount: Decimal,
        now: DateTime<Utc>,
    ) -> CoreResult<(Decimal, Decimal)> {
        let (mut account, mut accountable) = lock(uow, account_id).await?;
        let balance_before = accountable.balance();
        let balance_after = balance_before + amount;
        accountable.set_balance(balance_after);
        if let Accountable::Savings(savings) = &mut accountable {
            savings.interest_earned += daily_interest(savings);
        }

        persist(uow, &mut account, &accountable, now).await?;

        tracing::debug!(
            account = %account.account_number,
            %balance_before,
            %balance_after,
            "Credited related account"
        );
        Ok((balance_before, balance_after))
    }

    /// Returns `max(0, balance - minimum - pending withdrawals - loan obligations)`.
    ///
    /// Pending withdrawals ignore `exclude`, which lets a withdrawal check
    /// its own account without counting itself.
    ///
    /// # Errors
    ///
    /// Returns a store error if pending withdrawals cannot be summed.
    pub async fn get_available_balance(
        &self,
        uow: &mut dyn UnitOfWork,
        account: &Account,
        accountable: &Accountable,
        exclude: Option<TransactionId>,
    ) -> CoreResult<Decimal> {
        let pending = uow.pending_withdrawals_sum(account.id, exclude).await?;
        let obligations = self.loan_obligations(account);
        let available = accountable.balance() - account.minimum_balance - pending - obligations;
        Ok(available.max(Decimal::ZERO))
    }

    /// Amount of the account's balance held against loan guarantees.
    ///
    /// Always zero until a guarantee rule exists.
    #[must_use]
    pub fn loan_obligations(&self, _account: &Account) -> Decimal {
        Decimal::ZERO
    }
}

/// Balance after taking back a credit of `amount`.
fn undo_credit(accountable: &Accountable, amount: Decimal) -> CoreResult<Decimal> {
    let balance = accountable.balance();
    if accountable.is_savings() && balance < amount {
        return Err(CoreError::InsufficientBalance {
            available: balance,
            requested: amount,
        });
    }
    Ok(balance - amount)
}

/// Second account credited by a transfer, as recorded in its metadata.
fn related_account(transaction: &Transaction) -> CoreResult<Option<AccountId>> {
    let Some(value) = transaction.metadata.get("target_account_id") else {
        return Ok(None);
    };
    serde_json::from_value(value.clone())
        .map(Some)
        .map_err(|err| {
            StoreError::Corrupt {
                entity: "transaction",
                reason: format!("{}: {err}", transaction.transaction_number),
            }
            .into()
        })
}

async fn lock(
    uow: &mut dyn UnitOfWork,
    account_id: AccountId,
) -> CoreResult<(Account, Accountable)> {
    let account = uow
        .lock_account_for_update(account_id)
        .await?
        .ok_or_else(|| StoreError::missing("account", account_id))?;
    let accountable = uow
        .lock_accountable_for_update(account.accountable)
        .await?
        .ok_or_else(|| StoreError::missing("accountable", account.accountable.id()))?;
    Ok((account, accountable))
}

async fn persist(
    uow: &mut dyn UnitOfWork,
    account: &mut Account,
    accountable: &Accountable,
    now: DateTime<Utc>,
) -> CoreResult<()> {
    if accountable.is_savings() {
        account.balance = accountable.balance();
    }
    account.last_transaction_date = Some(now);

    uow.save_accountable(accountable).await?;
    uow.save_account(account).await?;
    Ok(())
}
