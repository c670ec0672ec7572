use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::limits::Limits;
use crate::domain::{MemberStatus, MembershipStatus, TransactionIntent};
use crate::error::{CoreError, CoreResult};
use crate::store::UnitOfWork;

/// Validates intents against amount bounds, member and account status, and
/// daily limits.
///
/// Every rejection is an `InvalidTransaction` with a human-readable reason.
#[derive(Debug, Clone)]
pub struct ValidationEngine {
    limits: Limits,
}

impl ValidationEngine {
    /// Creates an engine enforcing `limits`.
    #[must_use]
    pub const fn new(limits: Limits) -> Self {
        Self { limits }
    }

    /// Returns the enforced limits.
    #[must_use]
    pub const fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Checks the amount, type, member, and account of an intent.
    ///
    /// Members must be active unless the intent comes from an onboarding
    /// flow, and must always hold an approved membership.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransaction` describing the first failed rule.
    pub async fn validate_business_rules(
        &self,
        uow: &mut dyn UnitOfWork,
        intent: &TransactionIntent,
    ) -> CoreResult<()> {
        self.validate_amount(intent.amount)?;

        if !self.limits.allows(intent.transaction_type) {
            return Err(CoreError::invalid(format!(
                "Transaction type {} is not allowed",
                intent.transaction_type
            )));
        }

        let member = uow
            .find_member(intent.member_id)
            .await?
            .ok_or_else(|| CoreError::invalid(format!("Member {} not found", intent.member_id)))?;

        if member.status != MemberStatus::Active && !intent.onboarding {
            return Err(CoreError::invalid(format!(
                "Member {} is {}",
                member.member_number, member.status
            )));
        }
        if member.membership_status != MembershipStatus::Approved {
            return Err(CoreError::invalid(format!(
                "Membership of {} is not approved",
                member.member_number
            )));
        }

        if let Some(account_id) = intent.account_id {
            let account = uow
                .find_account(account_id)
                .await?
                .ok_or_else(|| CoreError::invalid(format!("Account {account_id} not found")))?;
            if !account.is_active() {
                return Err(CoreError::invalid(format!(
                    "Account {} is {}",
                    account.account_number, account.status
                )));
            }
        }

        Ok(())
    }

    /// Checks account ownership and the member's daily limits for `today`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransaction` if the account belongs to another member
    /// or a daily limit would be exceeded.
    pub async fn validate_security_constraints(
        &self,
        uow: &mut dyn UnitOfWork,
        intent: &TransactionIntent,
        today: NaiveDate,
    ) -> CoreResult<()> {
        if let Some(account_id) = intent.account_id {
            let owned = uow
                .find_account(account_id)
                .await?
                .is_some_and(|account| account.member_id == intent.member_id);
            if !owned {
                return Err(CoreError::invalid(format!(
                    "Account {account_id} does not belong to member {}",
                    intent.member_id
                )));
            }
        }

        self.validate_daily_limits(uow, intent, today).await
    }

    /// Checks the member's completed-transaction count and the per-type
    /// daily amount for `today`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransaction` if either limit would be exceeded.
    pub async fn validate_daily_limits(
        &self,
        uow: &mut dyn UnitOfWork,
        intent: &TransactionIntent,
        today: NaiveDate,
    ) -> CoreResult<()> {
        let count = uow.count_completed_on(intent.member_id, today).await?;
        if count >= self.limits.max_daily_transactions {
            return Err(CoreError::invalid(format!(
                "Daily transaction limit of {} reached",
                self.limits.max_daily_transactions
            )));
        }

        if let Some(limit) = self.limits.daily_limit_for(intent.transaction_type) {
            let used = uow
                .sum_completed_on(intent.member_id, today, intent.transaction_type)
                .await?;
            if used + intent.amount > limit {
                return Err(CoreError::invalid(format!(
                    "Daily {} limit of {limit} exceeded: {used} already used today",
                    intent.transaction_type
                )));
            }
        }

        Ok(())
    }

    fn validate_amount(&self, amount: Decimal) -> CoreResult<()> {
        if amount <= Decimal::ZERO {
            return Err(CoreError::invalid("Amount must be greater than zero"));
        }
        if amount > self.limits.max_transaction_amount {
            return Err(CoreError::invalid(format!(
                "Amount exceeds the maximum of {}",
                self.limits.max_transaction_amount
            )));
        }
        Ok(())
    }
}
