use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use sacco_shared::config::SharesConfig;
use sacco_shared::types::ShareCertificateId;
use serde_json::json;

use super::{HandlerContext, TransactionHandler, describe, fee_leg, intent_account, merge_metadata};
use crate::domain::{
    Accountable, BalanceDirection, ShareCertificate, Transaction, TransactionIntent,
    TransactionType,
};
use crate::error::{CoreError, CoreResult};
use crate::general_ledger::{AccountingEntry, GlAccount};
use crate::store::StoreError;

/// Share capital settings, built once from [`SharesConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShareSettings {
    /// Price of one share unit.
    pub unit_price: Decimal,
}

impl From<&SharesConfig> for ShareSettings {
    fn from(config: &SharesConfig) -> Self {
        Self {
            unit_price: config.unit_price,
        }
    }
}

impl Default for ShareSettings {
    fn default() -> Self {
        Self::from(&SharesConfig::default())
    }
}

/// Purchase of share units, paid in cash.
///
/// The net amount must buy a whole number of units. Each purchase issues a
/// certificate. Dr Cash (amount) / Cr Share Capital (net) / Cr Fee Income (fee).
#[derive(Debug, Clone, Copy)]
pub struct SharePurchaseHandler {
    settings: ShareSettings,
}

impl SharePurchaseHandler {
    /// Creates a handler selling units at the configured price.
    #[must_use]
    pub const fn new(settings: ShareSettings) -> Self {
        Self { settings }
    }

    fn units_for(&self, net: Decimal) -> CoreResult<i64> {
        let price = self.settings.unit_price;
        if price <= Decimal::ZERO {
            return Err(CoreError::invalid("Share unit price is not configured"));
        }
        if net <= Decimal::ZERO || !(net % price).is_zero() {
            return Err(CoreError::invalid(format!(
                "Share purchase amount {net} is not a multiple of the unit price {price}"
            )));
        }
        (net / price)
            .to_i64()
            .ok_or_else(|| CoreError::invalid(format!("Share purchase amount {net} is too large")))
    }
}

#[async_trait]
impl TransactionHandler for SharePurchaseHandler {
    fn transaction_type(&self) -> TransactionType {
        TransactionType::SharePurchase
    }

    fn direction(&self, _intent: &TransactionIntent) -> CoreResult<BalanceDirection> {
        Ok(BalanceDirection::Credit)
    }

    async fn validate(
        &self,
        ctx: &mut HandlerContext<'_>,
        intent: &TransactionIntent,
    ) -> CoreResult<()> {
        let (account, accountable) = intent_account(ctx, intent).await?;
        if !matches!(accountable, Accountable::Share(_)) {
            return Err(CoreError::invalid(format!(
                "Account {} is not a share account",
                account.account_number
            )));
        }
        self.units_for(intent.amount - intent.fee())?;
        Ok(())
    }

    async fn execute(
        &self,
        ctx: &mut HandlerContext<'_>,
        transaction: &mut Transaction,
        _intent: &TransactionIntent,
    ) -> CoreResult<()> {
        let units = self.units_for(transaction.net_amount)?;
        let account_id = transaction
            .account_id
            .ok_or_else(|| CoreError::invalid("A share account is required"))?;
        let account = ctx
            .uow
            .lock_account_for_update(account_id)
            .await?
            .ok_or_else(|| StoreError::missing("account", account_id))?;

        let Some(Accountable::Share(mut shares)) =
            ctx.uow.lock_accountable_for_update(account.accountable).await?
        else {
            return Err(StoreError::missing("share_account", account.accountable.id()).into());
        };
        // Total value moves with the account balance; units move here.
        shares.share_units += units;
        ctx.uow.save_accountable(&Accountable::Share(shares.clone())).await?;

        let certificate_number = ctx.numbers.next_certificate_number(ctx.uow, ctx.now).await?;
        let certificate = ShareCertificate {
            id: ShareCertificateId::new(),
            share_account_id: shares.id,
            member_id: transaction.member_id,
            certificate_number: certificate_number.clone(),
            units,
            amount: transaction.net_amount,
            transaction_id: transaction.id,
            issued_at: ctx.now,
        };
        ctx.uow.create_share_certificate(&certificate).await?;

        merge_metadata(
            transaction,
            json!({
                "certificate_number": certificate_number,
                "units": units,
                "unit_price": self.settings.unit_price,
            }),
        );
        Ok(())
    }

    async fn accounting_entries(
        &self,
        _ctx: &mut HandlerContext<'_>,
        transaction: &Transaction,
        _intent: &TransactionIntent,
    ) -> CoreResult<Vec<AccountingEntry>> {
        let description = describe(transaction, "Share purchase");
        Ok(vec![
            GlAccount::CASH.debit(transaction.amount, description.clone()),
            GlAccount::SHARE_CAPITAL.credit(transaction.net_amount, description),
            fee_leg(transaction),
        ])
    }
}
