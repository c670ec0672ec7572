//! Account wrappers and their product-specific accountables.
//!
//! An [`Account`] never holds product state itself. It points at exactly one
//! [`Accountable`] through an [`AccountableRef`], and the balance lives on the
//! accountable. Savings accounts additionally mirror their balance onto the
//! legacy `Account::balance` field.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sacco_shared::types::{
    AccountId, LoanAccountId, MemberId, SavingsAccountId, ShareAccountId, ShareCertificateId,
    TransactionId,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status of an account wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    /// Open for transactions.
    Active,
    /// No recent activity; must be reactivated before use.
    Dormant,
    /// Permanently closed.
    Closed,
    /// Frozen by an administrator.
    Suspended,
}

string_enum!(AccountStatus {
    Active => "active",
    Dormant => "dormant",
    Closed => "closed",
    Suspended => "suspended",
});

/// Kind of product behind an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountableType {
    /// Savings or wallet product.
    Savings,
    /// Loan aggregate.
    Loan,
    /// Share capital.
    Share,
}

string_enum!(AccountableType {
    Savings => "savings",
    Loan => "loan",
    Share => "share",
});

/// Tagged reference from an account to its accountable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum AccountableRef {
    /// Savings accountable.
    Savings(SavingsAccountId),
    /// Loan accountable.
    Loan(LoanAccountId),
    /// Share accountable.
    Share(ShareAccountId),
}

impl AccountableRef {
    /// Returns the accountable type tag.
    #[must_use]
    pub const fn kind(&self) -> AccountableType {
        match self {
            Self::Savings(_) => AccountableType::Savings,
            Self::Loan(_) => AccountableType::Loan,
            Self::Share(_) => AccountableType::Share,
        }
    }

    /// Returns the raw accountable id.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        match self {
            Self::Savings(id) => id.0,
            Self::Loan(id) => id.0,
            Self::Share(id) => id.0,
        }
    }

    /// Rebuilds a reference from its stored type tag and id.
    #[must_use]
    pub const fn from_parts(kind: AccountableType, id: Uuid) -> Self {
        match kind {
            AccountableType::Savings => Self::Savings(SavingsAccountId::from_uuid(id)),
            AccountableType::Loan => Self::Loan(LoanAccountId::from_uuid(id)),
            AccountableType::Share => Self::Share(ShareAccountId::from_uuid(id)),
        }
    }
}

/// Generic member account wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier.
    pub id: AccountId,
    /// Owning member.
    pub member_id: MemberId,
    /// Human-readable account number.
    pub account_number: String,
    /// The product entity behind this account.
    pub accountable: AccountableRef,
    /// Current status.
    pub status: AccountStatus,
    /// Balance reserved and never available for withdrawal.
    pub minimum_balance: Decimal,
    /// Denormalized balance, kept in sync for savings accountables.
    pub balance: Decimal,
    /// When the account last had a completed balance movement.
    pub last_transaction_date: Option<DateTime<Utc>>,
}

impl Account {
    /// Returns true if the account accepts transactions.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }
}

/// Savings product variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SavingsProduct {
    /// Ordinary member deposits.
    Regular,
    /// Liquid, fee-light transaction account.
    Wallet,
}

string_enum!(SavingsProduct {
    Regular => "regular",
    Wallet => "wallet",
});

/// Interest accrual method of a savings product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterestMethod {
    /// No interest accrues.
    None,
    /// `balance * rate / 100 / 365` accrues on each balance movement.
    DailyBalance,
}

string_enum!(InterestMethod {
    None => "none",
    DailyBalance => "daily_balance",
});

/// Savings (or wallet) accountable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavingsAccount {
    /// Unique identifier.
    pub id: SavingsAccountId,
    /// Product variant.
    pub product: SavingsProduct,
    /// Current balance.
    pub balance: Decimal,
    /// Annual interest rate in percent.
    pub interest_rate: Decimal,
    /// How interest accrues.
    pub interest_method: InterestMethod,
    /// Interest accrued and not yet paid out.
    pub interest_earned: Decimal,
}

/// Loan aggregate accountable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanAccount {
    /// Unique identifier.
    pub id: LoanAccountId,
    /// Sum of principal ever disbursed.
    pub total_disbursed_amount: Decimal,
    /// Sum of repayments ever received.
    pub total_repaid_amount: Decimal,
    /// Outstanding balance across all loans.
    pub outstanding_balance: Decimal,
}

/// Share capital accountable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareAccount {
    /// Unique identifier.
    pub id: ShareAccountId,
    /// Number of share units held.
    pub share_units: i64,
    /// Paid-up value of the shares.
    pub total_value: Decimal,
}

/// A certificate issued for a share purchase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareCertificate {
    /// Unique identifier.
    pub id: ShareCertificateId,
    /// Share account the units were added to.
    pub share_account_id: ShareAccountId,
    /// Owning member.
    pub member_id: MemberId,
    /// Human-readable certificate number.
    pub certificate_number: String,
    /// Units covered by this certificate.
    pub units: i64,
    /// Amount paid.
    pub amount: Decimal,
    /// Purchase transaction.
    pub transaction_id: TransactionId,
    /// Issue timestamp.
    pub issued_at: DateTime<Utc>,
}

/// The product entity behind an [`Account`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Accountable {
    /// Savings or wallet.
    Savings(SavingsAccount),
    /// Loan aggregate.
    Loan(LoanAccount),
    /// Share capital.
    Share(ShareAccount),
}

impl Accountable {
    /// Returns the tagged reference to this accountable.
    #[must_use]
    pub const fn reference(&self) -> AccountableRef {
        match self {
            Self::Savings(savings) => AccountableRef::Savings(savings.id),
            Self::Loan(loan) => AccountableRef::Loan(loan.id),
            Self::Share(share) => AccountableRef::Share(share.id),
        }
    }

    /// Returns the balance the account's transactions move.
    #[must_use]
    pub const fn balance(&self) -> Decimal {
        match self {
            Self::Savings(savings) => savings.balance,
            Self::Loan(loan) => loan.outstanding_balance,
            Self::Share(share) => share.total_value,
        }
    }

    /// Overwrites the balance the account's transactions move.
    pub fn set_balance(&mut self, balance: Decimal) {
        match self {
            Self::Savings(savings) => savings.balance = balance,
            Self::Loan(loan) => loan.outstanding_balance = balance,
            Self::Share(share) => share.total_value = balance,
        }
    }

    /// Returns the savings accountable, if this is one.
    #[must_use]
    pub const fn as_savings(&self) -> Option<&SavingsAccount> {
        match self {
            Self::Savings(savings) => Some(savings),
            _ => None,
        }
    }

    /// Returns true for savings products, including wallets.
    #[must_use]
    pub const fn is_savings(&self) -> bool {
        matches!(self, Self::Savings(_))
    }

    /// Returns true for wallet products.
    #[must_use]
    pub fn is_wallet(&self) -> bool {
        self.as_savings()
            .is_some_and(|savings| savings.product == SavingsProduct::Wallet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::str::FromStr;

    fn savings(balance: Decimal) -> Accountable {
        Accountable::Savings(SavingsAccount {
            id: SavingsAccountId::new(),
            product: SavingsProduct::Regular,
            balance,
            interest_rate: Decimal::ZERO,
            interest_method: InterestMethod::None,
            interest_earned: Decimal::ZERO,
        })
    }

    #[test]
    fn test_accountable_ref_parts() {
        let id = Uuid::new_v4();
        let reference = AccountableRef::from_parts(AccountableType::Share, id);
        assert_eq!(reference.kind(), AccountableType::Share);
        assert_eq!(reference.id(), id);
        assert_eq!(reference, AccountableRef::Share(ShareAccountId::from_uuid(id)));
    }

    #[test]
    fn test_accountable_balance_per_kind() {
        let mut accountable = savings(dec!(100));
        accountable.set_balance(dec!(250));
        assert_eq!(accountable.balance(), dec!(250));

        let mut loan = Accountable::Loan(LoanAccount {
            id: LoanAccountId::new(),
            total_disbursed_amount: dec!(1000),
            total_repaid_amount: Decimal::ZERO,
            outstanding_balance: dec!(1000),
        });
        loan.set_balance(dec!(400));
        assert_eq!(loan.balance(), dec!(400));
        assert!(!loan.is_savings());
    }

    #[test]
    fn test_wallet_detection() {
        let mut accountable = savings(Decimal::ZERO);
        assert!(!accountable.is_wallet());
        if let Accountable::Savings(inner) = &mut accountable {
            inner.product = SavingsProduct::Wallet;
        }
        assert!(accountable.is_wallet());
    }

    #[test]
    fn test_string_forms() {
        assert_eq!(AccountStatus::Dormant.to_string(), "dormant");
        assert_eq!(
            InterestMethod::from_str("daily_balance").unwrap(),
            InterestMethod::DailyBalance
        );
        assert!(AccountableType::from_str("checking").is_err());
    }
}
