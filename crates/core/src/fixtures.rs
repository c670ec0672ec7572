//! Shared builders for unit tests.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use sacco_shared::types::{
    AccountId, LoanAccountId, LoanId, MemberId, SavingsAccountId, ShareAccountId, TransactionId,
    UserId,
};
use uuid::Uuid;

use crate::domain::{
    Account, AccountStatus, Accountable, InterestMethod, LoanAccount, Loan, LoanStatus, Member,
    MemberStatus, MembershipStatus, SavingsAccount, SavingsProduct, ShareAccount, Transaction,
    TransactionIntent, TransactionStatus, TransactionType, WalletOperation,
};
use crate::store::InMemoryStore;

/// Processing time used throughout the tests: 2026-01-15 10:00 UTC.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()
}

pub fn today() -> NaiveDate {
    now().date_naive()
}

/// A pending deposit of `amount` with no account and no fee.
pub fn transaction(amount: Decimal) -> Transaction {
    let id = TransactionId::new();
    Transaction {
        id,
        transaction_number: format!("TXN-TEST-{}", Uuid::new_v4().simple()),
        member_id: MemberId::new(),
        account_id: None,
        transaction_type: TransactionType::Deposit,
        wallet_operation: None,
        category: TransactionType::Deposit.category(),
        amount,
        fee_amount: Decimal::ZERO,
        net_amount: amount,
        balance_before: Decimal::ZERO,
        balance_after: Decimal::ZERO,
        status: TransactionStatus::Pending,
        transaction_date: now(),
        related_loan_id: None,
        related_account_id: None,
        description: None,
        processed_by: UserId::new(),
        reversal_reason: None,
        reversed_by: None,
        reversed_at: None,
        metadata: serde_json::Value::Null,
    }
}

fn account(member_id: MemberId, accountable: &Accountable) -> Account {
    let balance = if accountable.is_savings() {
        accountable.balance()
    } else {
        Decimal::ZERO
    };
    Account {
        id: AccountId::new(),
        member_id,
        account_number: format!("ACC-{}", &Uuid::new_v4().simple().to_string()[..8]),
        accountable: accountable.reference(),
        status: AccountStatus::Active,
        minimum_balance: Decimal::ZERO,
        balance,
        last_transaction_date: None,
    }
}

fn savings(product: SavingsProduct, balance: Decimal) -> Accountable {
    Accountable::Savings(SavingsAccount {
        id: SavingsAccountId::new(),
        product,
        balance,
        interest_rate: Decimal::ZERO,
        interest_method: InterestMethod::None,
        interest_earned: Decimal::ZERO,
    })
}

/// An active regular savings account holding `balance`.
pub fn savings_account(member_id: MemberId, balance: Decimal) -> (Account, Accountable) {
    let accountable = savings(SavingsProduct::Regular, balance);
    (account(member_id, &accountable), accountable)
}

/// An active 12-month loan at 12% with the given principal and interest
/// still owed and no penalty.
pub fn active_loan(principal: Decimal, interest: Decimal) -> Loan {
    Loan {
        id: LoanId::new(),
        member_id: MemberId::new(),
        loan_account_id: LoanAccountId::new(),
        loan_product_id: Uuid::new_v4(),
        principal_amount: principal,
        interest_rate: Decimal::from(12),
        total_amount: principal + interest,
        repayment_period_months: 12,
        monthly_payment: Decimal::ZERO,
        status: LoanStatus::Active,
        outstanding_balance: principal + interest,
        principal_balance: principal,
        interest_balance: interest,
        penalty_balance: Decimal::ZERO,
        total_paid: Decimal::ZERO,
        disbursement_date: None,
    }
}

/// An in-memory store seeded with one active, approved member who owns one
/// regular savings account.
pub struct World {
    pub store: InMemoryStore,
    pub member: Member,
    pub savings: Account,
}

impl World {
    pub fn new() -> Self {
        Self::with_balance(Decimal::ZERO)
    }

    pub fn with_balance(balance: Decimal) -> Self {
        let store = InMemoryStore::new();
        let member = Member {
            id: MemberId::new(),
            member_number: "M-0001".to_string(),
            full_name: "Amina Wanjiru".to_string(),
            status: MemberStatus::Active,
            membership_status: MembershipStatus::Approved,
        };
        store.insert_member(member.clone());

        let (savings, accountable) = savings_account(member.id, balance);
        store.insert_account(savings.clone(), accountable);

        Self {
            store,
            member,
            savings,
        }
    }

    /// A deposit intent into the member's savings.
    pub fn deposit(&self, amount: Decimal) -> TransactionIntent {
        self.intent(TransactionType::Deposit, amount)
            .with_account(self.savings.id)
    }

    /// A withdrawal intent from the member's savings.
    pub fn withdrawal(&self, amount: Decimal) -> TransactionIntent {
        self.intent(TransactionType::Withdrawal, amount)
            .with_account(self.savings.id)
    }

    pub fn intent(&self, transaction_type: TransactionType, amount: Decimal) -> TransactionIntent {
        TransactionIntent::new(self.member.id, transaction_type, amount, UserId::new())
    }

    /// A wallet intent against `wallet`.
    pub fn wallet(
        &self,
        wallet: &Account,
        operation: WalletOperation,
        amount: Decimal,
    ) -> TransactionIntent {
        self.intent(TransactionType::Wallet, amount)
            .with_account(wallet.id)
            .with_wallet_operation(operation)
    }

    pub fn add_wallet(&self, balance: Decimal) -> Account {
        let accountable = savings(SavingsProduct::Wallet, balance);
        let account = account(self.member.id, &accountable);
        self.store.insert_account(account.clone(), accountable);
        account
    }

    pub fn add_share_account(&self) -> Account {
        let accountable = Accountable::Share(ShareAccount {
            id: ShareAccountId::new(),
            share_units: 0,
            total_value: Decimal::ZERO,
        });
        let account = account(self.member.id, &accountable);
        self.store.insert_account(account.clone(), accountable);
        account
    }

    /// Seeds a loan owned by the member, with its loan account.
    pub fn add_loan(&self, status: LoanStatus, principal: Decimal, interest: Decimal) -> Loan {
        let accountable = Accountable::Loan(LoanAccount {
            id: LoanAccountId::new(),
            total_disbursed_amount: Decimal::ZERO,
            total_repaid_amount: Decimal::ZERO,
            outstanding_balance: Decimal::ZERO,
        });
        let loan_account = account(self.member.id, &accountable);
        let Accountable::Loan(inner) = &accountable else {
            unreachable!()
        };
        let loan_account_id = inner.id;
        self.store.insert_account(loan_account, accountable);

        let mut loan = active_loan(principal, interest);
        loan.member_id = self.member.id;
        loan.loan_account_id = loan_account_id;
        loan.status = status;
        if status == LoanStatus::Approved {
            loan.outstanding_balance = Decimal::ZERO;
            loan.principal_balance = Decimal::ZERO;
            loan.interest_balance = Decimal::ZERO;
        }
        self.store.insert_loan(loan.clone());
        loan
    }

    pub fn set_member_status(&self, status: MemberStatus) {
        let mut member = self.member.clone();
        member.status = status;
        self.store.insert_member(member);
    }

    pub fn set_savings_status(&self, status: AccountStatus) {
        self.update_savings(|account, _| account.status = status);
    }

    pub fn set_minimum_balance(&self, minimum: Decimal) {
        self.update_savings(|account, _| account.minimum_balance = minimum);
    }

    /// Switches the savings to daily-balance interest at `rate` percent a year.
    pub fn set_interest(&self, rate: Decimal) {
        self.update_savings(|_, accountable| {
            if let Accountable::Savings(savings) = accountable {
                savings.interest_rate = rate;
                savings.interest_method = InterestMethod::DailyBalance;
            }
        });
    }

    /// Committed balance of the member's savings.
    pub fn savings_balance(&self) -> Decimal {
        self.store
            .accountable(self.savings.accountable)
            .unwrap()
            .balance()
    }

    fn update_savings(&self, change: impl FnOnce(&mut Account, &mut Accountable)) {
        let mut account = self.store.account(self.savings.id).unwrap();
        let mut accountable = self.store.accountable(account.accountable).unwrap();
        change(&mut account, &mut accountable);
        self.store.insert_account(account, accountable);
    }
}
