//! Initial database migration.
//!
//! Creates the member, account, transaction, general ledger, loan, and
//! sequence tables together with the ledger immutability trigger and the
//! trial balance view.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: MEMBERS & ACCOUNTS
        // ============================================================
        db.execute_unprepared(MEMBERS_SQL).await?;
        db.execute_unprepared(ACCOUNTABLES_SQL).await?;
        db.execute_unprepared(ACCOUNTS_SQL).await?;

        // ============================================================
        // PART 2: LOANS
        // ============================================================
        db.execute_unprepared(LOANS_SQL).await?;

        // ============================================================
        // PART 3: TRANSACTIONS & GENERAL LEDGER
        // ============================================================
        db.execute_unprepared(TRANSACTIONS_SQL).await?;
        db.execute_unprepared(GENERAL_LEDGER_SQL).await?;
        db.execute_unprepared(LOAN_REPAYMENTS_SQL).await?;
        db.execute_unprepared(SHARE_CERTIFICATES_SQL).await?;
        db.execute_unprepared(SEQUENCES_SQL).await?;

        // ============================================================
        // PART 4: TRIGGERS & VIEWS
        // ============================================================
        db.execute_unprepared(TRIGGERS_SQL).await?;
        db.execute_unprepared(VIEWS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const MEMBERS_SQL: &str = r"
CREATE TABLE members (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    member_number VARCHAR(50) NOT NULL UNIQUE,
    full_name VARCHAR(255) NOT NULL,
    status VARCHAR(20) NOT NULL DEFAULT 'pending'
        CHECK (status IN ('pending', 'active', 'suspended', 'exited')),
    membership_status VARCHAR(20) NOT NULL DEFAULT 'pending'
        CHECK (membership_status IN ('pending', 'approved', 'rejected')),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
";

const ACCOUNTABLES_SQL: &str = r"
CREATE TABLE savings_accounts (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    product VARCHAR(20) NOT NULL DEFAULT 'regular'
        CHECK (product IN ('regular', 'wallet')),
    balance NUMERIC(19, 4) NOT NULL DEFAULT 0,
    interest_rate NUMERIC(9, 4) NOT NULL DEFAULT 0,
    interest_method VARCHAR(20) NOT NULL DEFAULT 'none'
        CHECK (interest_method IN ('none', 'daily_balance')),
    interest_earned NUMERIC(19, 4) NOT NULL DEFAULT 0
);

CREATE TABLE loan_accounts (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    total_disbursed_amount NUMERIC(19, 4) NOT NULL DEFAULT 0,
    total_repaid_amount NUMERIC(19, 4) NOT NULL DEFAULT 0,
    outstanding_balance NUMERIC(19, 4) NOT NULL DEFAULT 0
);

CREATE TABLE share_accounts (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    share_units BIGINT NOT NULL DEFAULT 0 CHECK (share_units >= 0),
    total_value NUMERIC(19, 4) NOT NULL DEFAULT 0
);
";

const ACCOUNTS_SQL: &str = r"
CREATE TABLE accounts (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    member_id UUID NOT NULL REFERENCES members(id),
    account_number VARCHAR(50) NOT NULL UNIQUE,
    accountable_type VARCHAR(20) NOT NULL
        CHECK (accountable_type IN ('savings', 'loan', 'share')),
    accountable_id UUID NOT NULL,
    status VARCHAR(20) NOT NULL DEFAULT 'active'
        CHECK (status IN ('active', 'dormant', 'closed', 'suspended')),
    minimum_balance NUMERIC(19, 4) NOT NULL DEFAULT 0,
    balance NUMERIC(19, 4) NOT NULL DEFAULT 0,
    last_transaction_date TIMESTAMPTZ,

    UNIQUE (accountable_type, accountable_id)
);

CREATE INDEX idx_accounts_member ON accounts(member_id);
";

const LOANS_SQL: &str = r"
CREATE TABLE loans (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    member_id UUID NOT NULL REFERENCES members(id),
    loan_account_id UUID NOT NULL REFERENCES loan_accounts(id),
    loan_product_id UUID NOT NULL,
    principal_amount NUMERIC(19, 4) NOT NULL CHECK (principal_amount > 0),
    interest_rate NUMERIC(9, 4) NOT NULL DEFAULT 0,
    total_amount NUMERIC(19, 4) NOT NULL DEFAULT 0,
    repayment_period_months INTEGER NOT NULL CHECK (repayment_period_months > 0),
    monthly_payment NUMERIC(19, 4) NOT NULL DEFAULT 0,
    status VARCHAR(20) NOT NULL DEFAULT 'pending'
        CHECK (status IN ('pending', 'approved', 'disbursed', 'active', 'completed', 'rejected')),
    outstanding_balance NUMERIC(19, 4) NOT NULL DEFAULT 0,
    principal_balance NUMERIC(19, 4) NOT NULL DEFAULT 0,
    interest_balance NUMERIC(19, 4) NOT NULL DEFAULT 0,
    penalty_balance NUMERIC(19, 4) NOT NULL DEFAULT 0,
    total_paid NUMERIC(19, 4) NOT NULL DEFAULT 0,
    disbursement_date DATE
);

CREATE INDEX idx_loans_member ON loans(member_id);
";

const TRANSACTIONS_SQL: &str = r"
CREATE TABLE transactions (
    id UUID PRIMARY KEY,
    transaction_number VARCHAR(50) NOT NULL UNIQUE,
    member_id UUID NOT NULL REFERENCES members(id),
    account_id UUID REFERENCES accounts(id),
    transaction_type VARCHAR(30) NOT NULL,
    wallet_operation VARCHAR(20),
    category VARCHAR(20) NOT NULL,
    amount NUMERIC(19, 4) NOT NULL,
    fee_amount NUMERIC(19, 4) NOT NULL DEFAULT 0,
    net_amount NUMERIC(19, 4) NOT NULL,
    balance_before NUMERIC(19, 4) NOT NULL DEFAULT 0,
    balance_after NUMERIC(19, 4) NOT NULL DEFAULT 0,
    status VARCHAR(20) NOT NULL DEFAULT 'pending'
        CHECK (status IN ('pending', 'completed', 'failed', 'reversed')),
    transaction_date TIMESTAMPTZ NOT NULL,
    related_loan_id UUID REFERENCES loans(id),
    related_account_id UUID REFERENCES accounts(id),
    description TEXT,
    processed_by UUID NOT NULL,
    reversal_reason TEXT,
    reversed_by UUID,
    reversed_at TIMESTAMPTZ,
    metadata JSONB NOT NULL DEFAULT '{}'::jsonb
);

CREATE INDEX idx_transactions_member_date ON transactions(member_id, transaction_date);
CREATE INDEX idx_transactions_account_status ON transactions(account_id, status);
";

const GENERAL_LEDGER_SQL: &str = r"
CREATE TABLE general_ledger_entries (
    id UUID PRIMARY KEY,
    transaction_ref VARCHAR(100) NOT NULL UNIQUE,
    transaction_id UUID NOT NULL REFERENCES transactions(id),
    transaction_date DATE NOT NULL,
    account_code VARCHAR(20) NOT NULL,
    account_name VARCHAR(100) NOT NULL,
    account_type VARCHAR(20) NOT NULL
        CHECK (account_type IN ('asset', 'liability', 'equity', 'revenue', 'expense')),
    debit_amount NUMERIC(19, 4) NOT NULL DEFAULT 0 CHECK (debit_amount >= 0),
    credit_amount NUMERIC(19, 4) NOT NULL DEFAULT 0 CHECK (credit_amount >= 0),
    description TEXT NOT NULL,
    reference_type VARCHAR(30) NOT NULL,
    reference_id VARCHAR(100) NOT NULL,
    member_id UUID NOT NULL REFERENCES members(id),
    batch_id UUID NOT NULL,
    status VARCHAR(20) NOT NULL DEFAULT 'posted',
    posted_by UUID NOT NULL,
    posted_at TIMESTAMPTZ NOT NULL,
    entry_order INTEGER NOT NULL,

    CONSTRAINT chk_single_sided CHECK (
        (debit_amount > 0 AND credit_amount = 0) OR
        (credit_amount > 0 AND debit_amount = 0)
    )
);

CREATE INDEX idx_gl_transaction ON general_ledger_entries(transaction_id, entry_order);
CREATE INDEX idx_gl_batch ON general_ledger_entries(batch_id);
CREATE INDEX idx_gl_account_date ON general_ledger_entries(account_code, transaction_date);
";

const LOAN_REPAYMENTS_SQL: &str = r"
CREATE TABLE loan_repayments (
    id UUID PRIMARY KEY,
    loan_id UUID NOT NULL REFERENCES loans(id),
    transaction_id UUID NOT NULL REFERENCES transactions(id),
    amount NUMERIC(19, 4) NOT NULL,
    principal_amount NUMERIC(19, 4) NOT NULL DEFAULT 0,
    interest_amount NUMERIC(19, 4) NOT NULL DEFAULT 0,
    penalty_amount NUMERIC(19, 4) NOT NULL DEFAULT 0,
    balance_after NUMERIC(19, 4) NOT NULL,
    payment_date DATE NOT NULL
);

CREATE INDEX idx_loan_repayments_loan ON loan_repayments(loan_id);
";

const SHARE_CERTIFICATES_SQL: &str = r"
CREATE TABLE share_certificates (
    id UUID PRIMARY KEY,
    share_account_id UUID NOT NULL REFERENCES share_accounts(id),
    member_id UUID NOT NULL REFERENCES members(id),
    certificate_number VARCHAR(50) NOT NULL UNIQUE,
    units BIGINT NOT NULL CHECK (units > 0),
    amount NUMERIC(19, 4) NOT NULL,
    transaction_id UUID NOT NULL REFERENCES transactions(id),
    issued_at TIMESTAMPTZ NOT NULL
);
";

const SEQUENCES_SQL: &str = r"
CREATE TABLE sequences (
    scope VARCHAR(100) PRIMARY KEY,
    value BIGINT NOT NULL
);
";

const TRIGGERS_SQL: &str = r"
-- ============================================================
-- FUNCTION: prevent_ledger_modification
-- Posted general ledger rows are never updated or deleted
-- ============================================================
CREATE OR REPLACE FUNCTION prevent_ledger_modification()
RETURNS TRIGGER AS $$
BEGIN
    RAISE EXCEPTION 'General ledger entries are immutable. Post a reversal instead.';
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_prevent_ledger_mod
BEFORE UPDATE OR DELETE ON general_ledger_entries
FOR EACH ROW
EXECUTE FUNCTION prevent_ledger_modification();
";

const VIEWS_SQL: &str = r"
CREATE VIEW trial_balance_view AS
SELECT
    account_code,
    account_name,
    account_type,
    SUM(debit_amount) AS total_debit,
    SUM(credit_amount) AS total_credit
FROM general_ledger_entries
WHERE status = 'posted'
GROUP BY account_code, account_name, account_type;
";

const DROP_ALL_SQL: &str = r"
DROP VIEW IF EXISTS trial_balance_view CASCADE;

DROP TRIGGER IF EXISTS trg_prevent_ledger_mod ON general_ledger_entries;
DROP FUNCTION IF EXISTS prevent_ledger_modification();

DROP TABLE IF EXISTS sequences CASCADE;
DROP TABLE IF EXISTS share_certificates CASCADE;
DROP TABLE IF EXISTS loan_repayments CASCADE;
DROP TABLE IF EXISTS general_ledger_entries CASCADE;
DROP TABLE IF EXISTS transactions CASCADE;
DROP TABLE IF EXISTS loans CASCADE;
DROP TABLE IF EXISTS accounts CASCADE;
DROP TABLE IF EXISTS share_accounts CASCADE;
DROP TABLE IF EXISTS loan_accounts CASCADE;
DROP TABLE IF EXISTS savings_accounts CASCADE;
DROP TABLE IF EXISTS members CASCADE;
";
