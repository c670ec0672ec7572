//! `SeaORM` Entity for loans table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "loans")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub member_id: Uuid,
    pub loan_account_id: Uuid,
    pub loan_product_id: Uuid,
    pub principal_amount: Decimal,
    pub interest_rate: Decimal,
    pub total_amount: Decimal,
    pub repayment_period_months: i32,
    pub monthly_payment: Decimal,
    pub status: String,
    pub outstanding_balance: Decimal,
    pub principal_balance: Decimal,
    pub interest_balance: Decimal,
    pub penalty_balance: Decimal,
    pub total_paid: Decimal,
    pub disbursement_date: Option<Date>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::members::Entity",
        from = "Column::MemberId",
        to = "super::members::Column::Id"
    )]
    Members,
    #[sea_orm(
        belongs_to = "super::loan_accounts::Entity",
        from = "Column::LoanAccountId",
        to = "super::loan_accounts::Column::Id"
    )]
    LoanAccounts,
    #[sea_orm(has_many = "super::loan_repayments::Entity")]
    LoanRepayments,
}

impl Related<super::members::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Members.def()
    }
}

impl Related<super::loan_accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LoanAccounts.def()
    }
}

impl Related<super::loan_repayments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LoanRepayments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
