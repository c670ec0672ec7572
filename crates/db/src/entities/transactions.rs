//! `SeaORM` Entity for transactions table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub transaction_number: String,
    pub member_id: Uuid,
    pub account_id: Option<Uuid>,
    pub transaction_type: String,
    pub wallet_operation: Option<String>,
    pub category: String,
    pub amount: Decimal,
    pub fee_amount: Decimal,
    pub net_amount: Decimal,
    pub balance_before: Decimal,
    pub balance_after: Decimal,
    pub status: String,
    pub transaction_date: DateTimeWithTimeZone,
    pub related_loan_id: Option<Uuid>,
    pub related_account_id: Option<Uuid>,
    pub description: Option<String>,
    pub processed_by: Uuid,
    pub reversal_reason: Option<String>,
    pub reversed_by: Option<Uuid>,
    pub reversed_at: Option<DateTimeWithTimeZone>,
    #[sea_orm(column_type = "JsonBinary")]
    pub metadata: Json,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::members::Entity",
        from = "Column::MemberId",
        to = "super::members::Column::Id"
    )]
    Members,
    #[sea_orm(has_many = "super::general_ledger_entries::Entity")]
    GeneralLedgerEntries,
}

impl Related<super::members::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Members.def()
    }
}

impl Related<super::general_ledger_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GeneralLedgerEntries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
