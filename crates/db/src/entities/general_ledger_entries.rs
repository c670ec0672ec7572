//! `SeaORM` Entity for general_ledger_entries table.
//!
//! Rows are append-only; a trigger in the schema rejects updates and deletes.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "general_ledger_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub transaction_ref: String,
    pub transaction_id: Uuid,
    pub transaction_date: Date,
    pub account_code: String,
    pub account_name: String,
    pub account_type: String,
    pub debit_amount: Decimal,
    pub credit_amount: Decimal,
    pub description: String,
    pub reference_type: String,
    pub reference_id: String,
    pub member_id: Uuid,
    pub batch_id: Uuid,
    pub status: String,
    pub posted_by: Uuid,
    pub posted_at: DateTimeWithTimeZone,
    pub entry_order: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::transactions::Entity",
        from = "Column::TransactionId",
        to = "super::transactions::Column::Id"
    )]
    Transactions,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
