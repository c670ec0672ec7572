//! `SeaORM` Entity for share_certificates table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "share_certificates")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub share_account_id: Uuid,
    pub member_id: Uuid,
    #[sea_orm(unique)]
    pub certificate_number: String,
    pub units: i64,
    pub amount: Decimal,
    pub transaction_id: Uuid,
    pub issued_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::share_accounts::Entity",
        from = "Column::ShareAccountId",
        to = "super::share_accounts::Column::Id"
    )]
    ShareAccounts,
}

impl Related<super::share_accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ShareAccounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
