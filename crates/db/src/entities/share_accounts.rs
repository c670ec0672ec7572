//! `SeaORM` Entity for share_accounts table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "share_accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub share_units: i64,
    pub total_value: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::share_certificates::Entity")]
    ShareCertificates,
}

impl Related<super::share_certificates::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ShareCertificates.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
