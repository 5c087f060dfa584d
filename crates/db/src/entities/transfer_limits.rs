//! `SeaORM` Entity for transfer_limits table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "transfer_limits")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub combination_key: String,
    #[sea_orm(column_type = "JsonBinary")]
    pub combination: Json,
    pub fiscal_year: String,
    pub is_transfer_allowed: bool,
    pub is_allowed_as_source: bool,
    pub is_allowed_as_target: bool,
    pub max_source_transfers: Option<i32>,
    pub max_target_transfers: Option<i32>,
    pub source_count: i32,
    pub target_count: i32,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
