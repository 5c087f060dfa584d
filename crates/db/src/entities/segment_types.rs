//! `SeaORM` Entity for segment_types table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "segment_types")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,
    pub name: String,
    pub is_hierarchical: bool,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::segment_values::Entity")]
    SegmentValues,
}

impl Related<super::segment_values::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SegmentValues.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
