//! `SeaORM` Entity for segment_values table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "segment_values")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub segment_type_id: i32,
    pub code: String,
    pub parent_code: Option<String>,
    pub name: Option<String>,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::segment_types::Entity",
        from = "Column::SegmentTypeId",
        to = "super::segment_types::Column::Id"
    )]
    SegmentTypes,
}

impl Related<super::segment_types::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SegmentTypes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
