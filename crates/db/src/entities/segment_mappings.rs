//! `SeaORM` Entity for segment_mappings table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::MappingKind;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "segment_mappings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub segment_type_id: i32,
    pub source_code: String,
    pub target_code: String,
    pub mapping_kind: MappingKind,
    pub is_active: bool,
    pub description: Option<String>,
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
