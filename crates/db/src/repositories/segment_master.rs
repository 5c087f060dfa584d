//! Segment master data repository.

use budgetgate_core::EngineError;
use budgetgate_core::segment::SegmentMasterData;
use budgetgate_shared::types::SegmentTypeId;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use super::convert::db_err;
use crate::entities::{segment_types, segment_values};

/// Input for registering a segment value.
#[derive(Debug, Clone)]
pub struct UpsertSegmentValueInput {
    /// Segment type the code belongs to.
    pub segment_type: SegmentTypeId,
    /// Segment code.
    pub code: String,
    /// Parent code within the same type.
    pub parent_code: Option<String>,
    /// Display name.
    pub name: Option<String>,
}

/// Segment types and values backed by PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgSegmentMaster {
    db: DatabaseConnection,
}

impl PgSegmentMaster {
    /// Creates a new segment master repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates or renames a segment type.
    ///
    /// # Errors
    ///
    /// Returns an error if the database write fails.
    pub async fn upsert_type(
        &self,
        segment_type: SegmentTypeId,
        name: &str,
        is_hierarchical: bool,
    ) -> Result<(), DbErr> {
        let model = segment_types::ActiveModel {
            id: Set(segment_type.get()),
            name: Set(name.to_string()),
            is_hierarchical: Set(is_hierarchical),
            created_at: Set(chrono::Utc::now().into()),
        };

        segment_types::Entity::insert(model)
            .on_conflict(
                OnConflict::column(segment_types::Column::Id)
                    .update_columns([
                        segment_types::Column::Name,
                        segment_types::Column::IsHierarchical,
                    ])
                    .to_owned(),
            )
            .exec(&self.db)
            .await?;
        Ok(())
    }

    /// Creates or re-parents a segment value.
    ///
    /// # Errors
    ///
    /// Returns an error if the type does not exist or the write fails.
    pub async fn upsert_value(&self, input: UpsertSegmentValueInput) -> Result<(), DbErr> {
        let model = segment_values::ActiveModel {
            id: Set(Uuid::now_v7()),
            segment_type_id: Set(input.segment_type.get()),
            code: Set(input.code),
            parent_code: Set(input.parent_code),
            name: Set(input.name),
            is_active: Set(true),
            created_at: Set(chrono::Utc::now().into()),
        };

        segment_values::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([
                    segment_values::Column::SegmentTypeId,
                    segment_values::Column::Code,
                ])
                .update_columns([
                    segment_values::Column::ParentCode,
                    segment_values::Column::Name,
                    segment_values::Column::IsActive,
                ])
                .to_owned(),
            )
            .exec(&self.db)
            .await?;
        Ok(())
    }

    /// Lists the values of a segment type ordered by code.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_values(
        &self,
        segment_type: SegmentTypeId,
    ) -> Result<Vec<segment_values::Model>, DbErr> {
        segment_values::Entity::find()
            .filter(segment_values::Column::SegmentTypeId.eq(segment_type.get()))
            .order_by_asc(segment_values::Column::Code)
            .all(&self.db)
            .await
    }
}

impl SegmentMasterData for PgSegmentMaster {
    async fn is_hierarchical(&self, segment_type: SegmentTypeId) -> Result<bool, EngineError> {
        let found = segment_types::Entity::find_by_id(segment_type.get())
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(found.is_some_and(|t| t.is_hierarchical))
    }

    async fn get_parent_code(
        &self,
        segment_type: SegmentTypeId,
        code: &str,
    ) -> Result<Option<String>, EngineError> {
        let value = segment_values::Entity::find()
            .filter(segment_values::Column::SegmentTypeId.eq(segment_type.get()))
            .filter(segment_values::Column::Code.eq(code))
            .filter(segment_values::Column::IsActive.eq(true))
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(value.and_then(|v| v.parent_code))
    }
}
