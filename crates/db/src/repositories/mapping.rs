//! Segment mapping repository.

use budgetgate_core::EngineError;
use budgetgate_core::mapping::{MappingKind, MappingRepository, SegmentMapping};
use budgetgate_shared::types::{SegmentMappingId, SegmentTypeId};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Select, Set};

use super::convert::{StoreError, db_err, utc};
use crate::entities::sea_orm_active_enums::MappingKind as DbMappingKind;
use crate::entities::segment_mappings;

/// Segment mappings backed by PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgMappingRepository {
    db: DatabaseConnection,
}

impl PgMappingRepository {
    /// Creates a new mapping repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn fetch(
        &self,
        query: Select<segment_mappings::Entity>,
    ) -> Result<Vec<SegmentMapping>, EngineError> {
        let models = query
            .filter(segment_mappings::Column::IsActive.eq(true))
            .order_by_asc(segment_mappings::Column::SegmentTypeId)
            .order_by_asc(segment_mappings::Column::SourceCode)
            .order_by_asc(segment_mappings::Column::TargetCode)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models
            .into_iter()
            .map(into_mapping)
            .collect::<Result<Vec<_>, _>>()?)
    }
}

const fn to_db_kind(kind: MappingKind) -> DbMappingKind {
    match kind {
        MappingKind::Consolidation => DbMappingKind::Consolidation,
        MappingKind::Alias => DbMappingKind::Alias,
        MappingKind::ParentChild => DbMappingKind::ParentChild,
        MappingKind::Custom => DbMappingKind::Custom,
    }
}

const fn from_db_kind(kind: DbMappingKind) -> MappingKind {
    match kind {
        DbMappingKind::Consolidation => MappingKind::Consolidation,
        DbMappingKind::Alias => MappingKind::Alias,
        DbMappingKind::ParentChild => MappingKind::ParentChild,
        DbMappingKind::Custom => MappingKind::Custom,
    }
}

fn into_mapping(model: segment_mappings::Model) -> Result<SegmentMapping, StoreError> {
    let segment_type =
        SegmentTypeId::new(model.segment_type_id).map_err(|err| StoreError::CorruptRow {
            table: "segment_mappings",
            id: model.id.to_string(),
            reason: err.to_string(),
        })?;

    Ok(SegmentMapping {
        id: SegmentMappingId::from_uuid(model.id),
        segment_type,
        source_code: model.source_code,
        target_code: model.target_code,
        kind: from_db_kind(model.mapping_kind),
        is_active: model.is_active,
        description: model.description,
        created_at: utc(model.created_at),
    })
}

impl MappingRepository for PgMappingRepository {
    async fn find_forward(
        &self,
        segment_type: SegmentTypeId,
        source_code: &str,
    ) -> Result<Vec<SegmentMapping>, EngineError> {
        self.fetch(
            segment_mappings::Entity::find()
                .filter(segment_mappings::Column::SegmentTypeId.eq(segment_type.get()))
                .filter(segment_mappings::Column::SourceCode.eq(source_code)),
        )
        .await
    }

    async fn find_reverse(
        &self,
        segment_type: SegmentTypeId,
        target_code: &str,
    ) -> Result<Vec<SegmentMapping>, EngineError> {
        self.fetch(
            segment_mappings::Entity::find()
                .filter(segment_mappings::Column::SegmentTypeId.eq(segment_type.get()))
                .filter(segment_mappings::Column::TargetCode.eq(target_code)),
        )
        .await
    }

    async fn insert(&self, mapping: &SegmentMapping) -> Result<SegmentMapping, EngineError> {
        let model = segment_mappings::ActiveModel {
            id: Set(mapping.id.into_inner()),
            segment_type_id: Set(mapping.segment_type.get()),
            source_code: Set(mapping.source_code.clone()),
            target_code: Set(mapping.target_code.clone()),
            mapping_kind: Set(to_db_kind(mapping.kind)),
            is_active: Set(mapping.is_active),
            description: Set(mapping.description.clone()),
            created_at: Set(mapping.created_at.into()),
        };

        match segment_mappings::Entity::insert(model)
            .exec_with_returning(&self.db)
            .await
            .map_err(StoreError::from)
        {
            Ok(saved) => Ok(into_mapping(saved)?),
            Err(err) if err.is_unique_violation() => Err(EngineError::DuplicateMapping {
                segment_type: mapping.segment_type,
                source_code: mapping.source_code.clone(),
                target_code: mapping.target_code.clone(),
            }),
            Err(err) => Err(err.into()),
        }
    }

    async fn delete(&self, id: SegmentMappingId) -> Result<bool, EngineError> {
        let result = segment_mappings::Entity::delete_by_id(id.into_inner())
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected > 0)
    }

    async fn list(
        &self,
        segment_type: Option<SegmentTypeId>,
    ) -> Result<Vec<SegmentMapping>, EngineError> {
        let mut query = segment_mappings::Entity::find();
        if let Some(segment_type) = segment_type {
            query = query.filter(segment_mappings::Column::SegmentTypeId.eq(segment_type.get()));
        }
        self.fetch(query).await
    }
}
