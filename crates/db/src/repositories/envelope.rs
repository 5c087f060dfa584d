//! Envelope repository.

use budgetgate_core::envelope::{Envelope, EnvelopeRepository};
use budgetgate_core::{EngineError, SegmentCombination};
use budgetgate_shared::types::{EnvelopeId, FiscalYear};
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};

use super::convert::{StoreError, combination_from_row, db_err, fiscal_year_from_row, utc};
use crate::entities::envelopes;

/// Envelopes backed by PostgreSQL.
///
/// Combinations are stored twice: `combination_key` for exact-match lookups
/// and uniqueness, `combination` as JSONB for reading them back.
#[derive(Debug, Clone)]
pub struct PgEnvelopeRepository {
    db: DatabaseConnection,
}

impl PgEnvelopeRepository {
    /// Creates a new envelope repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn into_envelope(model: envelopes::Model) -> Result<Envelope, StoreError> {
    Ok(Envelope {
        id: EnvelopeId::from_uuid(model.id),
        combination: combination_from_row("envelopes", model.id, model.combination)?,
        fiscal_year: fiscal_year_from_row("envelopes", model.id, &model.fiscal_year)?,
        envelope_amount: model.envelope_amount,
        is_active: model.is_active,
        description: model.description,
        created_at: utc(model.created_at),
        updated_at: utc(model.updated_at),
    })
}

impl EnvelopeRepository for PgEnvelopeRepository {
    async fn find_exact(
        &self,
        combination: &SegmentCombination,
        fiscal_year: &FiscalYear,
    ) -> Result<Option<Envelope>, EngineError> {
        let model = envelopes::Entity::find()
            .filter(envelopes::Column::CombinationKey.eq(combination.canonical_key()))
            .filter(envelopes::Column::FiscalYear.eq(fiscal_year.as_str()))
            .filter(envelopes::Column::IsActive.eq(true))
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(into_envelope).transpose()?)
    }

    async fn find_by_id(&self, id: EnvelopeId) -> Result<Option<Envelope>, EngineError> {
        let model = envelopes::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(into_envelope).transpose()?)
    }

    async fn save(&self, envelope: &Envelope) -> Result<Envelope, EngineError> {
        let model = envelopes::ActiveModel {
            id: Set(envelope.id.into_inner()),
            combination_key: Set(envelope.combination.canonical_key()),
            combination: Set(envelope.combination.to_json()),
            fiscal_year: Set(envelope.fiscal_year.as_str().to_string()),
            envelope_amount: Set(envelope.envelope_amount),
            is_active: Set(envelope.is_active),
            description: Set(envelope.description.clone()),
            created_at: Set(envelope.created_at.into()),
            updated_at: Set(envelope.updated_at.into()),
        };

        let result = envelopes::Entity::insert(model)
            .on_conflict(
                OnConflict::column(envelopes::Column::Id)
                    .update_columns([
                        envelopes::Column::EnvelopeAmount,
                        envelopes::Column::IsActive,
                        envelopes::Column::Description,
                        envelopes::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_with_returning(&self.db)
            .await
            .map_err(StoreError::from);

        match result {
            Ok(model) => Ok(into_envelope(model)?),
            // The partial unique index caught a concurrent create.
            Err(err) if err.is_unique_violation() => Err(EngineError::DuplicateEnvelope {
                combination: envelope.combination.canonical_key(),
                fiscal_year: envelope.fiscal_year.clone(),
            }),
            Err(err) => Err(err.into()),
        }
    }

    async fn delete(&self, id: EnvelopeId) -> Result<bool, EngineError> {
        let result = envelopes::Entity::delete_by_id(id.into_inner())
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected > 0)
    }

    async fn list_by_fiscal_year(
        &self,
        fiscal_year: &FiscalYear,
    ) -> Result<Vec<Envelope>, EngineError> {
        let models = envelopes::Entity::find()
            .filter(envelopes::Column::FiscalYear.eq(fiscal_year.as_str()))
            .order_by_asc(envelopes::Column::CombinationKey)
            .order_by_asc(envelopes::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models
            .into_iter()
            .map(into_envelope)
            .collect::<Result<Vec<_>, _>>()?)
    }
}
