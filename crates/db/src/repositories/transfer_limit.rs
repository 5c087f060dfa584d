//! Transfer limit repository.
//!
//! Counters only move through conditional `UPDATE ... RETURNING` statements
//! so that the ceiling check and the increment are one atomic step in
//! PostgreSQL.

use budgetgate_core::limit::{TransferLimit, TransferLimitRepository, UsageCounts, UsageField};
use budgetgate_core::{EngineError, SegmentCombination};
use budgetgate_shared::types::{FiscalYear, TransferLimitId};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use tracing::debug;

use super::convert::{StoreError, combination_from_row, db_err, fiscal_year_from_row, utc};
use crate::entities::transfer_limits;

/// Transfer limits backed by PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgTransferLimitRepository {
    db: DatabaseConnection,
}

impl PgTransferLimitRepository {
    /// Creates a new transfer limit repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn into_limit(model: transfer_limits::Model) -> Result<TransferLimit, StoreError> {
    Ok(TransferLimit {
        id: TransferLimitId::from_uuid(model.id),
        combination: combination_from_row("transfer_limits", model.id, model.combination)?,
        fiscal_year: fiscal_year_from_row("transfer_limits", model.id, &model.fiscal_year)?,
        is_transfer_allowed: model.is_transfer_allowed,
        is_allowed_as_source: model.is_allowed_as_source,
        is_allowed_as_target: model.is_allowed_as_target,
        max_source_transfers: model.max_source_transfers,
        max_target_transfers: model.max_target_transfers,
        source_count: model.source_count,
        target_count: model.target_count,
        created_at: utc(model.created_at),
        updated_at: utc(model.updated_at),
    })
}

const fn columns(field: UsageField) -> (transfer_limits::Column, transfer_limits::Column) {
    match field {
        UsageField::Source => (
            transfer_limits::Column::SourceCount,
            transfer_limits::Column::MaxSourceTransfers,
        ),
        UsageField::Target => (
            transfer_limits::Column::TargetCount,
            transfer_limits::Column::MaxTargetTransfers,
        ),
    }
}

async fn find_model<C: ConnectionTrait>(
    conn: &C,
    combination: &SegmentCombination,
    fiscal_year: &FiscalYear,
) -> Result<Option<transfer_limits::Model>, EngineError> {
    transfer_limits::Entity::find()
        .filter(transfer_limits::Column::CombinationKey.eq(combination.canonical_key()))
        .filter(transfer_limits::Column::FiscalYear.eq(fiscal_year.as_str()))
        .one(conn)
        .await
        .map_err(db_err)
}

/// Conditionally increments one counter on `conn`.
///
/// `None` when no record exists; `CeilingReached` when the row exists but
/// the guard rejected the update.
async fn increment<C: ConnectionTrait>(
    conn: &C,
    combination: &SegmentCombination,
    fiscal_year: &FiscalYear,
    field: UsageField,
) -> Result<Option<i32>, EngineError> {
    let (count_col, max_col) = columns(field);

    let updated = transfer_limits::Entity::update_many()
        .col_expr(count_col, Expr::col(count_col).add(1))
        .col_expr(
            transfer_limits::Column::UpdatedAt,
            Expr::current_timestamp().into(),
        )
        .filter(transfer_limits::Column::CombinationKey.eq(combination.canonical_key()))
        .filter(transfer_limits::Column::FiscalYear.eq(fiscal_year.as_str()))
        .filter(
            Condition::any()
                .add(max_col.is_null())
                .add(Expr::col(count_col).lt(Expr::col(max_col))),
        )
        .exec_with_returning(conn)
        .await
        .map_err(db_err)?;

    if let Some(model) = updated.into_iter().next() {
        let count = match field {
            UsageField::Source => model.source_count,
            UsageField::Target => model.target_count,
        };
        return Ok(Some(count));
    }

    match find_model(conn, combination, fiscal_year).await? {
        None => Ok(None),
        Some(model) => {
            let limit = into_limit(model)?;
            let count = limit.count(field);
            Err(EngineError::CeilingReached {
                field,
                count,
                max: limit.ceiling(field).unwrap_or(count),
            })
        }
    }
}

impl TransferLimitRepository for PgTransferLimitRepository {
    async fn find_exact(
        &self,
        combination: &SegmentCombination,
        fiscal_year: &FiscalYear,
    ) -> Result<Option<TransferLimit>, EngineError> {
        let model = find_model(&self.db, combination, fiscal_year).await?;
        Ok(model.map(into_limit).transpose()?)
    }

    async fn find_by_id(&self, id: TransferLimitId) -> Result<Option<TransferLimit>, EngineError> {
        let model = transfer_limits::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(into_limit).transpose()?)
    }

    async fn save(&self, limit: &TransferLimit) -> Result<TransferLimit, EngineError> {
        let model = transfer_limits::ActiveModel {
            id: Set(limit.id.into_inner()),
            combination_key: Set(limit.combination.canonical_key()),
            combination: Set(limit.combination.to_json()),
            fiscal_year: Set(limit.fiscal_year.as_str().to_string()),
            is_transfer_allowed: Set(limit.is_transfer_allowed),
            is_allowed_as_source: Set(limit.is_allowed_as_source),
            is_allowed_as_target: Set(limit.is_allowed_as_target),
            max_source_transfers: Set(limit.max_source_transfers),
            max_target_transfers: Set(limit.max_target_transfers),
            source_count: Set(limit.source_count),
            target_count: Set(limit.target_count),
            created_at: Set(limit.created_at.into()),
            updated_at: Set(limit.updated_at.into()),
        };

        // Counters are left out of the conflict update.
        let result = transfer_limits::Entity::insert(model)
            .on_conflict(
                OnConflict::column(transfer_limits::Column::Id)
                    .update_columns([
                        transfer_limits::Column::IsTransferAllowed,
                        transfer_limits::Column::IsAllowedAsSource,
                        transfer_limits::Column::IsAllowedAsTarget,
                        transfer_limits::Column::MaxSourceTransfers,
                        transfer_limits::Column::MaxTargetTransfers,
                        transfer_limits::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_with_returning(&self.db)
            .await
            .map_err(StoreError::from);

        match result {
            Ok(model) => Ok(into_limit(model)?),
            Err(err) if err.is_unique_violation() => Err(EngineError::DuplicateLimit {
                combination: limit.combination.canonical_key(),
                fiscal_year: limit.fiscal_year.clone(),
            }),
            Err(err) => Err(err.into()),
        }
    }

    async fn delete(&self, id: TransferLimitId) -> Result<bool, EngineError> {
        let result = transfer_limits::Entity::delete_by_id(id.into_inner())
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected > 0)
    }

    async fn atomic_increment(
        &self,
        combination: &SegmentCombination,
        fiscal_year: &FiscalYear,
        field: UsageField,
    ) -> Result<Option<i32>, EngineError> {
        increment(&self.db, combination, fiscal_year, field).await
    }

    async fn atomic_increment_pair(
        &self,
        from: &SegmentCombination,
        to: &SegmentCombination,
        fiscal_year: &FiscalYear,
    ) -> Result<UsageCounts, EngineError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        // Rows are always locked in key order so two opposite transfers
        // cannot deadlock.
        let counts = if from.canonical_key() <= to.canonical_key() {
            let source_count = increment(&txn, from, fiscal_year, UsageField::Source).await?;
            let target_count = increment(&txn, to, fiscal_year, UsageField::Target).await?;
            UsageCounts {
                source_count,
                target_count,
            }
        } else {
            let target_count = increment(&txn, to, fiscal_year, UsageField::Target).await?;
            let source_count = increment(&txn, from, fiscal_year, UsageField::Source).await?;
            UsageCounts {
                source_count,
                target_count,
            }
        };

        txn.commit().await.map_err(db_err)?;
        debug!(from = %from, to = %to, ?counts, "Usage counters incremented");
        Ok(counts)
    }
}
