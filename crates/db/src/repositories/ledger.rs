//! Transfer ledger repository.

use budgetgate_core::consumption::{LedgerEntry, LedgerStatus, LegSide, TransferLedger};
use budgetgate_core::{EngineError, SegmentCombination};
use budgetgate_shared::types::{FiscalYear, LedgerEntryId};
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbBackend, EntityTrait, FromQueryResult, QueryFilter, Set,
    Statement,
};
use uuid::Uuid;

use super::convert::{combination_from_row, db_err};
use crate::entities::sea_orm_active_enums::{LedgerStatus as DbLedgerStatus, LegSide as DbLegSide};
use crate::entities::transfer_ledger_entries;

const CONSUMED_SQL: &str = r"
SELECT COALESCE(SUM(ABS(amount)), 0) AS consumed
FROM transfer_ledger_entries
WHERE combination_key = $1
  AND fiscal_year = $2
  AND side = 'source'
  AND status = 'approved'
";

const SOURCE_COMBINATIONS_SQL: &str = r"
SELECT DISTINCT ON (combination_key) id, combination
FROM transfer_ledger_entries
WHERE fiscal_year = $1
  AND side = 'source'
  AND status = 'approved'
ORDER BY combination_key, id
";

#[derive(Debug, FromQueryResult)]
struct ConsumedRow {
    consumed: Decimal,
}

#[derive(Debug, FromQueryResult)]
struct SourceCombinationRow {
    id: Uuid,
    combination: serde_json::Value,
}

/// Transfer legs backed by PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgTransferLedger {
    db: DatabaseConnection,
}

impl PgTransferLedger {
    /// Creates a new ledger repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Appends a leg.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn record(&self, entry: &LedgerEntry) -> Result<(), EngineError> {
        let model = transfer_ledger_entries::ActiveModel {
            id: Set(entry.id.into_inner()),
            transfer_id: Set(entry.transfer_id.into_inner()),
            combination_key: Set(entry.combination.canonical_key()),
            combination: Set(entry.combination.to_json()),
            fiscal_year: Set(entry.fiscal_year.as_str().to_string()),
            amount: Set(entry.amount),
            side: Set(match entry.side {
                LegSide::Source => DbLegSide::Source,
                LegSide::Destination => DbLegSide::Destination,
            }),
            status: Set(to_db_status(entry.status)),
            recorded_at: Set(entry.recorded_at.into()),
        };
        transfer_ledger_entries::Entity::insert(model)
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    /// Changes the status of a leg. Returns false if the leg is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn set_status(
        &self,
        id: LedgerEntryId,
        status: LedgerStatus,
    ) -> Result<bool, EngineError> {
        let result = transfer_ledger_entries::Entity::update_many()
            .set(transfer_ledger_entries::ActiveModel {
                status: Set(to_db_status(status)),
                ..Default::default()
            })
            .filter(transfer_ledger_entries::Column::Id.eq(id.into_inner()))
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected > 0)
    }
}

const fn to_db_status(status: LedgerStatus) -> DbLedgerStatus {
    match status {
        LedgerStatus::Pending => DbLedgerStatus::Pending,
        LedgerStatus::Approved => DbLedgerStatus::Approved,
        LedgerStatus::Rejected => DbLedgerStatus::Rejected,
    }
}

impl TransferLedger for PgTransferLedger {
    async fn sum_approved_source_amount(
        &self,
        combination: &SegmentCombination,
        fiscal_year: &FiscalYear,
    ) -> Result<Decimal, EngineError> {
        let row = ConsumedRow::find_by_statement(Statement::from_sql_and_values(
            DbBackend::Postgres,
            CONSUMED_SQL,
            [
                combination.canonical_key().into(),
                fiscal_year.as_str().into(),
            ],
        ))
        .one(&self.db)
        .await
        .map_err(db_err)?;
        Ok(row.map_or(Decimal::ZERO, |r| r.consumed))
    }

    async fn approved_source_combinations(
        &self,
        fiscal_year: &FiscalYear,
    ) -> Result<Vec<SegmentCombination>, EngineError> {
        let rows = SourceCombinationRow::find_by_statement(Statement::from_sql_and_values(
            DbBackend::Postgres,
            SOURCE_COMBINATIONS_SQL,
            [fiscal_year.as_str().into()],
        ))
        .all(&self.db)
        .await
        .map_err(db_err)?;

        rows.into_iter()
            .map(|row| {
                combination_from_row("transfer_ledger_entries", row.id, row.combination)
                    .map_err(EngineError::from)
            })
            .collect()
    }
}
