//! Row conversion and error mapping shared by the repositories.

use budgetgate_core::{EngineError, SegmentCombination};
use budgetgate_shared::types::FiscalYear;
use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{DbErr, SqlErr};

/// Error types for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A stored row cannot be turned back into a domain value.
    #[error("Corrupt {table} row {id}: {reason}")]
    CorruptRow {
        /// Table name.
        table: &'static str,
        /// Row id.
        id: String,
        /// What was wrong.
        reason: String,
    },

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl StoreError {
    /// True when the error is a unique index violation.
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            Self::Database(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
        )
    }
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        Self::repository(err)
    }
}

/// Maps a `SeaORM` error into an engine error.
pub(crate) fn db_err(err: DbErr) -> EngineError {
    StoreError::from(err).into()
}

pub(crate) fn combination_from_row(
    table: &'static str,
    id: impl ToString,
    value: serde_json::Value,
) -> Result<SegmentCombination, StoreError> {
    SegmentCombination::from_json(value).map_err(|err| StoreError::CorruptRow {
        table,
        id: id.to_string(),
        reason: err.to_string(),
    })
}

pub(crate) fn fiscal_year_from_row(
    table: &'static str,
    id: impl ToString,
    value: &str,
) -> Result<FiscalYear, StoreError> {
    FiscalYear::new(value).map_err(|err| StoreError::CorruptRow {
        table,
        id: id.to_string(),
        reason: err.to_string(),
    })
}

pub(crate) fn utc(value: DateTime<FixedOffset>) -> DateTime<Utc> {
    value.with_timezone(&Utc)
}
