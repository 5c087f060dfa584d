//! Transfer ledger types.

use budgetgate_shared::types::{FiscalYear, LedgerEntryId, TransferId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::segment::SegmentCombination;

/// Which side of a transfer a leg sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegSide {
    /// Funds leaving the combination.
    Source,
    /// Funds arriving at the combination.
    Destination,
}

/// Approval status of the transfer a leg belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerStatus {
    /// Awaiting approval.
    Pending,
    /// Approved and committed.
    Approved,
    /// Rejected; never consumes.
    Rejected,
}

/// One leg of a previously recorded budget transfer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Leg ID.
    pub id: LedgerEntryId,
    /// Transfer the leg belongs to.
    pub transfer_id: TransferId,
    /// Combination the leg posts to.
    pub combination: SegmentCombination,
    /// Fiscal year label.
    pub fiscal_year: FiscalYear,
    /// Signed amount as recorded.
    pub amount: Decimal,
    /// Source or destination.
    pub side: LegSide,
    /// Approval status.
    pub status: LedgerStatus,
    /// When the leg was recorded.
    pub recorded_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Whether this leg consumes the envelope owned by `combination`.
    ///
    /// Only approved source legs posted to exactly that combination consume.
    #[must_use]
    pub fn consumes(&self, combination: &SegmentCombination, fiscal_year: &FiscalYear) -> bool {
        self.side == LegSide::Source
            && self.status == LedgerStatus::Approved
            && self.fiscal_year == *fiscal_year
            && self.combination == *combination
    }

    /// Amount consumed by the leg. Signs vary between feeds, so the
    /// magnitude is used.
    #[must_use]
    pub fn consumed_amount(&self) -> Decimal {
        self.amount.abs()
    }
}
