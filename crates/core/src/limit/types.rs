//! Transfer limit data types.

use std::fmt;

use budgetgate_shared::types::{FiscalYear, TransferLimitId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::segment::SegmentCombination;

/// Which side of a transfer a counter tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageField {
    /// Transfers out of the combination.
    Source,
    /// Transfers into the combination.
    Target,
}

impl UsageField {
    /// Returns the label used in reasons and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Target => "target",
        }
    }
}

impl fmt::Display for UsageField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Permission flags and usage counters for a combination and fiscal year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferLimit {
    /// Limit ID.
    pub id: TransferLimitId,
    /// Combination the limit applies to.
    pub combination: SegmentCombination,
    /// Fiscal year label.
    pub fiscal_year: FiscalYear,
    /// Master switch for any transfer touching the combination.
    pub is_transfer_allowed: bool,
    /// May send funds.
    pub is_allowed_as_source: bool,
    /// May receive funds.
    pub is_allowed_as_target: bool,
    /// Ceiling on outgoing transfers, `None` for unlimited.
    pub max_source_transfers: Option<i32>,
    /// Ceiling on incoming transfers, `None` for unlimited.
    pub max_target_transfers: Option<i32>,
    /// Outgoing transfers recorded so far.
    pub source_count: i32,
    /// Incoming transfers recorded so far.
    pub target_count: i32,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl TransferLimit {
    /// Counter for `field`.
    #[must_use]
    pub const fn count(&self, field: UsageField) -> i32 {
        match field {
            UsageField::Source => self.source_count,
            UsageField::Target => self.target_count,
        }
    }

    /// Ceiling for `field`.
    #[must_use]
    pub const fn ceiling(&self, field: UsageField) -> Option<i32> {
        match field {
            UsageField::Source => self.max_source_transfers,
            UsageField::Target => self.max_target_transfers,
        }
    }

    /// True when the counter for `field` has hit its ceiling.
    #[must_use]
    pub fn is_exhausted(&self, field: UsageField) -> bool {
        self.ceiling(field).is_some_and(|max| self.count(field) >= max)
    }

    /// Increments the counter for `field`.
    pub fn bump(&mut self, field: UsageField) -> i32 {
        match field {
            UsageField::Source => {
                self.source_count += 1;
                self.source_count
            }
            UsageField::Target => {
                self.target_count += 1;
                self.target_count
            }
        }
    }
}

/// Answer to "may this combination act as source (or target)?".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitDecision {
    /// The combination may take this role.
    pub allowed: bool,
    /// Why not, when not allowed.
    pub reason: Option<String>,
    /// Current counter, zero when no limit record exists.
    pub count: i32,
    /// Configured ceiling, if any.
    pub ceiling: Option<i32>,
}

impl LimitDecision {
    /// Decision for a combination with no limit record.
    #[must_use]
    pub const fn unrestricted() -> Self {
        Self {
            allowed: true,
            reason: None,
            count: 0,
            ceiling: None,
        }
    }
}

/// Combined source and target decision for a proposed transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferValidation {
    /// Both sides allowed.
    pub valid: bool,
    /// Source side allowed.
    pub source_allowed: bool,
    /// Target side allowed.
    pub target_allowed: bool,
    /// Source side detail.
    pub source: LimitDecision,
    /// Target side detail.
    pub target: LimitDecision,
    /// Failing reasons joined with `"; "`.
    pub reason: Option<String>,
}

impl TransferValidation {
    /// Reasons of every failing side, source first.
    #[must_use]
    pub fn reasons(&self) -> Vec<String> {
        [&self.source.reason, &self.target.reason]
            .into_iter()
            .flatten()
            .cloned()
            .collect()
    }
}

/// Counter values after a pair increment. `None` where no record exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageCounts {
    /// New source counter of the from-combination.
    pub source_count: Option<i32>,
    /// New target counter of the to-combination.
    pub target_count: Option<i32>,
}

/// Result of recording a committed transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageOutcome {
    /// Both counters were incremented.
    pub recorded: bool,
    /// New source counter, if the from-combination has a limit record.
    pub source_count: Option<i32>,
    /// New target counter, if the to-combination has a limit record.
    pub target_count: Option<i32>,
    /// Why nothing was recorded.
    pub reason: Option<String>,
}

/// Input for creating a transfer limit.
#[derive(Debug, Clone)]
pub struct CreateTransferLimitInput {
    /// Combination the limit applies to.
    pub combination: SegmentCombination,
    /// Fiscal year label.
    pub fiscal_year: FiscalYear,
    /// Master switch.
    pub is_transfer_allowed: bool,
    /// May send funds.
    pub is_allowed_as_source: bool,
    /// May receive funds.
    pub is_allowed_as_target: bool,
    /// Outgoing ceiling.
    pub max_source_transfers: Option<i32>,
    /// Incoming ceiling.
    pub max_target_transfers: Option<i32>,
}

impl CreateTransferLimitInput {
    /// Everything allowed, no ceilings.
    #[must_use]
    pub const fn permissive(combination: SegmentCombination, fiscal_year: FiscalYear) -> Self {
        Self {
            combination,
            fiscal_year,
            is_transfer_allowed: true,
            is_allowed_as_source: true,
            is_allowed_as_target: true,
            max_source_transfers: None,
            max_target_transfers: None,
        }
    }
}

/// Input for updating a transfer limit. Counters are never set directly.
#[derive(Debug, Clone, Default)]
pub struct UpdateTransferLimitInput {
    /// Master switch.
    pub is_transfer_allowed: Option<bool>,
    /// May send funds.
    pub is_allowed_as_source: Option<bool>,
    /// May receive funds.
    pub is_allowed_as_target: Option<bool>,
    /// Outgoing ceiling; `Some(None)` removes it.
    pub max_source_transfers: Option<Option<i32>>,
    /// Incoming ceiling; `Some(None)` removes it.
    pub max_target_transfers: Option<Option<i32>>,
}
