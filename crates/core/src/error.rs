//! Engine error types.
//!
//! Lookups that simply find nothing return `Option::None` or an explicit
//! result value. Errors are reserved for malformed input, impossible
//! configuration, counter races and store failures.

use budgetgate_shared::types::{
    EnvelopeId, FiscalYear, SegmentMappingId, SegmentTypeId, SegmentValueError, TransferLimitId,
};
use budgetgate_shared::AppError;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::limit::UsageField;

/// Result type alias using `EngineError`.
pub type EngineResult<T> = Result<T, EngineError>;

/// Broad classification of engine errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Impossible or ambiguous configuration.
    Configuration,
    /// A record addressed by id does not exist.
    NotFound,
    /// Malformed input.
    Validation,
    /// A usage ceiling was reached between check and record.
    Concurrency,
    /// The underlying store failed.
    Repository,
}

/// Engine errors.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The combination is malformed.
    #[error("invalid segment combination: {0}")]
    InvalidCombination(String),

    /// A segment type id or fiscal year label is malformed.
    #[error(transparent)]
    InvalidValue(#[from] SegmentValueError),

    /// Amount cannot be negative.
    #[error("amount cannot be negative: {0}")]
    NegativeAmount(Decimal),

    /// Transfer amount must be positive.
    #[error("transfer amount must be positive: {0}")]
    NonPositiveAmount(Decimal),

    /// An active envelope already exists for the combination and year.
    #[error("an active envelope already exists for {combination} in {fiscal_year}")]
    DuplicateEnvelope {
        /// Canonical combination key.
        combination: String,
        /// Fiscal year label.
        fiscal_year: FiscalYear,
    },

    /// A transfer limit already exists for the combination and year.
    #[error("a transfer limit already exists for {combination} in {fiscal_year}")]
    DuplicateLimit {
        /// Canonical combination key.
        combination: String,
        /// Fiscal year label.
        fiscal_year: FiscalYear,
    },

    /// The mapping edge already exists.
    #[error("mapping {source_code} -> {target_code} already exists for segment type {segment_type}")]
    DuplicateMapping {
        /// Segment type of the edge.
        segment_type: SegmentTypeId,
        /// Source code.
        source_code: String,
        /// Target code.
        target_code: String,
    },

    /// A code cannot map to itself.
    #[error("segment code {0} cannot map to itself")]
    SelfMapping(String),

    /// A ceiling was configured below the counter it bounds.
    #[error("{field} ceiling {ceiling} is below the current count {count}")]
    CeilingBelowCount {
        /// Which counter.
        field: UsageField,
        /// Requested ceiling.
        ceiling: i32,
        /// Current counter value.
        count: i32,
    },

    /// Ceilings cannot be negative.
    #[error("{field} ceiling cannot be negative: {ceiling}")]
    NegativeCeiling {
        /// Which counter.
        field: UsageField,
        /// Requested ceiling.
        ceiling: i32,
    },

    /// The segment type is not configured as hierarchical.
    #[error("segment type {0} is not hierarchical")]
    NotHierarchical(SegmentTypeId),

    /// A parent chain loops back on itself.
    #[error("segment hierarchy cycle detected for type {segment_type} at code {code}")]
    HierarchyCycle {
        /// Segment type whose chain loops.
        segment_type: SegmentTypeId,
        /// Code seen twice.
        code: String,
    },

    /// A parent chain is deeper than the configured guard.
    #[error("segment hierarchy exceeds the maximum depth of {max_depth} levels")]
    HierarchyTooDeep {
        /// Configured maximum depth.
        max_depth: usize,
    },

    /// A source code maps to more than one target.
    #[error("mapping ambiguous: code {code} maps to both {}", .targets.join(" and "))]
    AmbiguousMapping {
        /// Segment type of the code.
        segment_type: SegmentTypeId,
        /// Source code.
        code: String,
        /// Every configured target.
        targets: Vec<String>,
    },

    /// Envelope not found.
    #[error("envelope not found: {0}")]
    EnvelopeNotFound(EnvelopeId),

    /// Transfer limit not found.
    #[error("transfer limit not found: {0}")]
    LimitNotFound(TransferLimitId),

    /// Segment mapping not found.
    #[error("segment mapping not found: {0}")]
    MappingNotFound(SegmentMappingId),

    /// The counter reached its ceiling before the increment landed.
    #[error("{field} limit reached ({count}/{max})")]
    CeilingReached {
        /// Which counter.
        field: UsageField,
        /// Counter value at the time of the attempt.
        count: i32,
        /// Configured ceiling.
        max: i32,
    },

    /// Repository operation failed.
    #[error("repository error: {0}")]
    Repository(String),
}

impl EngineError {
    /// Returns the error classification.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidCombination(_)
            | Self::InvalidValue(_)
            | Self::NegativeAmount(_)
            | Self::NonPositiveAmount(_)
            | Self::DuplicateEnvelope { .. }
            | Self::DuplicateLimit { .. }
            | Self::DuplicateMapping { .. }
            | Self::SelfMapping(_)
            | Self::CeilingBelowCount { .. }
            | Self::NegativeCeiling { .. } => ErrorKind::Validation,
            Self::NotHierarchical(_)
            | Self::HierarchyCycle { .. }
            | Self::HierarchyTooDeep { .. }
            | Self::AmbiguousMapping { .. } => ErrorKind::Configuration,
            Self::EnvelopeNotFound(_) | Self::LimitNotFound(_) | Self::MappingNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::CeilingReached { .. } => ErrorKind::Concurrency,
            Self::Repository(_) => ErrorKind::Repository,
        }
    }

    /// Creates a repository error from any displayable store failure.
    pub fn repository(err: impl std::fmt::Display) -> Self {
        Self::Repository(err.to_string())
    }
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        let message = err.to_string();
        match err {
            EngineError::DuplicateEnvelope { .. }
            | EngineError::DuplicateLimit { .. }
            | EngineError::DuplicateMapping { .. }
            | EngineError::CeilingReached { .. } => Self::Conflict(message),
            EngineError::Repository(_) => Self::Database(message),
            other => match other.kind() {
                ErrorKind::Configuration => Self::Configuration(message),
                ErrorKind::NotFound => Self::NotFound(message),
                ErrorKind::Validation => Self::Validation(message),
                ErrorKind::Concurrency => Self::Conflict(message),
                ErrorKind::Repository => Self::Database(message),
            },
        }
    }
}
