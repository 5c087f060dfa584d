//! Segment type identifiers and fiscal year labels.
//!
//! A segment type is one dimension of the chart of accounts (Entity, Account,
//! Project, ...). It is addressed by a small positive integer which is wrapped
//! here so it cannot be mixed up with arbitrary integers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when parsing segment type ids or fiscal year labels.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SegmentValueError {
    /// Segment type ids start at 1.
    #[error("segment type id must be positive, got {0}")]
    NonPositiveTypeId(i32),

    /// The segment type id is not an integer.
    #[error("segment type id is not an integer: '{0}'")]
    UnparsableTypeId(String),

    /// Fiscal year labels cannot be blank.
    #[error("fiscal year label cannot be empty")]
    EmptyFiscalYear,
}

/// Identifier of a segment type (one chart-of-accounts dimension).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct SegmentTypeId(i32);

impl SegmentTypeId {
    /// Creates a segment type id, rejecting zero and negative values.
    ///
    /// # Errors
    ///
    /// Returns `SegmentValueError::NonPositiveTypeId` for values below 1.
    pub const fn new(value: i32) -> Result<Self, SegmentValueError> {
        if value <= 0 {
            return Err(SegmentValueError::NonPositiveTypeId(value));
        }
        Ok(Self(value))
    }

    /// Returns the raw integer value.
    #[must_use]
    pub const fn get(self) -> i32 {
        self.0
    }
}

impl TryFrom<i32> for SegmentTypeId {
    type Error = SegmentValueError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SegmentTypeId> for i32 {
    fn from(id: SegmentTypeId) -> Self {
        id.0
    }
}

impl fmt::Display for SegmentTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SegmentTypeId {
    type Err = SegmentValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: i32 = s
            .trim()
            .parse()
            .map_err(|_| SegmentValueError::UnparsableTypeId(s.to_string()))?;
        Self::new(value)
    }
}

/// Fiscal year label such as `FY2025`.
///
/// Envelopes, limits and ledger legs are all scoped to one fiscal year.
/// Limit counters reset only by starting a new label.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FiscalYear(String);

impl FiscalYear {
    /// Creates a fiscal year label, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns `SegmentValueError::EmptyFiscalYear` for blank labels.
    pub fn new(label: impl Into<String>) -> Result<Self, SegmentValueError> {
        let label = label.into();
        let trimmed = label.trim();
        if trimmed.is_empty() {
            return Err(SegmentValueError::EmptyFiscalYear);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the label.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for FiscalYear {
    type Error = SegmentValueError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<FiscalYear> for String {
    fn from(year: FiscalYear) -> Self {
        year.0
    }
}

impl AsRef<str> for FiscalYear {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FiscalYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for FiscalYear {
    type Err = SegmentValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}
