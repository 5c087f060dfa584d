//! Envelope data types.

use budgetgate_shared::types::{EnvelopeId, FiscalYear};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::segment::SegmentCombination;

/// A spending ceiling configured for a combination and fiscal year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Envelope ID.
    pub id: EnvelopeId,
    /// Combination that owns the envelope.
    pub combination: SegmentCombination,
    /// Fiscal year label.
    pub fiscal_year: FiscalYear,
    /// Budget ceiling.
    pub envelope_amount: Decimal,
    /// Inactive envelopes are ignored by lookups (soft delete).
    pub is_active: bool,
    /// Optional description.
    pub description: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Input for creating an envelope.
#[derive(Debug, Clone)]
pub struct CreateEnvelopeInput {
    /// Combination that owns the envelope.
    pub combination: SegmentCombination,
    /// Fiscal year label.
    pub fiscal_year: FiscalYear,
    /// Budget ceiling (must not be negative).
    pub envelope_amount: Decimal,
    /// Optional description.
    pub description: Option<String>,
}

/// Input for updating an envelope.
#[derive(Debug, Clone, Default)]
pub struct UpdateEnvelopeInput {
    /// New ceiling.
    pub envelope_amount: Option<Decimal>,
    /// New description.
    pub description: Option<Option<String>>,
    /// Activate or deactivate.
    pub is_active: Option<bool>,
}

/// Where a resolved envelope came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnvelopeSource {
    /// The combination owns the envelope.
    Exact,
    /// Inherited from an ancestor combination.
    Parent,
    /// No envelope found.
    None,
}

impl EnvelopeSource {
    /// Returns the wire label (`EXACT`, `PARENT`, `NONE`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Exact => "EXACT",
            Self::Parent => "PARENT",
            Self::None => "NONE",
        }
    }
}

/// Outcome of an envelope resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvelopeResolution {
    /// The envelope found, if any.
    pub envelope: Option<Envelope>,
    /// Provenance of the envelope.
    pub source: EnvelopeSource,
    /// Combination that actually owns the envelope.
    pub matched_combination: Option<SegmentCombination>,
    /// Number of exact-match lookups performed.
    pub exact_lookups: usize,
}

impl EnvelopeResolution {
    pub(crate) fn found(envelope: Envelope, source: EnvelopeSource, exact_lookups: usize) -> Self {
        Self {
            matched_combination: Some(envelope.combination.clone()),
            envelope: Some(envelope),
            source,
            exact_lookups,
        }
    }

    pub(crate) const fn not_found(exact_lookups: usize) -> Self {
        Self {
            envelope: None,
            source: EnvelopeSource::None,
            matched_combination: None,
            exact_lookups,
        }
    }

    /// Returns true when an envelope was found.
    #[must_use]
    pub const fn is_found(&self) -> bool {
        self.envelope.is_some()
    }
}
