//! Balance check result.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::envelope::EnvelopeSource;
use crate::segment::SegmentCombination;

/// Result of checking whether a combination can fund an amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceCheck {
    /// An envelope governs the combination.
    pub available: bool,
    /// The remaining balance covers the required amount.
    pub sufficient: bool,
    /// Ceiling of the governing envelope.
    pub envelope_amount: Option<Decimal>,
    /// Consumed against the envelope-owning combination.
    pub consumed_amount: Decimal,
    /// `envelope_amount - consumed_amount`.
    pub remaining_balance: Option<Decimal>,
    /// Amount the caller asked for.
    pub required_amount: Decimal,
    /// Where the envelope came from.
    pub envelope_source: EnvelopeSource,
    /// Combination that owns the envelope.
    pub matched_combination: Option<SegmentCombination>,
    /// Why the check failed, if it did.
    pub reason: Option<String>,
}

impl BalanceCheck {
    /// Shortfall between required and remaining, zero when sufficient.
    #[must_use]
    pub fn shortfall(&self) -> Decimal {
        match self.remaining_balance {
            Some(remaining) if remaining < self.required_amount => self.required_amount - remaining,
            Some(_) => Decimal::ZERO,
            None => self.required_amount,
        }
    }
}
