//! Authorization decision.

use serde::{Deserialize, Serialize};

use crate::balance::BalanceCheck;
use crate::limit::TransferValidation;
use crate::segment::SegmentCombination;

/// Outcome of authorizing a proposed transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationDecision {
    /// The transfer may proceed.
    pub allowed: bool,
    /// Every reason the transfer was denied, in check order.
    pub reasons: Vec<String>,
    /// Source combination after mapping.
    pub effective_from: SegmentCombination,
    /// Destination combination after mapping.
    pub effective_to: SegmentCombination,
    /// Limit check, when it ran.
    pub limits: Option<TransferValidation>,
    /// Source balance check, when it ran.
    pub balance: Option<BalanceCheck>,
}

impl AuthorizationDecision {
    /// First denial reason, if any.
    #[must_use]
    pub fn primary_reason(&self) -> Option<&str> {
        self.reasons.first().map(String::as_str)
    }
}
