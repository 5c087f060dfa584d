//! Consumed balance calculation.

use std::future::Future;
use std::sync::Arc;

use budgetgate_shared::types::FiscalYear;
use rust_decimal::Decimal;
use tracing::debug;

use crate::error::EngineError;
use crate::segment::SegmentCombination;

/// Read access to previously recorded transfer legs.
///
/// This trait is implemented by the db crate and by [`crate::memory`].
pub trait TransferLedger: Send + Sync {
    /// Sums approved source-leg amounts posted to exactly `combination`.
    fn sum_approved_source_amount(
        &self,
        combination: &SegmentCombination,
        fiscal_year: &FiscalYear,
    ) -> impl Future<Output = Result<Decimal, EngineError>> + Send;

    /// Distinct combinations carrying at least one approved source leg in
    /// `fiscal_year`.
    fn approved_source_combinations(
        &self,
        fiscal_year: &FiscalYear,
    ) -> impl Future<Output = Result<Vec<SegmentCombination>, EngineError>> + Send;
}

/// Computes how much of an envelope has been consumed.
///
/// The calculator works on exact combinations only. Attributing a child's
/// spending to the ancestor envelope it draws on is done by
/// [`crate::balance::BalanceValidator`].
pub struct ConsumedBalanceCalculator<L: TransferLedger> {
    ledger: Arc<L>,
}

impl<L: TransferLedger> ConsumedBalanceCalculator<L> {
    /// Creates a new calculator.
    #[must_use]
    pub fn new(ledger: Arc<L>) -> Self {
        Self { ledger }
    }

    /// Sum of approved source legs for exactly `combination`. Zero when none.
    pub async fn consumed(
        &self,
        combination: &SegmentCombination,
        fiscal_year: &FiscalYear,
    ) -> Result<Decimal, EngineError> {
        let consumed = self
            .ledger
            .sum_approved_source_amount(combination, fiscal_year)
            .await?;
        debug!(combination = %combination, fiscal_year = %fiscal_year, consumed = %consumed, "Consumed balance");
        Ok(consumed)
    }

    /// Combinations that have spent anything in `fiscal_year`.
    pub async fn spenders(
        &self,
        fiscal_year: &FiscalYear,
    ) -> Result<Vec<SegmentCombination>, EngineError> {
        self.ledger.approved_source_combinations(fiscal_year).await
    }
}
