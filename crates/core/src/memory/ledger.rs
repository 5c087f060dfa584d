use std::collections::BTreeMap;

use budgetgate_shared::types::{FiscalYear, LedgerEntryId};
use dashmap::DashMap;
use rust_decimal::Decimal;

use crate::consumption::{LedgerEntry, LedgerStatus, TransferLedger};
use crate::error::EngineError;
use crate::segment::SegmentCombination;

/// Transfer legs held in memory.
#[derive(Debug, Default)]
pub struct InMemoryTransferLedger {
    entries: DashMap<LedgerEntryId, LedgerEntry>,
}

impl InMemoryTransferLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a leg.
    pub fn record(&self, entry: LedgerEntry) {
        self.entries.insert(entry.id, entry);
    }

    /// Changes the status of a leg. Returns false if the leg is unknown.
    pub fn set_status(&self, id: LedgerEntryId, status: LedgerStatus) -> bool {
        match self.entries.get_mut(&id) {
            Some(mut entry) => {
                entry.status = status;
                true
            }
            None => false,
        }
    }
}

impl TransferLedger for InMemoryTransferLedger {
    async fn sum_approved_source_amount(
        &self,
        combination: &SegmentCombination,
        fiscal_year: &FiscalYear,
    ) -> Result<Decimal, EngineError> {
        Ok(self
            .entries
            .iter()
            .filter(|entry| entry.consumes(combination, fiscal_year))
            .map(|entry| entry.consumed_amount())
            .sum())
    }

    async fn approved_source_combinations(
        &self,
        fiscal_year: &FiscalYear,
    ) -> Result<Vec<SegmentCombination>, EngineError> {
        let combinations: BTreeMap<String, SegmentCombination> = self
            .entries
            .iter()
            .filter(|entry| entry.consumes(&entry.combination, fiscal_year))
            .map(|entry| (entry.combination.canonical_key(), entry.combination.clone()))
            .collect();
        Ok(combinations.into_values().collect())
    }
}
