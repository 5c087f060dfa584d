use budgetgate_shared::types::{EnvelopeId, FiscalYear};
use dashmap::DashMap;

use crate::envelope::{Envelope, EnvelopeRepository};
use crate::error::EngineError;
use crate::segment::SegmentCombination;

/// Envelopes held in memory, keyed by ID.
#[derive(Debug, Default)]
pub struct InMemoryEnvelopeRepository {
    envelopes: DashMap<EnvelopeId, Envelope>,
}

impl InMemoryEnvelopeRepository {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl EnvelopeRepository for InMemoryEnvelopeRepository {
    async fn find_exact(
        &self,
        combination: &SegmentCombination,
        fiscal_year: &FiscalYear,
    ) -> Result<Option<Envelope>, EngineError> {
        Ok(self
            .envelopes
            .iter()
            .find(|entry| {
                entry.is_active
                    && entry.fiscal_year == *fiscal_year
                    && entry.combination == *combination
            })
            .map(|entry| entry.value().clone()))
    }

    async fn find_by_id(&self, id: EnvelopeId) -> Result<Option<Envelope>, EngineError> {
        Ok(self.envelopes.get(&id).map(|entry| entry.value().clone()))
    }

    async fn save(&self, envelope: &Envelope) -> Result<Envelope, EngineError> {
        self.envelopes.insert(envelope.id, envelope.clone());
        Ok(envelope.clone())
    }

    async fn delete(&self, id: EnvelopeId) -> Result<bool, EngineError> {
        Ok(self.envelopes.remove(&id).is_some())
    }

    async fn list_by_fiscal_year(
        &self,
        fiscal_year: &FiscalYear,
    ) -> Result<Vec<Envelope>, EngineError> {
        let mut envelopes: Vec<Envelope> = self
            .envelopes
            .iter()
            .filter(|entry| entry.fiscal_year == *fiscal_year)
            .map(|entry| entry.value().clone())
            .collect();
        envelopes.sort_by(|a, b| a.combination.cmp(&b.combination));
        Ok(envelopes)
    }
}
