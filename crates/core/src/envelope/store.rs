//! Exact-match envelope storage and CRUD rules.

use std::future::Future;
use std::sync::Arc;

use budgetgate_shared::types::{EnvelopeId, FiscalYear};
use chrono::Utc;
use rust_decimal::Decimal;
use tracing::info;

use super::types::{CreateEnvelopeInput, Envelope, UpdateEnvelopeInput};
use crate::error::EngineError;
use crate::segment::SegmentCombination;

/// Repository trait for envelope persistence.
///
/// This trait is implemented by the db crate to provide actual database operations.
pub trait EnvelopeRepository: Send + Sync {
    /// Finds the active envelope whose combination equals `combination` exactly.
    fn find_exact(
        &self,
        combination: &SegmentCombination,
        fiscal_year: &FiscalYear,
    ) -> impl Future<Output = Result<Option<Envelope>, EngineError>> + Send;

    /// Finds an envelope by ID, active or not.
    fn find_by_id(
        &self,
        id: EnvelopeId,
    ) -> impl Future<Output = Result<Option<Envelope>, EngineError>> + Send;

    /// Inserts or replaces an envelope by ID.
    fn save(
        &self,
        envelope: &Envelope,
    ) -> impl Future<Output = Result<Envelope, EngineError>> + Send;

    /// Hard-deletes an envelope. Returns false if it did not exist.
    fn delete(&self, id: EnvelopeId) -> impl Future<Output = Result<bool, EngineError>> + Send;

    /// Lists every envelope of a fiscal year.
    fn list_by_fiscal_year(
        &self,
        fiscal_year: &FiscalYear,
    ) -> impl Future<Output = Result<Vec<Envelope>, EngineError>> + Send;
}

/// Envelope CRUD with uniqueness and amount rules.
pub struct EnvelopeStore<R: EnvelopeRepository> {
    repo: Arc<R>,
}

impl<R: EnvelopeRepository> EnvelopeStore<R> {
    /// Creates a new envelope store.
    #[must_use]
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Exact-match lookup of the active envelope.
    pub async fn find_exact(
        &self,
        combination: &SegmentCombination,
        fiscal_year: &FiscalYear,
    ) -> Result<Option<Envelope>, EngineError> {
        self.repo.find_exact(combination, fiscal_year).await
    }

    /// Finds an envelope by ID.
    pub async fn get(&self, id: EnvelopeId) -> Result<Option<Envelope>, EngineError> {
        self.repo.find_by_id(id).await
    }

    /// Lists envelopes of a fiscal year.
    pub async fn list(&self, fiscal_year: &FiscalYear) -> Result<Vec<Envelope>, EngineError> {
        self.repo.list_by_fiscal_year(fiscal_year).await
    }

    /// Creates a new active envelope.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The amount is negative
    /// - An active envelope already exists for the combination and year
    pub async fn create(&self, input: CreateEnvelopeInput) -> Result<Envelope, EngineError> {
        validate_amount(input.envelope_amount)?;
        self.ensure_no_active_duplicate(&input.combination, &input.fiscal_year, None)
            .await?;

        let now = Utc::now();
        let envelope = Envelope {
            id: EnvelopeId::new(),
            combination: input.combination,
            fiscal_year: input.fiscal_year,
            envelope_amount: input.envelope_amount,
            is_active: true,
            description: input.description,
            created_at: now,
            updated_at: now,
        };

        let saved = self.repo.save(&envelope).await?;
        info!(
            envelope_id = %saved.id,
            combination = %saved.combination,
            fiscal_year = %saved.fiscal_year,
            amount = %saved.envelope_amount,
            "Envelope created"
        );
        Ok(saved)
    }

    /// Updates amount, description or active flag.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The envelope does not exist
    /// - The new amount is negative
    /// - Reactivating would create a second active envelope
    pub async fn update(
        &self,
        id: EnvelopeId,
        input: UpdateEnvelopeInput,
    ) -> Result<Envelope, EngineError> {
        let mut envelope = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or(EngineError::EnvelopeNotFound(id))?;

        if let Some(amount) = input.envelope_amount {
            validate_amount(amount)?;
            envelope.envelope_amount = amount;
        }
        if let Some(description) = input.description {
            envelope.description = description;
        }
        if let Some(is_active) = input.is_active {
            if is_active && !envelope.is_active {
                self.ensure_no_active_duplicate(&envelope.combination, &envelope.fiscal_year, Some(id))
                    .await?;
            }
            envelope.is_active = is_active;
        }
        envelope.updated_at = Utc::now();

        let saved = self.repo.save(&envelope).await?;
        info!(envelope_id = %saved.id, amount = %saved.envelope_amount, active = saved.is_active, "Envelope updated");
        Ok(saved)
    }

    /// Soft-deletes an envelope by deactivating it.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::EnvelopeNotFound` if the envelope does not exist.
    pub async fn deactivate(&self, id: EnvelopeId) -> Result<Envelope, EngineError> {
        self.update(
            id,
            UpdateEnvelopeInput {
                is_active: Some(false),
                ..UpdateEnvelopeInput::default()
            },
        )
        .await
    }

    /// Hard-deletes an envelope.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::EnvelopeNotFound` if the envelope does not exist.
    pub async fn delete(&self, id: EnvelopeId) -> Result<(), EngineError> {
        if !self.repo.delete(id).await? {
            return Err(EngineError::EnvelopeNotFound(id));
        }
        info!(envelope_id = %id, "Envelope deleted");
        Ok(())
    }

    async fn ensure_no_active_duplicate(
        &self,
        combination: &SegmentCombination,
        fiscal_year: &FiscalYear,
        except: Option<EnvelopeId>,
    ) -> Result<(), EngineError> {
        match self.repo.find_exact(combination, fiscal_year).await? {
            Some(existing) if Some(existing.id) != except => Err(EngineError::DuplicateEnvelope {
                combination: combination.canonical_key(),
                fiscal_year: fiscal_year.clone(),
            }),
            _ => Ok(()),
        }
    }
}

fn validate_amount(amount: Decimal) -> Result<(), EngineError> {
    if amount < Decimal::ZERO {
        return Err(EngineError::NegativeAmount(amount));
    }
    Ok(())
}
