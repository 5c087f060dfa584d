//! Transfer limit checks and usage recording.

use std::future::Future;
use std::sync::Arc;

use budgetgate_shared::types::{FiscalYear, TransferLimitId};
use chrono::Utc;
use tracing::{debug, info, warn};

use super::types::{
    CreateTransferLimitInput, LimitDecision, TransferLimit, TransferValidation,
    UpdateTransferLimitInput, UsageCounts, UsageField, UsageOutcome,
};
use crate::error::EngineError;
use crate::segment::SegmentCombination;

/// Repository trait for transfer limit persistence.
///
/// Counters are only ever changed through the conditional increments, which
/// must be atomic at the store: read-modify-write from the caller is not
/// allowed.
pub trait TransferLimitRepository: Send + Sync {
    /// Finds the limit record for exactly `combination`.
    fn find_exact(
        &self,
        combination: &SegmentCombination,
        fiscal_year: &FiscalYear,
    ) -> impl Future<Output = Result<Option<TransferLimit>, EngineError>> + Send;

    /// Finds a limit record by ID.
    fn find_by_id(
        &self,
        id: TransferLimitId,
    ) -> impl Future<Output = Result<Option<TransferLimit>, EngineError>> + Send;

    /// Inserts or replaces the flags and ceilings of a record.
    fn save(
        &self,
        limit: &TransferLimit,
    ) -> impl Future<Output = Result<TransferLimit, EngineError>> + Send;

    /// Hard-deletes a record. Returns false if it did not exist.
    fn delete(
        &self,
        id: TransferLimitId,
    ) -> impl Future<Output = Result<bool, EngineError>> + Send;

    /// Increments one counter if it is below its ceiling.
    ///
    /// Returns the new value, `None` when no record exists, and
    /// `EngineError::CeilingReached` when the ceiling blocks the increment.
    fn atomic_increment(
        &self,
        combination: &SegmentCombination,
        fiscal_year: &FiscalYear,
        field: UsageField,
    ) -> impl Future<Output = Result<Option<i32>, EngineError>> + Send;

    /// Increments `source_count` of `from` and `target_count` of `to`, both
    /// or neither.
    ///
    /// Missing records are skipped. Fails with `EngineError::CeilingReached`
    /// without changing either counter when one ceiling blocks.
    fn atomic_increment_pair(
        &self,
        from: &SegmentCombination,
        to: &SegmentCombination,
        fiscal_year: &FiscalYear,
    ) -> impl Future<Output = Result<UsageCounts, EngineError>> + Send;
}

/// Enforces transfer permissions and usage ceilings.
pub struct TransferLimitValidator<T: TransferLimitRepository> {
    repo: Arc<T>,
}

impl<T: TransferLimitRepository> TransferLimitValidator<T> {
    /// Creates a new validator.
    #[must_use]
    pub fn new(repo: Arc<T>) -> Self {
        Self { repo }
    }

    /// Checks whether `combination` may send funds.
    ///
    /// A combination without a limit record is allowed with no ceiling.
    pub async fn can_be_source(
        &self,
        combination: &SegmentCombination,
        fiscal_year: &FiscalYear,
    ) -> Result<LimitDecision, EngineError> {
        self.decide(combination, fiscal_year, UsageField::Source).await
    }

    /// Checks whether `combination` may receive funds.
    pub async fn can_be_target(
        &self,
        combination: &SegmentCombination,
        fiscal_year: &FiscalYear,
    ) -> Result<LimitDecision, EngineError> {
        self.decide(combination, fiscal_year, UsageField::Target).await
    }

    async fn decide(
        &self,
        combination: &SegmentCombination,
        fiscal_year: &FiscalYear,
        field: UsageField,
    ) -> Result<LimitDecision, EngineError> {
        let Some(limit) = self.repo.find_exact(combination, fiscal_year).await? else {
            return Ok(LimitDecision::unrestricted());
        };

        let decision = evaluate(&limit, field);
        debug!(
            combination = %combination,
            role = field.as_str(),
            allowed = decision.allowed,
            count = decision.count,
            ceiling = ?decision.ceiling,
            "Limit evaluated"
        );
        Ok(decision)
    }

    /// Checks both sides of a proposed transfer.
    pub async fn validate_transfer(
        &self,
        from: &SegmentCombination,
        to: &SegmentCombination,
        fiscal_year: &FiscalYear,
    ) -> Result<TransferValidation, EngineError> {
        let source = self.can_be_source(from, fiscal_year).await?;
        let target = self.can_be_target(to, fiscal_year).await?;

        let mut validation = TransferValidation {
            valid: source.allowed && target.allowed,
            source_allowed: source.allowed,
            target_allowed: target.allowed,
            source,
            target,
            reason: None,
        };
        let reasons = validation.reasons();
        if !reasons.is_empty() {
            validation.reason = Some(reasons.join("; "));
        }
        Ok(validation)
    }

    /// Records a committed transfer against both counters.
    ///
    /// A ceiling reached since the transfer was validated produces a denied
    /// outcome, not an error.
    ///
    /// # Errors
    ///
    /// Returns an error only if the repository fails.
    pub async fn record_usage(
        &self,
        from: &SegmentCombination,
        to: &SegmentCombination,
        fiscal_year: &FiscalYear,
    ) -> Result<UsageOutcome, EngineError> {
        match self.repo.atomic_increment_pair(from, to, fiscal_year).await {
            Ok(counts) => {
                info!(
                    from = %from,
                    to = %to,
                    fiscal_year = %fiscal_year,
                    source_count = ?counts.source_count,
                    target_count = ?counts.target_count,
                    "Transfer usage recorded"
                );
                Ok(UsageOutcome {
                    recorded: true,
                    source_count: counts.source_count,
                    target_count: counts.target_count,
                    reason: None,
                })
            }
            Err(err @ EngineError::CeilingReached { .. }) => {
                warn!(from = %from, to = %to, fiscal_year = %fiscal_year, error = %err, "Transfer usage denied");
                Ok(UsageOutcome {
                    recorded: false,
                    source_count: None,
                    target_count: None,
                    reason: Some(err.to_string()),
                })
            }
            Err(err) => Err(err),
        }
    }

    /// Finds the limit record for exactly `combination`.
    pub async fn find_limit(
        &self,
        combination: &SegmentCombination,
        fiscal_year: &FiscalYear,
    ) -> Result<Option<TransferLimit>, EngineError> {
        self.repo.find_exact(combination, fiscal_year).await
    }

    /// Creates a limit record with zeroed counters.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A ceiling is negative
    /// - A record already exists for the combination and year
    pub async fn create_limit(
        &self,
        input: CreateTransferLimitInput,
    ) -> Result<TransferLimit, EngineError> {
        validate_ceiling(UsageField::Source, input.max_source_transfers, 0)?;
        validate_ceiling(UsageField::Target, input.max_target_transfers, 0)?;

        if self
            .repo
            .find_exact(&input.combination, &input.fiscal_year)
            .await?
            .is_some()
        {
            return Err(EngineError::DuplicateLimit {
                combination: input.combination.canonical_key(),
                fiscal_year: input.fiscal_year,
            });
        }

        let now = Utc::now();
        let limit = TransferLimit {
            id: TransferLimitId::new(),
            combination: input.combination,
            fiscal_year: input.fiscal_year,
            is_transfer_allowed: input.is_transfer_allowed,
            is_allowed_as_source: input.is_allowed_as_source,
            is_allowed_as_target: input.is_allowed_as_target,
            max_source_transfers: input.max_source_transfers,
            max_target_transfers: input.max_target_transfers,
            source_count: 0,
            target_count: 0,
            created_at: now,
            updated_at: now,
        };

        let saved = self.repo.save(&limit).await?;
        info!(limit_id = %saved.id, combination = %saved.combination, fiscal_year = %saved.fiscal_year, "Transfer limit created");
        Ok(saved)
    }

    /// Updates flags and ceilings.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The record does not exist
    /// - A ceiling is negative or below its current counter
    pub async fn update_limit(
        &self,
        id: TransferLimitId,
        input: UpdateTransferLimitInput,
    ) -> Result<TransferLimit, EngineError> {
        let mut limit = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or(EngineError::LimitNotFound(id))?;

        if let Some(allowed) = input.is_transfer_allowed {
            limit.is_transfer_allowed = allowed;
        }
        if let Some(allowed) = input.is_allowed_as_source {
            limit.is_allowed_as_source = allowed;
        }
        if let Some(allowed) = input.is_allowed_as_target {
            limit.is_allowed_as_target = allowed;
        }
        if let Some(max) = input.max_source_transfers {
            validate_ceiling(UsageField::Source, max, limit.source_count)?;
            limit.max_source_transfers = max;
        }
        if let Some(max) = input.max_target_transfers {
            validate_ceiling(UsageField::Target, max, limit.target_count)?;
            limit.max_target_transfers = max;
        }
        limit.updated_at = Utc::now();

        let saved = self.repo.save(&limit).await?;
        info!(limit_id = %saved.id, "Transfer limit updated");
        Ok(saved)
    }

    /// Deletes a limit record.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::LimitNotFound` if the record does not exist.
    pub async fn delete_limit(&self, id: TransferLimitId) -> Result<(), EngineError> {
        if !self.repo.delete(id).await? {
            return Err(EngineError::LimitNotFound(id));
        }
        info!(limit_id = %id, "Transfer limit deleted");
        Ok(())
    }
}

fn evaluate(limit: &TransferLimit, field: UsageField) -> LimitDecision {
    let count = limit.count(field);
    let ceiling = limit.ceiling(field);
    let role_allowed = match field {
        UsageField::Source => limit.is_allowed_as_source,
        UsageField::Target => limit.is_allowed_as_target,
    };

    let reason = if !limit.is_transfer_allowed {
        Some(format!(
            "transfers are not allowed for combination {}",
            limit.combination
        ))
    } else if !role_allowed {
        Some(format!(
            "combination {} is not allowed as {field}",
            limit.combination
        ))
    } else {
        ceiling
            .filter(|max| count >= *max)
            .map(|max| format!("{field} limit reached ({count}/{max})"))
    };

    LimitDecision {
        allowed: reason.is_none(),
        reason,
        count,
        ceiling,
    }
}

fn validate_ceiling(field: UsageField, ceiling: Option<i32>, count: i32) -> Result<(), EngineError> {
    match ceiling {
        Some(ceiling) if ceiling < 0 => Err(EngineError::NegativeCeiling { field, ceiling }),
        Some(ceiling) if ceiling < count => Err(EngineError::CeilingBelowCount {
            field,
            ceiling,
            count,
        }),
        _ => Ok(()),
    }
}
