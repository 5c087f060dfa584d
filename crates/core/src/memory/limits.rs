use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use budgetgate_shared::types::{FiscalYear, TransferLimitId};

use crate::error::EngineError;
use crate::limit::{TransferLimit, TransferLimitRepository, UsageCounts, UsageField};
use crate::segment::SegmentCombination;

/// Transfer limits held in memory.
///
/// Every operation holds the one lock for its whole duration, so a pair
/// increment either lands on both records or on neither.
#[derive(Debug, Default)]
pub struct InMemoryTransferLimitRepository {
    limits: Mutex<HashMap<TransferLimitId, TransferLimit>>,
}

impl InMemoryTransferLimitRepository {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<TransferLimitId, TransferLimit>>, EngineError> {
        self.limits
            .lock()
            .map_err(|_| EngineError::repository("transfer limit store lock poisoned"))
    }
}

fn find_id(
    limits: &HashMap<TransferLimitId, TransferLimit>,
    combination: &SegmentCombination,
    fiscal_year: &FiscalYear,
) -> Option<TransferLimitId> {
    limits
        .values()
        .find(|limit| limit.fiscal_year == *fiscal_year && limit.combination == *combination)
        .map(|limit| limit.id)
}

fn check_room(limit: &TransferLimit, field: UsageField) -> Result<(), EngineError> {
    match limit.ceiling(field) {
        Some(max) if limit.count(field) >= max => Err(EngineError::CeilingReached {
            field,
            count: limit.count(field),
            max,
        }),
        _ => Ok(()),
    }
}

impl TransferLimitRepository for InMemoryTransferLimitRepository {
    async fn find_exact(
        &self,
        combination: &SegmentCombination,
        fiscal_year: &FiscalYear,
    ) -> Result<Option<TransferLimit>, EngineError> {
        let limits = self.lock()?;
        Ok(find_id(&limits, combination, fiscal_year).and_then(|id| limits.get(&id).cloned()))
    }

    async fn find_by_id(&self, id: TransferLimitId) -> Result<Option<TransferLimit>, EngineError> {
        Ok(self.lock()?.get(&id).cloned())
    }

    async fn save(&self, limit: &TransferLimit) -> Result<TransferLimit, EngineError> {
        let mut limits = self.lock()?;
        // Counters belong to the increments; keep the stored values.
        let mut stored = limit.clone();
        if let Some(existing) = limits.get(&limit.id) {
            stored.source_count = existing.source_count;
            stored.target_count = existing.target_count;
        }
        limits.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn delete(&self, id: TransferLimitId) -> Result<bool, EngineError> {
        Ok(self.lock()?.remove(&id).is_some())
    }

    async fn atomic_increment(
        &self,
        combination: &SegmentCombination,
        fiscal_year: &FiscalYear,
        field: UsageField,
    ) -> Result<Option<i32>, EngineError> {
        let mut limits = self.lock()?;
        let Some(limit) = find_id(&limits, combination, fiscal_year).and_then(|id| limits.get_mut(&id))
        else {
            return Ok(None);
        };
        check_room(limit, field)?;
        Ok(Some(limit.bump(field)))
    }

    async fn atomic_increment_pair(
        &self,
        from: &SegmentCombination,
        to: &SegmentCombination,
        fiscal_year: &FiscalYear,
    ) -> Result<UsageCounts, EngineError> {
        let mut limits = self.lock()?;
        let from_id = find_id(&limits, from, fiscal_year);
        let to_id = find_id(&limits, to, fiscal_year);

        if let Some(limit) = from_id.and_then(|id| limits.get(&id)) {
            check_room(limit, UsageField::Source)?;
        }
        if let Some(limit) = to_id.and_then(|id| limits.get(&id)) {
            check_room(limit, UsageField::Target)?;
        }

        let source_count = from_id
            .and_then(|id| limits.get_mut(&id))
            .map(|limit| limit.bump(UsageField::Source));
        let target_count = to_id
            .and_then(|id| limits.get_mut(&id))
            .map(|limit| limit.bump(UsageField::Target));

        Ok(UsageCounts {
            source_count,
            target_count,
        })
    }
}
