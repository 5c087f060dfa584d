use budgetgate_shared::types::{SegmentMappingId, SegmentTypeId};
use dashmap::DashMap;

use crate::error::EngineError;
use crate::mapping::{MappingRepository, SegmentMapping};

/// Segment mappings held in memory.
#[derive(Debug, Default)]
pub struct InMemoryMappingRepository {
    mappings: DashMap<SegmentMappingId, SegmentMapping>,
}

impl InMemoryMappingRepository {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn select(&self, keep: impl Fn(&SegmentMapping) -> bool) -> Vec<SegmentMapping> {
        let mut selected: Vec<SegmentMapping> = self
            .mappings
            .iter()
            .filter(|entry| entry.is_active && keep(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        selected.sort_by(|a, b| {
            (a.segment_type, &a.source_code, &a.target_code).cmp(&(
                b.segment_type,
                &b.source_code,
                &b.target_code,
            ))
        });
        selected
    }
}

impl MappingRepository for InMemoryMappingRepository {
    async fn find_forward(
        &self,
        segment_type: SegmentTypeId,
        source_code: &str,
    ) -> Result<Vec<SegmentMapping>, EngineError> {
        Ok(self.select(|m| m.segment_type == segment_type && m.source_code == source_code))
    }

    async fn find_reverse(
        &self,
        segment_type: SegmentTypeId,
        target_code: &str,
    ) -> Result<Vec<SegmentMapping>, EngineError> {
        Ok(self.select(|m| m.segment_type == segment_type && m.target_code == target_code))
    }

    async fn insert(&self, mapping: &SegmentMapping) -> Result<SegmentMapping, EngineError> {
        self.mappings.insert(mapping.id, mapping.clone());
        Ok(mapping.clone())
    }

    async fn delete(&self, id: SegmentMappingId) -> Result<bool, EngineError> {
        Ok(self.mappings.remove(&id).is_some())
    }

    async fn list(
        &self,
        segment_type: Option<SegmentTypeId>,
    ) -> Result<Vec<SegmentMapping>, EngineError> {
        Ok(self.select(|m| segment_type.is_none_or(|t| m.segment_type == t)))
    }
}
