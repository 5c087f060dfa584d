use budgetgate_shared::types::SegmentTypeId;
use dashmap::DashMap;

use crate::error::EngineError;
use crate::segment::SegmentMasterData;

#[derive(Debug, Clone)]
struct SegmentTypeRecord {
    name: String,
    is_hierarchical: bool,
}

/// Segment master data held in memory.
#[derive(Debug, Default)]
pub struct InMemorySegmentMaster {
    types: DashMap<SegmentTypeId, SegmentTypeRecord>,
    parents: DashMap<(SegmentTypeId, String), Option<String>>,
}

impl InMemorySegmentMaster {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) a segment type.
    pub fn add_type(&self, segment_type: SegmentTypeId, name: &str, is_hierarchical: bool) {
        self.types.insert(
            segment_type,
            SegmentTypeRecord {
                name: name.to_string(),
                is_hierarchical,
            },
        );
    }

    /// Display name of a registered segment type.
    #[must_use]
    pub fn type_name(&self, segment_type: SegmentTypeId) -> Option<String> {
        self.types.get(&segment_type).map(|record| record.name.clone())
    }

    /// Registers (or replaces) a segment code and its parent.
    pub fn add_value(&self, segment_type: SegmentTypeId, code: &str, parent_code: Option<&str>) {
        self.parents.insert(
            (segment_type, code.to_string()),
            parent_code.map(str::to_string),
        );
    }
}

impl SegmentMasterData for InMemorySegmentMaster {
    async fn is_hierarchical(&self, segment_type: SegmentTypeId) -> Result<bool, EngineError> {
        Ok(self
            .types
            .get(&segment_type)
            .is_some_and(|record| record.is_hierarchical))
    }

    async fn get_parent_code(
        &self,
        segment_type: SegmentTypeId,
        code: &str,
    ) -> Result<Option<String>, EngineError> {
        Ok(self
            .parents
            .get(&(segment_type, code.to_string()))
            .and_then(|entry| entry.value().clone()))
    }
}
