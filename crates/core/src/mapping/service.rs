//! Mapping lookups and combination rewriting.

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;

use budgetgate_shared::types::{SegmentMappingId, SegmentTypeId};
use chrono::Utc;
use tracing::{debug, info};

use super::types::{CreateMappingInput, SegmentMapping};
use crate::error::EngineError;
use crate::segment::SegmentCombination;

/// Repository trait for mapping persistence.
///
/// Lookups return active mappings only.
pub trait MappingRepository: Send + Sync {
    /// Active mappings whose source is `source_code`.
    fn find_forward(
        &self,
        segment_type: SegmentTypeId,
        source_code: &str,
    ) -> impl Future<Output = Result<Vec<SegmentMapping>, EngineError>> + Send;

    /// Active mappings whose target is `target_code`.
    fn find_reverse(
        &self,
        segment_type: SegmentTypeId,
        target_code: &str,
    ) -> impl Future<Output = Result<Vec<SegmentMapping>, EngineError>> + Send;

    /// Stores a new mapping.
    fn insert(
        &self,
        mapping: &SegmentMapping,
    ) -> impl Future<Output = Result<SegmentMapping, EngineError>> + Send;

    /// Hard-deletes a mapping. Returns false if it did not exist.
    fn delete(
        &self,
        id: SegmentMappingId,
    ) -> impl Future<Output = Result<bool, EngineError>> + Send;

    /// Lists active mappings, optionally restricted to one segment type.
    fn list(
        &self,
        segment_type: Option<SegmentTypeId>,
    ) -> impl Future<Output = Result<Vec<SegmentMapping>, EngineError>> + Send;
}

/// Resolves codes through configured mappings.
pub struct SegmentMappingResolver<M: MappingRepository> {
    repo: Arc<M>,
}

impl<M: MappingRepository> SegmentMappingResolver<M> {
    /// Creates a new resolver.
    #[must_use]
    pub fn new(repo: Arc<M>) -> Self {
        Self { repo }
    }

    /// Targets of `source_code`, sorted and deduplicated.
    pub async fn forward(
        &self,
        segment_type: SegmentTypeId,
        source_code: &str,
    ) -> Result<Vec<String>, EngineError> {
        let mappings = self.repo.find_forward(segment_type, source_code).await?;
        Ok(distinct(mappings.into_iter().map(|m| m.target_code)))
    }

    /// Sources mapping onto `target_code`, sorted and deduplicated.
    pub async fn reverse(
        &self,
        segment_type: SegmentTypeId,
        target_code: &str,
    ) -> Result<Vec<String>, EngineError> {
        let mappings = self.repo.find_reverse(segment_type, target_code).await?;
        Ok(distinct(mappings.into_iter().map(|m| m.source_code)))
    }

    /// Rewrites every key of `combination` that has exactly one forward target.
    ///
    /// Keys without mappings pass through unchanged.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::AmbiguousMapping` if a code maps to more than one
    /// target. The ambiguity is reported, never resolved by picking one.
    pub async fn apply_to_combination(
        &self,
        combination: &SegmentCombination,
    ) -> Result<SegmentCombination, EngineError> {
        let mut mapped = combination.clone();

        for (segment_type, code) in combination.iter() {
            let mut targets = self.forward(segment_type, code).await?;
            match targets.len() {
                0 => {}
                1 => {
                    let target = targets.remove(0);
                    debug!(segment_type = %segment_type, from = code, to = %target, "Mapped segment code");
                    mapped = mapped.with_code_replaced(segment_type, target)?;
                }
                _ => {
                    return Err(EngineError::AmbiguousMapping {
                        segment_type,
                        code: code.to_string(),
                        targets,
                    });
                }
            }
        }

        Ok(mapped)
    }

    /// Creates a mapping edge.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Source and target are the same code
    /// - Either code is blank
    /// - The same active edge already exists
    pub async fn create_mapping(
        &self,
        input: CreateMappingInput,
    ) -> Result<SegmentMapping, EngineError> {
        let source_code = input.source_code.trim().to_string();
        let target_code = input.target_code.trim().to_string();

        if source_code.is_empty() || target_code.is_empty() {
            return Err(EngineError::InvalidCombination(
                "mapping codes cannot be blank".to_string(),
            ));
        }
        if source_code == target_code {
            return Err(EngineError::SelfMapping(source_code));
        }
        if self
            .forward(input.segment_type, &source_code)
            .await?
            .contains(&target_code)
        {
            return Err(EngineError::DuplicateMapping {
                segment_type: input.segment_type,
                source_code,
                target_code,
            });
        }

        let mapping = SegmentMapping {
            id: SegmentMappingId::new(),
            segment_type: input.segment_type,
            source_code,
            target_code,
            kind: input.kind,
            is_active: true,
            description: input.description,
            created_at: Utc::now(),
        };

        let saved = self.repo.insert(&mapping).await?;
        info!(
            mapping_id = %saved.id,
            segment_type = %saved.segment_type,
            source = %saved.source_code,
            target = %saved.target_code,
            kind = saved.kind.as_str(),
            "Segment mapping created"
        );
        Ok(saved)
    }

    /// Deletes a mapping edge.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::MappingNotFound` if the mapping does not exist.
    pub async fn delete_mapping(&self, id: SegmentMappingId) -> Result<(), EngineError> {
        if !self.repo.delete(id).await? {
            return Err(EngineError::MappingNotFound(id));
        }
        info!(mapping_id = %id, "Segment mapping deleted");
        Ok(())
    }

    /// Lists active mappings.
    pub async fn list_mappings(
        &self,
        segment_type: Option<SegmentTypeId>,
    ) -> Result<Vec<SegmentMapping>, EngineError> {
        self.repo.list(segment_type).await
    }
}

fn distinct(codes: impl Iterator<Item = String>) -> Vec<String> {
    codes.collect::<BTreeSet<_>>().into_iter().collect()
}
