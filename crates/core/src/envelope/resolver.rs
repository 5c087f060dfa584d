//! Hierarchical envelope resolution.
//!
//! Resolution first tries an exact match. Only when that fails, and the caller
//! asked for hierarchy fallback, does it climb: at each level every
//! hierarchical segment that still has a parent is replaced by that parent and
//! the ancestor combination is looked up with an exact-match-only query. The
//! closest ancestor with an envelope wins.
//!
//! The climb is an explicit loop. Per-level lookups never re-enter the
//! hierarchy walk, and a depth guard plus cycle detection bound the loop even
//! if master data is corrupt.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use budgetgate_shared::types::{FiscalYear, SegmentTypeId};
use tracing::debug;

use super::store::EnvelopeRepository;
use super::types::{Envelope, EnvelopeResolution, EnvelopeSource};
use crate::error::EngineError;
use crate::segment::{SegmentCombination, SegmentHierarchyResolver, SegmentMasterData};

/// Default upper bound on climbed levels.
pub const DEFAULT_MAX_HIERARCHY_DEPTH: usize = 32;

/// Finds the envelope governing a combination.
pub struct HierarchicalEnvelopeResolver<E: EnvelopeRepository, S: SegmentMasterData> {
    envelopes: Arc<E>,
    hierarchy: SegmentHierarchyResolver<S>,
    max_depth: usize,
}

impl<E: EnvelopeRepository, S: SegmentMasterData> HierarchicalEnvelopeResolver<E, S> {
    /// Creates a resolver with the default depth guard.
    #[must_use]
    pub fn new(envelopes: Arc<E>, hierarchy: SegmentHierarchyResolver<S>) -> Self {
        Self::with_max_depth(envelopes, hierarchy, DEFAULT_MAX_HIERARCHY_DEPTH)
    }

    /// Creates a resolver with a custom depth guard.
    #[must_use]
    pub fn with_max_depth(
        envelopes: Arc<E>,
        hierarchy: SegmentHierarchyResolver<S>,
        max_depth: usize,
    ) -> Self {
        Self {
            envelopes,
            hierarchy,
            max_depth,
        }
    }

    /// Resolves the envelope for `combination`.
    ///
    /// Returns `EXACT` when the combination owns an active envelope, `PARENT`
    /// when the closest ancestor combination does, `NONE` otherwise. With
    /// `use_hierarchy == false` only the exact lookup is attempted.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A parent chain contains a cycle
    /// - The climb exceeds the configured maximum depth
    /// - A repository call fails
    pub async fn resolve(
        &self,
        combination: &SegmentCombination,
        fiscal_year: &FiscalYear,
        use_hierarchy: bool,
    ) -> Result<EnvelopeResolution, EngineError> {
        if let Some(envelope) = self.lookup_exact(combination, fiscal_year).await? {
            debug!(combination = %combination, fiscal_year = %fiscal_year, "Exact envelope match");
            return Ok(EnvelopeResolution::found(envelope, EnvelopeSource::Exact, 1));
        }

        if !use_hierarchy {
            return Ok(EnvelopeResolution::not_found(1));
        }

        self.climb(combination, fiscal_year).await
    }

    /// Exact-match-only lookup. Never walks the hierarchy.
    async fn lookup_exact(
        &self,
        combination: &SegmentCombination,
        fiscal_year: &FiscalYear,
    ) -> Result<Option<Envelope>, EngineError> {
        self.envelopes.find_exact(combination, fiscal_year).await
    }

    async fn climb(
        &self,
        combination: &SegmentCombination,
        fiscal_year: &FiscalYear,
    ) -> Result<EnvelopeResolution, EngineError> {
        let mut climbable = Vec::new();
        for segment_type in combination.keys() {
            if self.hierarchy.is_hierarchical(segment_type).await? {
                climbable.push(segment_type);
            }
        }

        let mut seen: HashMap<SegmentTypeId, HashSet<String>> = combination
            .iter()
            .map(|(segment_type, code)| (segment_type, HashSet::from([code.to_string()])))
            .collect();

        let mut lookups = 1;
        let mut depth = 0;
        let mut current = combination.clone();

        loop {
            let mut next = current.clone();
            let mut climbed = false;

            for &segment_type in &climbable {
                let Some(code) = current.get(segment_type) else {
                    continue;
                };
                let Some(parent) = self.hierarchy.parent_or_none(segment_type, code).await? else {
                    continue;
                };

                let visited = seen.entry(segment_type).or_default();
                if !visited.insert(parent.clone()) {
                    return Err(EngineError::HierarchyCycle {
                        segment_type,
                        code: parent,
                    });
                }
                next = next.with_code_replaced(segment_type, parent)?;
                climbed = true;
            }

            if !climbed {
                debug!(combination = %combination, levels = depth, "No ancestor envelope");
                return Ok(EnvelopeResolution::not_found(lookups));
            }

            depth += 1;
            if depth > self.max_depth {
                return Err(EngineError::HierarchyTooDeep {
                    max_depth: self.max_depth,
                });
            }

            lookups += 1;
            if let Some(envelope) = self.lookup_exact(&next, fiscal_year).await? {
                debug!(
                    combination = %combination,
                    matched = %next,
                    levels = depth,
                    "Inherited envelope from ancestor"
                );
                return Ok(EnvelopeResolution::found(envelope, EnvelopeSource::Parent, lookups));
            }

            current = next;
        }
    }
}
