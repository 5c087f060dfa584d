//! Segment hierarchy walks.
//!
//! Segment master data is owned by an external collaborator; this module only
//! reads parent links from it. [`SegmentHierarchyResolver::get_parent`] imposes
//! no bound of its own. Callers that climb own cycle protection, which
//! [`SegmentHierarchyResolver::ancestors`] and the envelope resolver provide.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use budgetgate_shared::types::SegmentTypeId;
use moka::future::Cache;

use crate::error::EngineError;

/// Read access to segment master data.
///
/// This trait is implemented by the db crate and by [`crate::memory`].
pub trait SegmentMasterData: Send + Sync {
    /// Whether parent/child traversal is meaningful for the segment type.
    fn is_hierarchical(
        &self,
        segment_type: SegmentTypeId,
    ) -> impl Future<Output = Result<bool, EngineError>> + Send;

    /// Immediate parent code of `code`, if any.
    fn get_parent_code(
        &self,
        segment_type: SegmentTypeId,
        code: &str,
    ) -> impl Future<Output = Result<Option<String>, EngineError>> + Send;
}

/// Parent lookups over segment master data.
pub struct SegmentHierarchyResolver<S: SegmentMasterData> {
    master: Arc<S>,
}

impl<S: SegmentMasterData> Clone for SegmentHierarchyResolver<S> {
    fn clone(&self) -> Self {
        Self {
            master: Arc::clone(&self.master),
        }
    }
}

impl<S: SegmentMasterData> SegmentHierarchyResolver<S> {
    /// Creates a new hierarchy resolver.
    #[must_use]
    pub fn new(master: Arc<S>) -> Self {
        Self { master }
    }

    /// Whether the segment type supports hierarchy walks.
    pub async fn is_hierarchical(&self, segment_type: SegmentTypeId) -> Result<bool, EngineError> {
        self.master.is_hierarchical(segment_type).await
    }

    /// Returns the immediate parent code.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NotHierarchical` when the segment type is not
    /// configured as hierarchical. Callers should treat that as "no parent".
    pub async fn get_parent(
        &self,
        segment_type: SegmentTypeId,
        code: &str,
    ) -> Result<Option<String>, EngineError> {
        if !self.master.is_hierarchical(segment_type).await? {
            return Err(EngineError::NotHierarchical(segment_type));
        }
        self.master.get_parent_code(segment_type, code).await
    }

    /// Like [`Self::get_parent`] but maps `NotHierarchical` to `None`.
    pub async fn parent_or_none(
        &self,
        segment_type: SegmentTypeId,
        code: &str,
    ) -> Result<Option<String>, EngineError> {
        match self.get_parent(segment_type, code).await {
            Err(EngineError::NotHierarchical(_)) => Ok(None),
            other => other,
        }
    }

    /// Returns the ancestor chain of `code`, nearest parent first.
    ///
    /// Non-hierarchical segment types have no ancestors.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::HierarchyCycle` when the chain revisits a code and
    /// `EngineError::HierarchyTooDeep` when it is longer than `max_depth`.
    pub async fn ancestors(
        &self,
        segment_type: SegmentTypeId,
        code: &str,
        max_depth: usize,
    ) -> Result<Vec<String>, EngineError> {
        let mut chain = Vec::new();
        let mut seen = HashSet::from([code.to_string()]);
        let mut current = code.to_string();

        while let Some(parent) = self.parent_or_none(segment_type, &current).await? {
            if !seen.insert(parent.clone()) {
                return Err(EngineError::HierarchyCycle {
                    segment_type,
                    code: parent,
                });
            }
            if chain.len() == max_depth {
                return Err(EngineError::HierarchyTooDeep { max_depth });
            }
            chain.push(parent.clone());
            current = parent;
        }

        Ok(chain)
    }
}

/// Caching decorator for segment master data.
///
/// Master data is read-heavy and write-light; answers are cached with a
/// bounded capacity and time-to-live. Call [`Self::invalidate_all`] after
/// editing segment types or parent links.
pub struct CachedSegmentMaster<S: SegmentMasterData> {
    inner: S,
    hierarchical: Cache<SegmentTypeId, bool>,
    parents: Cache<(SegmentTypeId, String), Option<String>>,
}

impl<S: SegmentMasterData> CachedSegmentMaster<S> {
    /// Wraps `inner` with a cache of `max_capacity` entries per lookup kind.
    #[must_use]
    pub fn new(inner: S, max_capacity: u64, ttl_secs: u64) -> Self {
        let ttl = Duration::from_secs(ttl_secs);
        Self {
            inner,
            hierarchical: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
            parents: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Drops every cached answer.
    pub fn invalidate_all(&self) {
        self.hierarchical.invalidate_all();
        self.parents.invalidate_all();
    }
}

impl<S: SegmentMasterData> SegmentMasterData for CachedSegmentMaster<S> {
    async fn is_hierarchical(&self, segment_type: SegmentTypeId) -> Result<bool, EngineError> {
        if let Some(cached) = self.hierarchical.get(&segment_type).await {
            return Ok(cached);
        }
        let answer = self.inner.is_hierarchical(segment_type).await?;
        self.hierarchical.insert(segment_type, answer).await;
        Ok(answer)
    }

    async fn get_parent_code(
        &self,
        segment_type: SegmentTypeId,
        code: &str,
    ) -> Result<Option<String>, EngineError> {
        let key = (segment_type, code.to_string());
        if let Some(cached) = self.parents.get(&key).await {
            return Ok(cached);
        }
        let answer = self.inner.get_parent_code(segment_type, code).await?;
        self.parents.insert(key, answer.clone()).await;
        Ok(answer)
    }
}
