//! Segment combinations and hierarchy walks.

pub mod combination;
pub mod hierarchy;

#[cfg(test)]
mod combination_props;

pub use combination::SegmentCombination;
pub use hierarchy::{CachedSegmentMaster, SegmentHierarchyResolver, SegmentMasterData};
