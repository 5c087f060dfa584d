//! Consolidation and alias mappings between segment codes.

pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use service::{MappingRepository, SegmentMappingResolver};
pub use types::{CreateMappingInput, MappingKind, SegmentMapping};
