//! Segment mapping data types.

use budgetgate_shared::types::{SegmentMappingId, SegmentTypeId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Nature of a mapping edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingKind {
    /// Several codes roll up into one reporting code.
    Consolidation,
    /// Two names for the same code.
    Alias,
    /// Child code mapped onto its parent.
    ParentChild,
    /// Anything else.
    Custom,
}

impl MappingKind {
    /// Returns the stored label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Consolidation => "consolidation",
            Self::Alias => "alias",
            Self::ParentChild => "parent_child",
            Self::Custom => "custom",
        }
    }
}

impl std::str::FromStr for MappingKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "consolidation" => Ok(Self::Consolidation),
            "alias" => Ok(Self::Alias),
            "parent_child" => Ok(Self::ParentChild),
            "custom" => Ok(Self::Custom),
            other => Err(format!("unknown mapping kind: {other}")),
        }
    }
}

/// A directed `source_code -> target_code` edge within one segment type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentMapping {
    /// Mapping ID.
    pub id: SegmentMappingId,
    /// Segment type both codes belong to.
    pub segment_type: SegmentTypeId,
    /// Code being mapped.
    pub source_code: String,
    /// Code it maps to.
    pub target_code: String,
    /// Kind of mapping.
    pub kind: MappingKind,
    /// Inactive mappings are ignored by lookups.
    pub is_active: bool,
    /// Optional description.
    pub description: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Input for creating a mapping.
#[derive(Debug, Clone)]
pub struct CreateMappingInput {
    /// Segment type both codes belong to.
    pub segment_type: SegmentTypeId,
    /// Code being mapped.
    pub source_code: String,
    /// Code it maps to.
    pub target_code: String,
    /// Kind of mapping.
    pub kind: MappingKind,
    /// Optional description.
    pub description: Option<String>,
}
