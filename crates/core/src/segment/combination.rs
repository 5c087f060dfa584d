//! Segment combination value type.
//!
//! A combination maps segment types to codes and identifies one budget line.
//! Matching is exact: two combinations are equal only when they carry the
//! same key set with the same codes. There is deliberately no subset match;
//! hierarchy-aware matching goes through the envelope resolver.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use budgetgate_shared::types::SegmentTypeId;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// An immutable set of segment type -> code pairs, sorted by segment type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, String>",
    into = "BTreeMap<String, String>"
)]
pub struct SegmentCombination {
    segments: BTreeMap<SegmentTypeId, String>,
}

impl SegmentCombination {
    /// Builds a combination from segment type / code pairs.
    ///
    /// Codes are trimmed. The same segment type may not appear twice.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidCombination` when the pair list is empty,
    /// a code is blank, or a segment type is repeated.
    pub fn new<I, C>(pairs: I) -> Result<Self, EngineError>
    where
        I: IntoIterator<Item = (SegmentTypeId, C)>,
        C: Into<String>,
    {
        let mut segments = BTreeMap::new();
        for (segment_type, code) in pairs {
            let code = normalize_code(segment_type, code.into())?;
            if segments.insert(segment_type, code).is_some() {
                return Err(EngineError::InvalidCombination(format!(
                    "segment type {segment_type} appears more than once"
                )));
            }
        }

        if segments.is_empty() {
            return Err(EngineError::InvalidCombination(
                "a combination needs at least one segment".to_string(),
            ));
        }

        Ok(Self { segments })
    }

    /// Builds a combination from raw integer segment type ids.
    ///
    /// # Errors
    ///
    /// Returns an error for non-positive ids or any reason [`Self::new`] rejects.
    pub fn from_raw<'a, I>(pairs: I) -> Result<Self, EngineError>
    where
        I: IntoIterator<Item = (i32, &'a str)>,
    {
        let typed = pairs
            .into_iter()
            .map(|(id, code)| SegmentTypeId::new(id).map(|id| (id, code)))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(typed)
    }

    /// Builds a single-segment combination.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidCombination` when the code is blank.
    pub fn single(segment_type: SegmentTypeId, code: impl Into<String>) -> Result<Self, EngineError> {
        Self::new([(segment_type, code.into())])
    }

    /// Returns the code for a segment type, if present.
    #[must_use]
    pub fn get(&self, segment_type: SegmentTypeId) -> Option<&str> {
        self.segments.get(&segment_type).map(String::as_str)
    }

    /// Iterates the segment types in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = SegmentTypeId> + '_ {
        self.segments.keys().copied()
    }

    /// Iterates `(segment type, code)` pairs in ascending segment type order.
    pub fn iter(&self) -> impl Iterator<Item = (SegmentTypeId, &str)> + '_ {
        self.segments.iter().map(|(id, code)| (*id, code.as_str()))
    }

    /// Number of segments in the combination.
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always false; empty combinations cannot be constructed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Structural equality. Equivalent to `==`.
    #[must_use]
    pub fn equals(&self, other: &Self) -> bool {
        self == other
    }

    /// Returns true when the key set is exactly `keys` (order and duplicates ignored).
    #[must_use]
    pub fn contains_exactly(&self, keys: &[SegmentTypeId]) -> bool {
        let wanted: BTreeSet<SegmentTypeId> = keys.iter().copied().collect();
        wanted.len() == self.segments.len() && wanted.iter().all(|k| self.segments.contains_key(k))
    }

    /// Returns a copy with one segment's code replaced.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidCombination` when the segment type is not
    /// part of this combination or the new code is blank.
    pub fn with_code_replaced(
        &self,
        segment_type: SegmentTypeId,
        new_code: impl Into<String>,
    ) -> Result<Self, EngineError> {
        if !self.segments.contains_key(&segment_type) {
            return Err(EngineError::InvalidCombination(format!(
                "segment type {segment_type} is not part of {self}"
            )));
        }

        let mut segments = self.segments.clone();
        segments.insert(segment_type, normalize_code(segment_type, new_code.into())?);
        Ok(Self { segments })
    }

    /// Canonical storage key, e.g. `1:E100|2:A200`.
    ///
    /// Segment types appear in numeric order so the key is stable regardless
    /// of construction order.
    #[must_use]
    pub fn canonical_key(&self) -> String {
        self.segments
            .iter()
            .map(|(id, code)| format!("{id}:{code}"))
            .collect::<Vec<_>>()
            .join("|")
    }

    /// JSON object form, e.g. `{"1":"E100"}`.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.segments
                .iter()
                .map(|(id, code)| (id.to_string(), serde_json::Value::String(code.clone())))
                .collect(),
        )
    }

    /// Parses the JSON object form.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidCombination` for anything but an object of
    /// string codes keyed by positive integers.
    pub fn from_json(value: serde_json::Value) -> Result<Self, EngineError> {
        serde_json::from_value(value).map_err(|e| EngineError::InvalidCombination(e.to_string()))
    }
}

fn normalize_code(segment_type: SegmentTypeId, code: String) -> Result<String, EngineError> {
    let trimmed = code.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidCombination(format!(
            "segment type {segment_type} has a blank code"
        )));
    }
    Ok(trimmed.to_string())
}

impl TryFrom<BTreeMap<String, String>> for SegmentCombination {
    type Error = EngineError;

    fn try_from(raw: BTreeMap<String, String>) -> Result<Self, Self::Error> {
        let pairs = raw
            .into_iter()
            .map(|(key, code)| key.parse::<SegmentTypeId>().map(|id| (id, code)))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(pairs)
    }
}

impl From<SegmentCombination> for BTreeMap<String, String> {
    fn from(combination: SegmentCombination) -> Self {
        combination
            .segments
            .into_iter()
            .map(|(id, code)| (id.to_string(), code))
            .collect()
    }
}

impl fmt::Display for SegmentCombination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (id, code)) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{id}={code}")?;
        }
        f.write_str("}")
    }
}
