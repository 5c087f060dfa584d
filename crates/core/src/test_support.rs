//! Helpers shared by unit tests.

use budgetgate_shared::types::{FiscalYear, SegmentTypeId};

use crate::segment::SegmentCombination;

pub fn combo(pairs: &[(i32, &str)]) -> SegmentCombination {
    SegmentCombination::from_raw(pairs.iter().copied()).unwrap()
}

pub fn fy(label: &str) -> FiscalYear {
    FiscalYear::new(label).unwrap()
}

pub fn segment_type(value: i32) -> SegmentTypeId {
    SegmentTypeId::new(value).unwrap()
}
