//! Common types used across the application.

pub mod id;
pub mod segment;

pub use id::*;
pub use segment::{FiscalYear, SegmentTypeId, SegmentValueError};
