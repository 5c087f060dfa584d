//! Segment envelope and transfer validation engine.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Storage is reached through the repository traits declared next to each
//! service; `budgetgate-db` implements them for PostgreSQL and [`memory`]
//! implements them in process.
//!
//! # Modules
//!
//! - `segment` - Segment combinations and hierarchy walks
//! - `envelope` - Envelope CRUD and hierarchical envelope resolution
//! - `consumption` - Consumed balance from approved source legs
//! - `balance` - Available-balance checks
//! - `mapping` - Consolidation/alias mappings between segment codes
//! - `limit` - Transfer permission flags, ceilings and usage counters
//! - `authorization` - Allow/deny decisions for proposed transfers
//! - `memory` - In-process implementations of every repository trait

pub mod authorization;
pub mod balance;
pub mod consumption;
pub mod envelope;
pub mod error;
pub mod limit;
pub mod mapping;
pub mod memory;
pub mod segment;

#[cfg(test)]
mod test_support;

pub use error::{EngineError, EngineResult, ErrorKind};
pub use segment::SegmentCombination;
