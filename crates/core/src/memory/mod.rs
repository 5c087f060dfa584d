//! In-process implementations of every repository trait.
//!
//! Read-heavy stores are backed by `DashMap`. Transfer limits sit behind one
//! mutex so that a pair of counters can be bumped atomically, which is what
//! the database does with a transaction.

mod envelopes;
mod ledger;
mod limits;
mod mappings;
mod segments;

pub use envelopes::InMemoryEnvelopeRepository;
pub use ledger::InMemoryTransferLedger;
pub use limits::InMemoryTransferLimitRepository;
pub use mappings::InMemoryMappingRepository;
pub use segments::InMemorySegmentMaster;
