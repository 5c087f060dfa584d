//! Repository implementations of the engine's storage traits.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

mod convert;
pub mod envelope;
pub mod ledger;
pub mod mapping;
pub mod segment_master;
pub mod transfer_limit;

pub use convert::StoreError;
pub use envelope::PgEnvelopeRepository;
pub use ledger::PgTransferLedger;
pub use mapping::PgMappingRepository;
pub use segment_master::{PgSegmentMaster, UpsertSegmentValueInput};
pub use transfer_limit::PgTransferLimitRepository;
