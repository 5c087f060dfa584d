//! Consumed balance from approved source legs.

pub mod service;
pub mod types;

pub use service::{ConsumedBalanceCalculator, TransferLedger};
pub use types::{LedgerEntry, LedgerStatus, LegSide};
