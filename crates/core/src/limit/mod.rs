//! Transfer permission flags, usage ceilings and counters.

pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use service::{TransferLimitRepository, TransferLimitValidator};
pub use types::{
    CreateTransferLimitInput, LimitDecision, TransferLimit, TransferValidation,
    UpdateTransferLimitInput, UsageCounts, UsageField, UsageOutcome,
};
