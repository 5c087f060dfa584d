//! Allow/deny decisions for proposed transfers.

pub mod service;
pub mod types;

#[cfg(test)]
mod tests;

pub use budgetgate_shared::AuthorizationMode;
pub use service::{IDENTICAL_COMBINATIONS_REASON, TransferAuthorizationFacade};
pub use types::AuthorizationDecision;
