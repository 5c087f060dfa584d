//! Available-balance checks against resolved envelopes.

pub mod service;
pub mod types;

pub use service::{BalanceValidator, NO_ENVELOPE_REASON};
pub use types::BalanceCheck;
