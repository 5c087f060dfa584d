//! Budget envelopes and hierarchical envelope resolution.

pub mod resolver;
pub mod store;
pub mod types;


pub use resolver::HierarchicalEnvelopeResolver;
pub use store::{EnvelopeRepository, EnvelopeStore};
pub use types::{
    CreateEnvelopeInput, Envelope, EnvelopeResolution, EnvelopeSource, UpdateEnvelopeInput,
};
