//! `SeaORM` entity definitions.

pub mod envelopes;
pub mod sea_orm_active_enums;
pub mod segment_mappings;
pub mod segment_types;
pub mod segment_values;
pub mod transfer_ledger_entries;
pub mod transfer_limits;
