//! Initial database migration.
//!
//! Creates segment master data, envelopes, mappings, transfer limits and the
//! transfer ledger.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: SEGMENT MASTER DATA
        // ============================================================
        db.execute_unprepared(SEGMENT_TYPES_SQL).await?;
        db.execute_unprepared(SEGMENT_VALUES_SQL).await?;

        // ============================================================
        // PART 3: ENVELOPES & MAPPINGS
        // ============================================================
        db.execute_unprepared(ENVELOPES_SQL).await?;
        db.execute_unprepared(SEGMENT_MAPPINGS_SQL).await?;

        // ============================================================
        // PART 4: TRANSFER LIMITS & LEDGER
        // ============================================================
        db.execute_unprepared(TRANSFER_LIMITS_SQL).await?;
        db.execute_unprepared(TRANSFER_LEDGER_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_SQL).await?;
        Ok(())
    }
}

const ENUMS_SQL: &str = r"
CREATE TYPE mapping_kind AS ENUM ('consolidation', 'alias', 'parent_child', 'custom');
CREATE TYPE leg_side AS ENUM ('source', 'destination');
CREATE TYPE ledger_status AS ENUM ('pending', 'approved', 'rejected');
";

const SEGMENT_TYPES_SQL: &str = r"
CREATE TABLE segment_types (
    id INTEGER PRIMARY KEY CHECK (id > 0),
    name VARCHAR(100) NOT NULL,
    is_hierarchical BOOLEAN NOT NULL DEFAULT false,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const SEGMENT_VALUES_SQL: &str = r"
CREATE TABLE segment_values (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    segment_type_id INTEGER NOT NULL REFERENCES segment_types(id) ON DELETE CASCADE,
    code VARCHAR(50) NOT NULL,
    parent_code VARCHAR(50),
    name VARCHAR(255),
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_segment_values_code UNIQUE (segment_type_id, code),
    CONSTRAINT chk_segment_values_not_own_parent CHECK (parent_code IS NULL OR parent_code <> code)
);

-- Parent lookups during hierarchy climbs
CREATE INDEX idx_segment_values_parent ON segment_values(segment_type_id, parent_code);
";

const ENVELOPES_SQL: &str = r"
CREATE TABLE envelopes (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    combination_key TEXT NOT NULL,
    combination JSONB NOT NULL,
    fiscal_year VARCHAR(20) NOT NULL,
    envelope_amount NUMERIC(19, 4) NOT NULL CHECK (envelope_amount >= 0),
    is_active BOOLEAN NOT NULL DEFAULT true,
    description TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

-- One active envelope per combination and fiscal year
CREATE UNIQUE INDEX uq_envelopes_active
    ON envelopes(combination_key, fiscal_year)
    WHERE is_active;

CREATE INDEX idx_envelopes_fiscal_year ON envelopes(fiscal_year);
";

const SEGMENT_MAPPINGS_SQL: &str = r"
CREATE TABLE segment_mappings (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    segment_type_id INTEGER NOT NULL REFERENCES segment_types(id) ON DELETE CASCADE,
    source_code VARCHAR(50) NOT NULL,
    target_code VARCHAR(50) NOT NULL,
    mapping_kind mapping_kind NOT NULL DEFAULT 'consolidation',
    is_active BOOLEAN NOT NULL DEFAULT true,
    description TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_segment_mappings_not_self CHECK (source_code <> target_code)
);

CREATE UNIQUE INDEX uq_segment_mappings_edge
    ON segment_mappings(segment_type_id, source_code, target_code)
    WHERE is_active;

CREATE INDEX idx_segment_mappings_forward ON segment_mappings(segment_type_id, source_code) WHERE is_active;
CREATE INDEX idx_segment_mappings_reverse ON segment_mappings(segment_type_id, target_code) WHERE is_active;
";

const TRANSFER_LIMITS_SQL: &str = r"
CREATE TABLE transfer_limits (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    combination_key TEXT NOT NULL,
    combination JSONB NOT NULL,
    fiscal_year VARCHAR(20) NOT NULL,
    is_transfer_allowed BOOLEAN NOT NULL DEFAULT true,
    is_allowed_as_source BOOLEAN NOT NULL DEFAULT true,
    is_allowed_as_target BOOLEAN NOT NULL DEFAULT true,
    max_source_transfers INTEGER CHECK (max_source_transfers >= 0),
    max_target_transfers INTEGER CHECK (max_target_transfers >= 0),
    source_count INTEGER NOT NULL DEFAULT 0 CHECK (source_count >= 0),
    target_count INTEGER NOT NULL DEFAULT 0 CHECK (target_count >= 0),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_transfer_limits_combination UNIQUE (combination_key, fiscal_year),
    CONSTRAINT chk_source_count_ceiling CHECK (max_source_transfers IS NULL OR source_count <= max_source_transfers),
    CONSTRAINT chk_target_count_ceiling CHECK (max_target_transfers IS NULL OR target_count <= max_target_transfers)
);
";

const TRANSFER_LEDGER_SQL: &str = r"
CREATE TABLE transfer_ledger_entries (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    transfer_id UUID NOT NULL,
    combination_key TEXT NOT NULL,
    combination JSONB NOT NULL,
    fiscal_year VARCHAR(20) NOT NULL,
    amount NUMERIC(19, 4) NOT NULL,
    side leg_side NOT NULL,
    status ledger_status NOT NULL DEFAULT 'pending',
    recorded_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

-- Consumption sums approved source legs for one combination
CREATE INDEX idx_transfer_ledger_consumption
    ON transfer_ledger_entries(combination_key, fiscal_year)
    WHERE side = 'source' AND status = 'approved';

CREATE INDEX idx_transfer_ledger_transfer ON transfer_ledger_entries(transfer_id);
";

const DROP_SQL: &str = r"
DROP TABLE IF EXISTS transfer_ledger_entries CASCADE;
DROP TABLE IF EXISTS transfer_limits CASCADE;
DROP TABLE IF EXISTS segment_mappings CASCADE;
DROP TABLE IF EXISTS envelopes CASCADE;
DROP TABLE IF EXISTS segment_values CASCADE;
DROP TABLE IF EXISTS segment_types CASCADE;
DROP TYPE IF EXISTS ledger_status;
DROP TYPE IF EXISTS leg_side;
DROP TYPE IF EXISTS mapping_kind;
";
