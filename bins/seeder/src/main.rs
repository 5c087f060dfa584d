//! Database seeder for Budgetgate development and testing.
//!
//! Seeds segment types and values, envelopes, transfer limits and mappings,
//! then runs two sample authorizations so the engine's logs can be checked
//! against a real database.
//!
//! Usage: cargo run --bin seeder

use std::sync::Arc;

use anyhow::Context;
use budgetgate_core::{EngineError, SegmentCombination};
use budgetgate_core::authorization::TransferAuthorizationFacade;
use budgetgate_core::balance::BalanceValidator;
use budgetgate_core::consumption::ConsumedBalanceCalculator;
use budgetgate_core::envelope::{CreateEnvelopeInput, EnvelopeStore, HierarchicalEnvelopeResolver};
use budgetgate_core::limit::{CreateTransferLimitInput, TransferLimitValidator};
use budgetgate_core::mapping::{CreateMappingInput, MappingKind, SegmentMappingResolver};
use budgetgate_core::segment::{CachedSegmentMaster, SegmentHierarchyResolver};
use budgetgate_db::migration::{Migrator, MigratorTrait};
use budgetgate_db::repositories::UpsertSegmentValueInput;
use budgetgate_db::{
    PgEnvelopeRepository, PgMappingRepository, PgSegmentMaster, PgTransferLedger,
    PgTransferLimitRepository,
};
use budgetgate_shared::AppConfig;
use budgetgate_shared::types::{FiscalYear, SegmentTypeId};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::DatabaseConnection;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const FISCAL_YEAR: &str = "FY2025";

/// Entity codes and their parents. Entity is the only hierarchical type.
const ENTITIES: &[(&str, Option<&str>, &str)] = &[
    ("E100", None, "Head office"),
    ("E101", Some("E100"), "North branch"),
    ("E102", Some("E100"), "South branch"),
];

const ACCOUNTS: &[(&str, &str)] = &[("A200", "Operating expenses"), ("A300", "Capital expenditure")];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "budgetgate=debug,seeder=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    info!("Connecting to database...");
    let db = budgetgate_db::connect_with(&config.database)
        .await
        .context("Failed to connect to database")?;
    Migrator::up(&db, None).await.context("Failed to run migrations")?;

    let fy = FiscalYear::new(FISCAL_YEAR)?;

    info!("Seeding segment master data...");
    seed_segments(&db).await?;

    info!("Seeding envelopes...");
    seed_envelopes(&db, &fy).await?;

    info!("Seeding transfer limits...");
    seed_limits(&db, &fy).await?;

    info!("Seeding segment mappings...");
    seed_mappings(&db).await?;

    let facade = TransferAuthorizationFacade::new(
        BalanceValidator::new(
            HierarchicalEnvelopeResolver::with_max_depth(
                Arc::new(PgEnvelopeRepository::new(db.clone())),
                SegmentHierarchyResolver::new(Arc::new(CachedSegmentMaster::new(
                    PgSegmentMaster::new(db.clone()),
                    config.engine.hierarchy_cache_capacity,
                    config.engine.hierarchy_cache_ttl_secs,
                ))),
                config.engine.max_hierarchy_depth,
            ),
            ConsumedBalanceCalculator::new(Arc::new(PgTransferLedger::new(db.clone()))),
        ),
        SegmentMappingResolver::new(Arc::new(PgMappingRepository::new(db.clone()))),
        TransferLimitValidator::new(Arc::new(PgTransferLimitRepository::new(db.clone()))),
        config.engine.clone(),
    );

    let samples = [
        // Alias E199 maps onto E101, which inherits the head office envelope.
        (combo(&[(1, "E199"), (2, "A200")])?, combo(&[(1, "E102"), (2, "A300")])?),
        // E102/A300 may not give funds away.
        (combo(&[(1, "E102"), (2, "A300")])?, combo(&[(1, "E101"), (2, "A200")])?),
    ];

    for (from, to) in &samples {
        let decision = facade.authorize(from, to, dec!(5000), &fy).await?;
        info!(
            from = %decision.effective_from,
            to = %decision.effective_to,
            allowed = decision.allowed,
            reasons = ?decision.reasons,
            "Sample authorization"
        );
    }

    info!("Seeding complete!");
    Ok(())
}

fn segment_type(value: i32) -> anyhow::Result<SegmentTypeId> {
    Ok(SegmentTypeId::new(value)?)
}

fn combo(pairs: &[(i32, &str)]) -> Result<SegmentCombination, EngineError> {
    SegmentCombination::from_raw(pairs.iter().copied())
}

async fn seed_segments(db: &DatabaseConnection) -> anyhow::Result<()> {
    let master = PgSegmentMaster::new(db.clone());
    master.upsert_type(segment_type(1)?, "Entity", true).await?;
    master.upsert_type(segment_type(2)?, "Account", false).await?;

    for (code, parent, name) in ENTITIES {
        master
            .upsert_value(UpsertSegmentValueInput {
                segment_type: segment_type(1)?,
                code: (*code).to_string(),
                parent_code: parent.map(str::to_string),
                name: Some((*name).to_string()),
            })
            .await?;
    }

    for (code, name) in ACCOUNTS {
        master
            .upsert_value(UpsertSegmentValueInput {
                segment_type: segment_type(2)?,
                code: (*code).to_string(),
                parent_code: None,
                name: Some((*name).to_string()),
            })
            .await?;
    }
    Ok(())
}

async fn seed_envelopes(db: &DatabaseConnection, fy: &FiscalYear) -> anyhow::Result<()> {
    let store = EnvelopeStore::new(Arc::new(PgEnvelopeRepository::new(db.clone())));
    let envelopes: [(SegmentCombination, Decimal); 2] = [
        (combo(&[(1, "E100"), (2, "A200")])?, dec!(100000)),
        (combo(&[(1, "E102"), (2, "A300")])?, dec!(25000)),
    ];

    for (combination, amount) in envelopes {
        if store.find_exact(&combination, fy).await?.is_some() {
            info!(combination = %combination, "Envelope already exists, skipping");
            continue;
        }
        store
            .create(CreateEnvelopeInput {
                combination,
                fiscal_year: fy.clone(),
                envelope_amount: amount,
                description: None,
            })
            .await?;
    }
    Ok(())
}

async fn seed_limits(db: &DatabaseConnection, fy: &FiscalYear) -> anyhow::Result<()> {
    let limits = TransferLimitValidator::new(Arc::new(PgTransferLimitRepository::new(db.clone())));
    let inputs = [
        CreateTransferLimitInput {
            max_source_transfers: Some(3),
            ..CreateTransferLimitInput::permissive(combo(&[(1, "E101"), (2, "A200")])?, fy.clone())
        },
        CreateTransferLimitInput {
            is_allowed_as_source: false,
            ..CreateTransferLimitInput::permissive(combo(&[(1, "E102"), (2, "A300")])?, fy.clone())
        },
    ];

    for input in inputs {
        if limits.find_limit(&input.combination, fy).await?.is_some() {
            info!(combination = %input.combination, "Transfer limit already exists, skipping");
            continue;
        }
        limits.create_limit(input).await?;
    }
    Ok(())
}

async fn seed_mappings(db: &DatabaseConnection) -> anyhow::Result<()> {
    let mappings = SegmentMappingResolver::new(Arc::new(PgMappingRepository::new(db.clone())));
    let result = mappings
        .create_mapping(CreateMappingInput {
            segment_type: segment_type(1)?,
            source_code: "E199".to_string(),
            target_code: "E101".to_string(),
            kind: MappingKind::Alias,
            description: Some("Legacy code for the north branch".to_string()),
        })
        .await;

    match result {
        Ok(_) | Err(EngineError::DuplicateMapping { .. }) => Ok(()),
        Err(e) => Err(e.into()),
    }
}
