//! Envelope resolution and balance checks against PostgreSQL.

mod common;

use std::sync::Arc;

use budgetgate_core::{EngineError, ErrorKind};
use budgetgate_core::balance::BalanceValidator;
use budgetgate_core::consumption::{
    ConsumedBalanceCalculator, LedgerEntry, LedgerStatus, LegSide,
};
use budgetgate_core::envelope::{
    CreateEnvelopeInput, EnvelopeSource, EnvelopeStore, HierarchicalEnvelopeResolver,
};
use budgetgate_core::segment::{SegmentCombination, SegmentHierarchyResolver};
use budgetgate_db::{PgEnvelopeRepository, PgSegmentMaster, PgTransferLedger};
use budgetgate_shared::types::{FiscalYear, LedgerEntryId, TransferId};
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::DatabaseConnection;

use common::{combo, entity_value, fiscal_year, setup, suffix};

fn validator(
    db: &DatabaseConnection,
) -> BalanceValidator<PgEnvelopeRepository, PgSegmentMaster, PgTransferLedger> {
    let resolver = HierarchicalEnvelopeResolver::new(
        Arc::new(PgEnvelopeRepository::new(db.clone())),
        SegmentHierarchyResolver::new(Arc::new(PgSegmentMaster::new(db.clone()))),
    );
    let consumption = ConsumedBalanceCalculator::new(Arc::new(PgTransferLedger::new(db.clone())));
    BalanceValidator::new(resolver, consumption)
}

fn leg(
    combination: &SegmentCombination,
    fiscal_year: &FiscalYear,
    amount: Decimal,
    side: LegSide,
    status: LedgerStatus,
) -> LedgerEntry {
    LedgerEntry {
        id: LedgerEntryId::new(),
        transfer_id: TransferId::new(),
        combination: combination.clone(),
        fiscal_year: fiscal_year.clone(),
        amount,
        side,
        status,
        recorded_at: Utc::now(),
    }
}

/// Parent envelope of 10,000 with 3,000 consumed; child asks for 5,000.
async fn parent_with_consumption(
    db: &DatabaseConnection,
    run: &str,
) -> (SegmentCombination, SegmentCombination, FiscalYear) {
    let master = PgSegmentMaster::new(db.clone());
    let parent_code = format!("E100-{run}");
    let child_code = format!("E101-{run}");
    entity_value(&master, &parent_code, None).await;
    entity_value(&master, &child_code, Some(&parent_code)).await;

    let fy = fiscal_year(run);
    let parent = combo(&[(1, &parent_code)]);
    let child = combo(&[(1, &child_code)]);

    EnvelopeStore::new(Arc::new(PgEnvelopeRepository::new(db.clone())))
        .create(CreateEnvelopeInput {
            combination: parent.clone(),
            fiscal_year: fy.clone(),
            envelope_amount: dec!(10000),
            description: None,
        })
        .await
        .unwrap();

    let ledger = PgTransferLedger::new(db.clone());
    ledger
        .record(&leg(&parent, &fy, dec!(-3000), LegSide::Source, LedgerStatus::Approved))
        .await
        .unwrap();
    ledger
        .record(&leg(&parent, &fy, dec!(4000), LegSide::Destination, LedgerStatus::Approved))
        .await
        .unwrap();
    ledger
        .record(&leg(&parent, &fy, dec!(900), LegSide::Source, LedgerStatus::Pending))
        .await
        .unwrap();

    (parent, child, fy)
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database"]
async fn test_child_inherits_parent_envelope() {
    let db = setup().await;
    let run = suffix();
    let (parent, child, fy) = parent_with_consumption(&db, &run).await;

    let check = validator(&db)
        .check_available(&child, dec!(5000), &fy, true)
        .await
        .unwrap();

    assert!(check.available);
    assert!(check.sufficient);
    assert_eq!(check.envelope_source, EnvelopeSource::Parent);
    assert_eq!(check.matched_combination.as_ref(), Some(&parent));
    assert_eq!(check.envelope_amount, Some(dec!(10000)));
    assert_eq!(check.consumed_amount, dec!(3000));
    assert_eq!(check.remaining_balance, Some(dec!(7000)));
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database"]
async fn test_child_request_exceeding_remaining() {
    let db = setup().await;
    let run = suffix();
    let (_, child, fy) = parent_with_consumption(&db, &run).await;

    let check = validator(&db)
        .check_available(&child, dec!(8000), &fy, true)
        .await
        .unwrap();

    assert!(!check.sufficient);
    assert_eq!(check.remaining_balance, Some(dec!(7000)));
    assert_eq!(check.shortfall(), dec!(1000));
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database"]
async fn test_hierarchy_disabled_finds_nothing_for_child() {
    let db = setup().await;
    let run = suffix();
    let (_, child, fy) = parent_with_consumption(&db, &run).await;

    let check = validator(&db)
        .check_available(&child, dec!(1), &fy, false)
        .await
        .unwrap();

    assert!(!check.available);
    assert_eq!(check.envelope_source, EnvelopeSource::None);
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database"]
async fn test_child_spending_consumes_parent_envelope() {
    let db = setup().await;
    let run = suffix();
    let (parent, child, fy) = parent_with_consumption(&db, &run).await;

    let ledger = PgTransferLedger::new(db.clone());
    for _ in 0..3 {
        ledger
            .record(&leg(&child, &fy, dec!(-2000), LegSide::Source, LedgerStatus::Approved))
            .await
            .unwrap();
    }

    let check = validator(&db)
        .check_available(&child, dec!(2000), &fy, true)
        .await
        .unwrap();
    assert_eq!(check.envelope_source, EnvelopeSource::Parent);
    assert_eq!(check.consumed_amount, dec!(9000));
    assert_eq!(check.remaining_balance, Some(dec!(1000)));
    assert!(!check.sufficient);

    let own = validator(&db)
        .check_available(&parent, dec!(1000), &fy, true)
        .await
        .unwrap();
    assert_eq!(own.consumed_amount, dec!(9000));
    assert!(own.sufficient);
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database"]
async fn test_approving_a_leg_consumes_it() {
    let db = setup().await;
    let run = suffix();
    let fy = fiscal_year(&run);
    let owner = combo(&[(1, &format!("E200-{run}"))]);
    let ledger = PgTransferLedger::new(db.clone());

    let pending = leg(&owner, &fy, dec!(250.5), LegSide::Source, LedgerStatus::Pending);
    ledger.record(&pending).await.unwrap();

    let calculator = ConsumedBalanceCalculator::new(Arc::new(PgTransferLedger::new(db.clone())));
    assert_eq!(calculator.consumed(&owner, &fy).await.unwrap(), Decimal::ZERO);

    assert!(ledger.set_status(pending.id, LedgerStatus::Approved).await.unwrap());
    assert_eq!(calculator.consumed(&owner, &fy).await.unwrap(), dec!(250.5));

    assert!(!ledger.set_status(LedgerEntryId::new(), LedgerStatus::Approved).await.unwrap());
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database"]
async fn test_duplicate_active_envelope_rejected() {
    let db = setup().await;
    let run = suffix();
    let fy = fiscal_year(&run);
    let owner = combo(&[(1, &format!("E300-{run}")), (2, "A200")]);
    let store = EnvelopeStore::new(Arc::new(PgEnvelopeRepository::new(db)));

    let input = CreateEnvelopeInput {
        combination: owner.clone(),
        fiscal_year: fy.clone(),
        envelope_amount: dec!(500),
        description: Some("first".to_string()),
    };
    let created = store.create(input.clone()).await.unwrap();

    let result = store.create(input.clone()).await;
    assert!(matches!(result, Err(EngineError::DuplicateEnvelope { .. })));

    // A deactivated envelope frees the slot.
    store.deactivate(created.id).await.unwrap();
    assert!(store.find_exact(&owner, &fy).await.unwrap().is_none());
    let replacement = store.create(input).await.unwrap();
    assert_ne!(replacement.id, created.id);
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database"]
async fn test_ledger_write_failure_is_a_repository_error() {
    let db = setup().await;
    let run = suffix();
    let fy = fiscal_year(&run);
    let ledger = PgTransferLedger::new(db);
    let entry = leg(
        &combo(&[(1, &format!("E400-{run}"))]),
        &fy,
        dec!(-10),
        LegSide::Source,
        LedgerStatus::Approved,
    );

    ledger.record(&entry).await.unwrap();
    let err = ledger.record(&entry).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Repository);
}
