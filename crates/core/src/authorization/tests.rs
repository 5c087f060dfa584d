//! Tests for transfer authorization.

use std::sync::Arc;

use budgetgate_shared::types::{LedgerEntryId, TransferId};
use budgetgate_shared::{AuthorizationMode, EngineConfig};
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::service::{IDENTICAL_COMBINATIONS_REASON, TransferAuthorizationFacade};
use crate::balance::{BalanceValidator, NO_ENVELOPE_REASON};
use crate::consumption::{ConsumedBalanceCalculator, LedgerEntry, LedgerStatus, LegSide};
use crate::envelope::{CreateEnvelopeInput, EnvelopeSource, EnvelopeStore, HierarchicalEnvelopeResolver};
use crate::error::EngineError;
use crate::limit::{CreateTransferLimitInput, TransferLimitValidator};
use crate::mapping::{CreateMappingInput, MappingKind, SegmentMappingResolver};
use crate::memory::{
    InMemoryEnvelopeRepository, InMemoryMappingRepository, InMemorySegmentMaster,
    InMemoryTransferLedger, InMemoryTransferLimitRepository,
};
use crate::segment::{SegmentCombination, SegmentHierarchyResolver};
use crate::test_support::{combo, fy, segment_type};

type Facade = TransferAuthorizationFacade<
    InMemoryEnvelopeRepository,
    InMemorySegmentMaster,
    InMemoryTransferLedger,
    InMemoryMappingRepository,
    InMemoryTransferLimitRepository,
>;

struct Fixture {
    envelopes: EnvelopeStore<InMemoryEnvelopeRepository>,
    ledger: Arc<InMemoryTransferLedger>,
    facade: Facade,
}

fn fixture_with(config: EngineConfig) -> Fixture {
    let master = InMemorySegmentMaster::new();
    master.add_type(segment_type(1), "Entity", true);
    master.add_type(segment_type(2), "Account", false);
    master.add_value(segment_type(1), "E000", None);
    master.add_value(segment_type(1), "E001", Some("E000"));
    master.add_value(segment_type(1), "E100", Some("E000"));
    master.add_value(segment_type(1), "E101", Some("E100"));
    master.add_value(segment_type(1), "E200", Some("E000"));

    let envelope_repo = Arc::new(InMemoryEnvelopeRepository::new());
    let ledger = Arc::new(InMemoryTransferLedger::new());
    let resolver = HierarchicalEnvelopeResolver::with_max_depth(
        Arc::clone(&envelope_repo),
        SegmentHierarchyResolver::new(Arc::new(master)),
        config.max_hierarchy_depth,
    );

    let facade = TransferAuthorizationFacade::new(
        BalanceValidator::new(resolver, ConsumedBalanceCalculator::new(Arc::clone(&ledger))),
        SegmentMappingResolver::new(Arc::new(InMemoryMappingRepository::new())),
        TransferLimitValidator::new(Arc::new(InMemoryTransferLimitRepository::new())),
        config,
    );

    Fixture {
        envelopes: EnvelopeStore::new(envelope_repo),
        ledger,
        facade,
    }
}

fn fixture() -> Fixture {
    fixture_with(EngineConfig::default())
}

impl Fixture {
    async fn envelope(&self, combination: SegmentCombination, amount: Decimal) {
        self.envelopes
            .create(CreateEnvelopeInput {
                combination,
                fiscal_year: fy("FY2025"),
                envelope_amount: amount,
                description: None,
            })
            .await
            .unwrap();
    }

    async fn limit(&self, input: CreateTransferLimitInput) {
        self.facade.limits().create_limit(input).await.unwrap();
    }

    async fn mapping(&self, segment: i32, source: &str, target: &str) {
        self.facade
            .mappings()
            .create_mapping(CreateMappingInput {
                segment_type: segment_type(segment),
                source_code: source.to_string(),
                target_code: target.to_string(),
                kind: MappingKind::Consolidation,
                description: None,
            })
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn test_allowed_transfer() {
    let f = fixture();
    f.envelope(combo(&[(1, "E100")]), dec!(100000)).await;

    let decision = f
        .facade
        .authorize(&combo(&[(1, "E101")]), &combo(&[(1, "E200")]), dec!(5000), &fy("FY2025"))
        .await
        .unwrap();

    assert!(decision.allowed);
    assert!(decision.reasons.is_empty());
    let balance = decision.balance.unwrap();
    assert_eq!(balance.envelope_source, EnvelopeSource::Parent);
    assert_eq!(balance.envelope_amount, Some(dec!(100000)));
    assert!(decision.limits.unwrap().valid);
}

#[tokio::test]
async fn test_source_not_allowed() {
    let f = fixture();
    f.envelope(combo(&[(1, "E001")]), dec!(50000)).await;
    f.limit(CreateTransferLimitInput {
        is_allowed_as_source: false,
        ..CreateTransferLimitInput::permissive(combo(&[(1, "E001")]), fy("FY2025"))
    })
    .await;

    let decision = f
        .facade
        .authorize(&combo(&[(1, "E001")]), &combo(&[(1, "E200")]), dec!(100), &fy("FY2025"))
        .await
        .unwrap();

    assert!(!decision.allowed);
    assert!(decision.primary_reason().unwrap().contains("not allowed as source"));
    // Fail-fast: the balance check never ran.
    assert!(decision.balance.is_none());
}

#[tokio::test]
async fn test_full_report_collects_every_reason() {
    let f = fixture();
    f.limit(CreateTransferLimitInput {
        is_allowed_as_source: false,
        ..CreateTransferLimitInput::permissive(combo(&[(1, "E001")]), fy("FY2025"))
    })
    .await;
    f.limit(CreateTransferLimitInput {
        max_target_transfers: Some(0),
        ..CreateTransferLimitInput::permissive(combo(&[(1, "E200")]), fy("FY2025"))
    })
    .await;

    let decision = f
        .facade
        .authorize_with_mode(
            &combo(&[(1, "E001")]),
            &combo(&[(1, "E200")]),
            dec!(100),
            &fy("FY2025"),
            AuthorizationMode::FullReport,
        )
        .await
        .unwrap();

    assert!(!decision.allowed);
    assert_eq!(
        decision.reasons,
        vec![
            "combination {1=E001} is not allowed as source".to_string(),
            "target limit reached (0/0)".to_string(),
            NO_ENVELOPE_REASON.to_string(),
        ]
    );
    assert!(decision.balance.is_some());
}

#[tokio::test]
async fn test_configured_mode_is_the_default() {
    let f = fixture_with(EngineConfig {
        authorization_mode: AuthorizationMode::FullReport,
        ..EngineConfig::default()
    });
    f.limit(CreateTransferLimitInput {
        is_transfer_allowed: false,
        ..CreateTransferLimitInput::permissive(combo(&[(1, "E001")]), fy("FY2025"))
    })
    .await;

    let decision = f
        .facade
        .authorize(&combo(&[(1, "E001")]), &combo(&[(1, "E200")]), dec!(1), &fy("FY2025"))
        .await
        .unwrap();

    assert_eq!(decision.reasons.len(), 2);
    assert_eq!(decision.reasons[1], NO_ENVELOPE_REASON);
}

#[tokio::test]
async fn test_insufficient_source_balance() {
    let f = fixture();
    f.envelope(combo(&[(1, "E100")]), dec!(1000)).await;
    f.ledger.record(LedgerEntry {
        id: LedgerEntryId::new(),
        transfer_id: TransferId::new(),
        combination: combo(&[(1, "E100")]),
        fiscal_year: fy("FY2025"),
        amount: dec!(-900),
        side: LegSide::Source,
        status: LedgerStatus::Approved,
        recorded_at: Utc::now(),
    });

    let decision = f
        .facade
        .authorize(&combo(&[(1, "E101")]), &combo(&[(1, "E200")]), dec!(200), &fy("FY2025"))
        .await
        .unwrap();

    assert!(!decision.allowed);
    let balance = decision.balance.unwrap();
    assert_eq!(balance.remaining_balance, Some(dec!(100)));
    assert!(decision.reasons[0].starts_with("insufficient balance"));
}

#[tokio::test]
async fn test_destination_balance_is_not_checked() {
    let f = fixture();
    // Only the source has an envelope; the destination has none at all.
    f.envelope(combo(&[(1, "E100")]), dec!(1000)).await;

    let decision = f
        .facade
        .authorize(&combo(&[(1, "E100")]), &combo(&[(1, "E200")]), dec!(500), &fy("FY2025"))
        .await
        .unwrap();

    assert!(decision.allowed);
}

#[tokio::test]
async fn test_identical_combinations_denied() {
    let f = fixture();
    f.envelope(combo(&[(1, "E100")]), dec!(1000)).await;

    let decision = f
        .facade
        .authorize(&combo(&[(1, "E100")]), &combo(&[(1, "E100")]), dec!(1), &fy("FY2025"))
        .await
        .unwrap();

    assert!(!decision.allowed);
    assert_eq!(decision.reasons, vec![IDENTICAL_COMBINATIONS_REASON.to_string()]);
}

#[tokio::test]
async fn test_mapping_collapses_endpoints() {
    let f = fixture();
    f.envelope(combo(&[(1, "E100")]), dec!(1000)).await;
    f.mapping(1, "E101", "E100").await;

    let decision = f
        .facade
        .authorize(&combo(&[(1, "E101")]), &combo(&[(1, "E100")]), dec!(1), &fy("FY2025"))
        .await
        .unwrap();

    assert_eq!(decision.effective_from, combo(&[(1, "E100")]));
    assert_eq!(decision.reasons, vec![IDENTICAL_COMBINATIONS_REASON.to_string()]);
}

#[tokio::test]
async fn test_mapping_disabled() {
    let f = fixture_with(EngineConfig {
        apply_mappings: false,
        ..EngineConfig::default()
    });
    f.envelope(combo(&[(1, "E100")]), dec!(1000)).await;
    f.mapping(1, "E101", "E100").await;

    let decision = f
        .facade
        .authorize(&combo(&[(1, "E101")]), &combo(&[(1, "E100")]), dec!(1), &fy("FY2025"))
        .await
        .unwrap();

    assert!(decision.allowed);
    assert_eq!(decision.effective_from, combo(&[(1, "E101")]));
}

#[tokio::test]
async fn test_ambiguous_mapping_is_a_denial() {
    let f = fixture();
    f.mapping(2, "X", "Y").await;
    f.mapping(2, "X", "Z").await;

    let decision = f
        .facade
        .authorize(
            &combo(&[(1, "E100"), (2, "X")]),
            &combo(&[(1, "E200"), (2, "Y")]),
            dec!(1),
            &fy("FY2025"),
        )
        .await
        .unwrap();

    assert!(!decision.allowed);
    assert_eq!(
        decision.reasons,
        vec!["mapping ambiguous: code X maps to both Y and Z".to_string()]
    );
    assert!(decision.limits.is_none());
}

#[tokio::test]
async fn test_non_positive_amount_is_an_error() {
    let f = fixture();
    for amount in [Decimal::ZERO, dec!(-5)] {
        let result = f
            .facade
            .authorize(&combo(&[(1, "E100")]), &combo(&[(1, "E200")]), amount, &fy("FY2025"))
            .await;
        assert!(matches!(result, Err(EngineError::NonPositiveAmount(_))));
    }
}

#[tokio::test]
async fn test_authorize_never_records_usage() {
    let f = fixture();
    let from = combo(&[(1, "E100")]);
    let to = combo(&[(1, "E200")]);
    f.envelope(from.clone(), dec!(1000)).await;
    f.limit(CreateTransferLimitInput {
        max_source_transfers: Some(1),
        ..CreateTransferLimitInput::permissive(from.clone(), fy("FY2025"))
    })
    .await;

    for _ in 0..3 {
        let decision = f.facade.authorize(&from, &to, dec!(10), &fy("FY2025")).await.unwrap();
        assert!(decision.allowed);
    }
    let limit = f.facade.limits().find_limit(&from, &fy("FY2025")).await.unwrap().unwrap();
    assert_eq!(limit.source_count, 0);

    let outcome = f.facade.record_usage(&from, &to, &fy("FY2025")).await.unwrap();
    assert!(outcome.recorded);
    assert_eq!(outcome.source_count, Some(1));

    let decision = f.facade.authorize(&from, &to, dec!(10), &fy("FY2025")).await.unwrap();
    assert!(!decision.allowed);
    assert_eq!(decision.primary_reason(), Some("source limit reached (1/1)"));

    let second = f.facade.record_usage(&from, &to, &fy("FY2025")).await.unwrap();
    assert!(!second.recorded);
    assert_eq!(second.reason.as_deref(), Some("source limit reached (1/1)"));
}

#[tokio::test]
async fn test_record_usage_applies_mappings() {
    let f = fixture();
    let consolidated = combo(&[(1, "E100")]);
    f.mapping(1, "E101", "E100").await;
    f.limit(CreateTransferLimitInput::permissive(consolidated.clone(), fy("FY2025")))
        .await;

    f.facade
        .record_usage(&combo(&[(1, "E101")]), &combo(&[(1, "E200")]), &fy("FY2025"))
        .await
        .unwrap();

    let limit = f
        .facade
        .limits()
        .find_limit(&consolidated, &fy("FY2025"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(limit.source_count, 1);
}
