//! Concurrency properties of usage recording.

use std::sync::Arc;

use proptest::prelude::*;
use tokio::task::JoinSet;

use super::service::{TransferLimitRepository, TransferLimitValidator};
use super::types::{CreateTransferLimitInput, UpdateTransferLimitInput, UsageField};
use crate::error::EngineError;
use crate::memory::InMemoryTransferLimitRepository;
use crate::test_support::{combo, fy};

/// Runs `calls` concurrent `record_usage` calls against a source ceiling and
/// returns (successes, denials, final source count).
async fn race(ceiling: i32, calls: usize) -> (usize, usize, i32) {
    let repo = Arc::new(InMemoryTransferLimitRepository::new());
    let validator = Arc::new(TransferLimitValidator::new(Arc::clone(&repo)));
    let from = combo(&[(1, "E100")]);
    let to = combo(&[(1, "E200")]);

    validator
        .create_limit(CreateTransferLimitInput {
            max_source_transfers: Some(ceiling),
            ..CreateTransferLimitInput::permissive(from.clone(), fy("FY2025"))
        })
        .await
        .unwrap();

    let mut tasks = JoinSet::new();
    for _ in 0..calls {
        let validator = Arc::clone(&validator);
        let from = from.clone();
        let to = to.clone();
        tasks.spawn(async move { validator.record_usage(&from, &to, &fy("FY2025")).await });
    }

    let mut successes = 0;
    let mut denials = 0;
    while let Some(joined) = tasks.join_next().await {
        let outcome = joined.unwrap().unwrap();
        if outcome.recorded {
            successes += 1;
        } else {
            denials += 1;
            assert_eq!(
                outcome.reason,
                Some(format!("source limit reached ({ceiling}/{ceiling})"))
            );
        }
    }

    let count = repo
        .find_exact(&from, &fy("FY2025"))
        .await
        .unwrap()
        .unwrap()
        .source_count;
    (successes, denials, count)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_recording_stops_at_ceiling() {
    let (successes, denials, count) = race(5, 40).await;
    assert_eq!(successes, 5);
    assert_eq!(denials, 35);
    assert_eq!(count, 5);
}

#[tokio::test]
async fn test_limit_reached_after_two_transfers() {
    let validator = TransferLimitValidator::new(Arc::new(InMemoryTransferLimitRepository::new()));
    let from = combo(&[(1, "E100")]);
    let to = combo(&[(1, "E200")]);
    validator
        .create_limit(CreateTransferLimitInput {
            max_source_transfers: Some(2),
            ..CreateTransferLimitInput::permissive(from.clone(), fy("FY2025"))
        })
        .await
        .unwrap();

    for _ in 0..2 {
        assert!(validator.record_usage(&from, &to, &fy("FY2025")).await.unwrap().recorded);
    }

    let decision = validator.can_be_source(&from, &fy("FY2025")).await.unwrap();
    assert!(!decision.allowed);
    assert_eq!(decision.reason.as_deref(), Some("source limit reached (2/2)"));
    assert_eq!((decision.count, decision.ceiling), (2, Some(2)));
}

#[tokio::test]
async fn test_single_increment_respects_ceiling() {
    let repo = Arc::new(InMemoryTransferLimitRepository::new());
    let validator = TransferLimitValidator::new(Arc::clone(&repo));
    let combination = combo(&[(1, "E100")]);

    assert_eq!(
        repo.atomic_increment(&combination, &fy("FY2025"), UsageField::Target)
            .await
            .unwrap(),
        None
    );

    let limit = validator
        .create_limit(CreateTransferLimitInput {
            max_target_transfers: Some(1),
            ..CreateTransferLimitInput::permissive(combination.clone(), fy("FY2025"))
        })
        .await
        .unwrap();

    assert_eq!(
        repo.atomic_increment(&combination, &fy("FY2025"), UsageField::Target)
            .await
            .unwrap(),
        Some(1)
    );
    assert!(matches!(
        repo.atomic_increment(&combination, &fy("FY2025"), UsageField::Target)
            .await,
        Err(EngineError::CeilingReached {
            field: UsageField::Target,
            count: 1,
            max: 1
        })
    ));

    // Saving flags never resets a counter.
    let mut edited = limit.clone();
    edited.is_allowed_as_source = false;
    edited.target_count = 0;
    let saved = repo.save(&edited).await.unwrap();
    assert_eq!(saved.target_count, 1);

    // Raising the ceiling reopens the counter.
    let raised = validator
        .update_limit(
            limit.id,
            UpdateTransferLimitInput {
                max_target_transfers: Some(Some(2)),
                ..UpdateTransferLimitInput::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(raised.max_target_transfers, Some(2));
    assert!(validator.can_be_target(&combination, &fy("FY2025")).await.unwrap().allowed);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// k concurrent recordings against ceiling c < k: exactly c succeed and
    /// the counter ends at c.
    #[test]
    fn prop_exactly_ceiling_successes(ceiling in 0i32..12, extra in 1usize..20) {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(4)
            .enable_all()
            .build()
            .unwrap();
        let calls = usize::try_from(ceiling).unwrap() + extra;
        let (successes, denials, count) = runtime.block_on(race(ceiling, calls));

        prop_assert_eq!(successes, usize::try_from(ceiling).unwrap());
        prop_assert_eq!(denials, extra);
        prop_assert_eq!(count, ceiling);
    }
}
