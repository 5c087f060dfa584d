//! Balance validation.

use budgetgate_shared::types::FiscalYear;
use rust_decimal::Decimal;
use tracing::debug;

use super::types::BalanceCheck;
use crate::consumption::{ConsumedBalanceCalculator, TransferLedger};
use crate::envelope::{EnvelopeRepository, HierarchicalEnvelopeResolver};
use crate::error::EngineError;
use crate::segment::{SegmentCombination, SegmentMasterData};

/// Reason reported when no envelope governs a combination.
pub const NO_ENVELOPE_REASON: &str = "no envelope configured for this combination or any ancestor";

/// Answers "can this combination fund this amount?".
///
/// Read-only: nothing is reserved or recorded.
pub struct BalanceValidator<E, S, L>
where
    E: EnvelopeRepository,
    S: SegmentMasterData,
    L: TransferLedger,
{
    resolver: HierarchicalEnvelopeResolver<E, S>,
    consumption: ConsumedBalanceCalculator<L>,
}

impl<E, S, L> BalanceValidator<E, S, L>
where
    E: EnvelopeRepository,
    S: SegmentMasterData,
    L: TransferLedger,
{
    /// Creates a new validator.
    #[must_use]
    pub fn new(
        resolver: HierarchicalEnvelopeResolver<E, S>,
        consumption: ConsumedBalanceCalculator<L>,
    ) -> Self {
        Self {
            resolver,
            consumption,
        }
    }

    /// Checks the balance available to `combination`.
    ///
    /// Consumption is measured against the resolved envelope: approved
    /// source legs of the owning combination plus those of every descendant
    /// combination whose own resolution lands on the same owner. A child
    /// with its own envelope spends from that envelope, not the parent's.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `required_amount` is negative
    /// - Envelope resolution fails (hierarchy cycle, depth guard)
    /// - A repository call fails
    pub async fn check_available(
        &self,
        combination: &SegmentCombination,
        required_amount: Decimal,
        fiscal_year: &FiscalYear,
        use_hierarchy: bool,
    ) -> Result<BalanceCheck, EngineError> {
        if required_amount < Decimal::ZERO {
            return Err(EngineError::NegativeAmount(required_amount));
        }

        let resolution = self
            .resolver
            .resolve(combination, fiscal_year, use_hierarchy)
            .await?;

        let (Some(envelope), Some(owner)) = (resolution.envelope, resolution.matched_combination)
        else {
            debug!(combination = %combination, fiscal_year = %fiscal_year, "No envelope");
            return Ok(BalanceCheck {
                available: false,
                sufficient: false,
                envelope_amount: None,
                consumed_amount: Decimal::ZERO,
                remaining_balance: None,
                required_amount,
                envelope_source: resolution.source,
                matched_combination: None,
                reason: Some(NO_ENVELOPE_REASON.to_string()),
            });
        };

        let consumed = self.consumed_against(&owner, fiscal_year).await?;
        let remaining = envelope.envelope_amount - consumed;
        let sufficient = remaining >= required_amount;

        debug!(
            combination = %combination,
            matched = %owner,
            source = resolution.source.as_str(),
            envelope = %envelope.envelope_amount,
            consumed = %consumed,
            remaining = %remaining,
            required = %required_amount,
            sufficient,
            "Balance checked"
        );

        let reason = (!sufficient).then(|| {
            format!(
                "insufficient balance: {remaining} remaining of {} in {owner}, {required_amount} required",
                envelope.envelope_amount
            )
        });

        Ok(BalanceCheck {
            available: true,
            sufficient,
            envelope_amount: Some(envelope.envelope_amount),
            consumed_amount: consumed,
            remaining_balance: Some(remaining),
            required_amount,
            envelope_source: resolution.source,
            matched_combination: Some(owner),
            reason,
        })
    }

    /// Everything spent from the envelope owned by `owner`.
    ///
    /// Spenders with a different key set can never resolve to `owner` and
    /// are skipped without a lookup.
    async fn consumed_against(
        &self,
        owner: &SegmentCombination,
        fiscal_year: &FiscalYear,
    ) -> Result<Decimal, EngineError> {
        let mut consumed = self.consumption.consumed(owner, fiscal_year).await?;
        let keys: Vec<_> = owner.keys().collect();

        for spender in self.consumption.spenders(fiscal_year).await? {
            if spender == *owner || !spender.contains_exactly(&keys) {
                continue;
            }
            let resolution = self.resolver.resolve(&spender, fiscal_year, true).await?;
            if resolution.matched_combination.as_ref() == Some(owner) {
                let drawn = self.consumption.consumed(&spender, fiscal_year).await?;
                debug!(owner = %owner, spender = %spender, drawn = %drawn, "Descendant spending");
                consumed += drawn;
            }
        }
        Ok(consumed)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use budgetgate_shared::types::{LedgerEntryId, TransferId};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::consumption::{LedgerEntry, LedgerStatus, LegSide};
    use crate::envelope::{CreateEnvelopeInput, EnvelopeSource, EnvelopeStore};
    use crate::memory::{InMemoryEnvelopeRepository, InMemorySegmentMaster, InMemoryTransferLedger};
    use crate::segment::SegmentHierarchyResolver;
    use crate::test_support::{combo, fy, segment_type};

    struct Fixture {
        envelopes: EnvelopeStore<InMemoryEnvelopeRepository>,
        ledger: Arc<InMemoryTransferLedger>,
        validator: BalanceValidator<InMemoryEnvelopeRepository, InMemorySegmentMaster, InMemoryTransferLedger>,
    }

    fn fixture() -> Fixture {
        let master = InMemorySegmentMaster::new();
        master.add_type(segment_type(1), "Entity", true);
        master.add_value(segment_type(1), "E100", None);
        master.add_value(segment_type(1), "E101", Some("E100"));
        master.add_value(segment_type(1), "E102", Some("E100"));

        let repo = Arc::new(InMemoryEnvelopeRepository::new());
        let ledger = Arc::new(InMemoryTransferLedger::new());
        let validator = BalanceValidator::new(
            HierarchicalEnvelopeResolver::new(
                Arc::clone(&repo),
                SegmentHierarchyResolver::new(Arc::new(master)),
            ),
            ConsumedBalanceCalculator::new(Arc::clone(&ledger)),
        );

        Fixture {
            envelopes: EnvelopeStore::new(repo),
            ledger,
            validator,
        }
    }

    impl Fixture {
        async fn envelope(&self, code: &str, amount: Decimal) {
            self.envelopes
                .create(CreateEnvelopeInput {
                    combination: combo(&[(1, code)]),
                    fiscal_year: fy("FY2025"),
                    envelope_amount: amount,
                    description: None,
                })
                .await
                .unwrap();
        }

        fn approved_source_leg(&self, code: &str, amount: Decimal) {
            self.ledger.record(LedgerEntry {
                id: LedgerEntryId::new(),
                transfer_id: TransferId::new(),
                combination: combo(&[(1, code)]),
                fiscal_year: fy("FY2025"),
                amount,
                side: LegSide::Source,
                status: LedgerStatus::Approved,
                recorded_at: Utc::now(),
            });
        }
    }

    #[tokio::test]
    async fn test_child_draws_on_parent_envelope() {
        let f = fixture();
        f.envelope("E100", dec!(100000)).await;

        let check = f
            .validator
            .check_available(&combo(&[(1, "E101")]), dec!(5000), &fy("FY2025"), true)
            .await
            .unwrap();

        assert!(check.available);
        assert!(check.sufficient);
        assert_eq!(check.envelope_source, EnvelopeSource::Parent);
        assert_eq!(check.envelope_amount, Some(dec!(100000)));
        assert_eq!(check.remaining_balance, Some(dec!(100000)));
        assert!(check.reason.is_none());
    }

    #[tokio::test]
    async fn test_own_envelope_takes_precedence() {
        let f = fixture();
        f.envelope("E100", dec!(100000)).await;
        f.envelope("E101", dec!(10000)).await;

        let check = f
            .validator
            .check_available(&combo(&[(1, "E101")]), dec!(5000), &fy("FY2025"), true)
            .await
            .unwrap();

        assert_eq!(check.envelope_source, EnvelopeSource::Exact);
        assert_eq!(check.envelope_amount, Some(dec!(10000)));
    }

    #[tokio::test]
    async fn test_owner_and_child_spending_both_consume_parent() {
        let f = fixture();
        f.envelope("E100", dec!(10000)).await;
        f.approved_source_leg("E100", dec!(-8000));
        f.approved_source_leg("E101", dec!(-1000));

        let check = f
            .validator
            .check_available(&combo(&[(1, "E101")]), dec!(1500), &fy("FY2025"), true)
            .await
            .unwrap();

        assert!(check.available);
        assert!(!check.sufficient);
        assert_eq!(check.consumed_amount, dec!(9000));
        assert_eq!(check.remaining_balance, Some(dec!(1000)));
        assert_eq!(check.shortfall(), dec!(500));
        assert!(check.reason.unwrap().starts_with("insufficient balance"));
    }

    #[tokio::test]
    async fn test_repeated_child_spending_exhausts_parent() {
        let f = fixture();
        f.envelope("E100", dec!(10000)).await;
        for _ in 0..5 {
            f.approved_source_leg("E101", dec!(-10000));
        }

        let check = f
            .validator
            .check_available(&combo(&[(1, "E101")]), dec!(5000), &fy("FY2025"), true)
            .await
            .unwrap();

        assert_eq!(check.envelope_source, EnvelopeSource::Parent);
        assert_eq!(check.consumed_amount, dec!(50000));
        assert_eq!(check.remaining_balance, Some(dec!(-40000)));
        assert!(!check.sufficient);

        // The owner sees the same consumption, hierarchy or not.
        let own = f
            .validator
            .check_available(&combo(&[(1, "E100")]), dec!(1), &fy("FY2025"), false)
            .await
            .unwrap();
        assert_eq!(own.envelope_source, EnvelopeSource::Exact);
        assert_eq!(own.consumed_amount, dec!(50000));
    }

    #[tokio::test]
    async fn test_sibling_spending_shares_parent_envelope() {
        let f = fixture();
        f.envelope("E100", dec!(10000)).await;
        f.approved_source_leg("E102", dec!(-6000));

        let check = f
            .validator
            .check_available(&combo(&[(1, "E101")]), dec!(5000), &fy("FY2025"), true)
            .await
            .unwrap();

        assert_eq!(check.consumed_amount, dec!(6000));
        assert_eq!(check.remaining_balance, Some(dec!(4000)));
        assert!(!check.sufficient);
    }

    #[tokio::test]
    async fn test_child_with_own_envelope_does_not_consume_parent() {
        let f = fixture();
        f.envelope("E100", dec!(10000)).await;
        f.envelope("E101", dec!(3000)).await;
        f.approved_source_leg("E101", dec!(-2000));
        // Different key set: never governed by the single-key parent envelope.
        f.ledger.record(LedgerEntry {
            id: LedgerEntryId::new(),
            transfer_id: TransferId::new(),
            combination: combo(&[(1, "E102"), (2, "A200")]),
            fiscal_year: fy("FY2025"),
            amount: dec!(-700),
            side: LegSide::Source,
            status: LedgerStatus::Approved,
            recorded_at: Utc::now(),
        });

        let parent = f
            .validator
            .check_available(&combo(&[(1, "E100")]), dec!(1), &fy("FY2025"), true)
            .await
            .unwrap();
        assert_eq!(parent.consumed_amount, Decimal::ZERO);

        let child = f
            .validator
            .check_available(&combo(&[(1, "E101")]), dec!(1000), &fy("FY2025"), true)
            .await
            .unwrap();
        assert_eq!(child.envelope_source, EnvelopeSource::Exact);
        assert_eq!(child.consumed_amount, dec!(2000));
        assert!(child.sufficient);
    }

    #[tokio::test]
    async fn test_exactly_remaining_is_sufficient() {
        let f = fixture();
        f.envelope("E100", dec!(10000)).await;
        f.approved_source_leg("E100", dec!(-4000));

        let check = f
            .validator
            .check_available(&combo(&[(1, "E100")]), dec!(6000), &fy("FY2025"), true)
            .await
            .unwrap();

        assert!(check.sufficient);
        assert_eq!(check.shortfall(), Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_no_envelope() {
        let f = fixture();
        let check = f
            .validator
            .check_available(&combo(&[(1, "E101")]), dec!(1), &fy("FY2025"), true)
            .await
            .unwrap();

        assert!(!check.available);
        assert!(!check.sufficient);
        assert_eq!(check.envelope_source, EnvelopeSource::None);
        assert_eq!(check.reason.as_deref(), Some(NO_ENVELOPE_REASON));
        assert_eq!(check.shortfall(), dec!(1));
    }

    #[tokio::test]
    async fn test_hierarchy_disabled() {
        let f = fixture();
        f.envelope("E100", dec!(100000)).await;

        let check = f
            .validator
            .check_available(&combo(&[(1, "E101")]), dec!(1), &fy("FY2025"), false)
            .await
            .unwrap();

        assert!(!check.available);
    }

    #[tokio::test]
    async fn test_negative_required_amount_rejected() {
        let f = fixture();
        let result = f
            .validator
            .check_available(&combo(&[(1, "E100")]), dec!(-1), &fy("FY2025"), true)
            .await;
        assert!(matches!(result, Err(EngineError::NegativeAmount(_))));
    }
}
