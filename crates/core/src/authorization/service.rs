//! Transfer authorization.
//!
//! Authorization answers "may this transfer happen?" and nothing more. It
//! never records usage; callers that commit the transfer call
//! [`TransferAuthorizationFacade::record_usage`] afterwards.

use budgetgate_shared::types::FiscalYear;
use budgetgate_shared::{AuthorizationMode, EngineConfig};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use super::types::AuthorizationDecision;
use crate::balance::{BalanceCheck, BalanceValidator};
use crate::consumption::TransferLedger;
use crate::envelope::EnvelopeRepository;
use crate::error::EngineError;
use crate::limit::{TransferLimitRepository, TransferLimitValidator, UsageOutcome};
use crate::mapping::{MappingRepository, SegmentMappingResolver};
use crate::segment::{SegmentCombination, SegmentMasterData};

/// Reason reported when a transfer would move funds onto itself.
pub const IDENTICAL_COMBINATIONS_REASON: &str =
    "source and destination combinations are identical";

/// Single entry point combining mappings, limits and balance checks.
pub struct TransferAuthorizationFacade<E, S, L, M, T>
where
    E: EnvelopeRepository,
    S: SegmentMasterData,
    L: TransferLedger,
    M: MappingRepository,
    T: TransferLimitRepository,
{
    balance: BalanceValidator<E, S, L>,
    mappings: SegmentMappingResolver<M>,
    limits: TransferLimitValidator<T>,
    config: EngineConfig,
}

/// Accumulates denial reasons and knows when to stop.
struct Denials {
    mode: AuthorizationMode,
    reasons: Vec<String>,
}

impl Denials {
    fn push(&mut self, reason: impl Into<String>) {
        self.reasons.push(reason.into());
    }

    fn should_stop(&self) -> bool {
        self.mode == AuthorizationMode::FailFast && !self.reasons.is_empty()
    }
}

impl<E, S, L, M, T> TransferAuthorizationFacade<E, S, L, M, T>
where
    E: EnvelopeRepository,
    S: SegmentMasterData,
    L: TransferLedger,
    M: MappingRepository,
    T: TransferLimitRepository,
{
    /// Creates a new facade.
    #[must_use]
    pub fn new(
        balance: BalanceValidator<E, S, L>,
        mappings: SegmentMappingResolver<M>,
        limits: TransferLimitValidator<T>,
        config: EngineConfig,
    ) -> Self {
        Self {
            balance,
            mappings,
            limits,
            config,
        }
    }

    /// Balance validator used by the facade.
    #[must_use]
    pub const fn balance(&self) -> &BalanceValidator<E, S, L> {
        &self.balance
    }

    /// Mapping resolver used by the facade.
    #[must_use]
    pub const fn mappings(&self) -> &SegmentMappingResolver<M> {
        &self.mappings
    }

    /// Limit validator used by the facade.
    #[must_use]
    pub const fn limits(&self) -> &TransferLimitValidator<T> {
        &self.limits
    }

    /// Engine settings.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Balance check honouring the configured hierarchy setting.
    ///
    /// # Errors
    ///
    /// See [`BalanceValidator::check_available`].
    pub async fn check_available(
        &self,
        combination: &SegmentCombination,
        required_amount: Decimal,
        fiscal_year: &FiscalYear,
    ) -> Result<BalanceCheck, EngineError> {
        self.balance
            .check_available(
                combination,
                required_amount,
                fiscal_year,
                self.config.use_hierarchy,
            )
            .await
    }

    /// Authorizes a transfer in the configured mode.
    ///
    /// # Errors
    ///
    /// See [`Self::authorize_with_mode`].
    pub async fn authorize(
        &self,
        from: &SegmentCombination,
        to: &SegmentCombination,
        amount: Decimal,
        fiscal_year: &FiscalYear,
    ) -> Result<AuthorizationDecision, EngineError> {
        self.authorize_with_mode(from, to, amount, fiscal_year, self.config.authorization_mode)
            .await
    }

    /// Authorizes a transfer.
    ///
    /// Checks run in order: mapping rewrite, identical endpoints, transfer
    /// limits, then the source balance. The destination balance is never
    /// checked. In fail-fast mode the first failing check decides; in
    /// full-report mode every check that can run does.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `amount` is not positive
    /// - Master data is inconsistent (hierarchy cycle, depth guard)
    /// - A repository call fails
    pub async fn authorize_with_mode(
        &self,
        from: &SegmentCombination,
        to: &SegmentCombination,
        amount: Decimal,
        fiscal_year: &FiscalYear,
        mode: AuthorizationMode,
    ) -> Result<AuthorizationDecision, EngineError> {
        if amount <= Decimal::ZERO {
            return Err(EngineError::NonPositiveAmount(amount));
        }

        let mut denials = Denials {
            mode,
            reasons: Vec::new(),
        };

        let effective_from = self.effective(from, &mut denials).await?;
        let effective_to = if denials.should_stop() {
            to.clone()
        } else {
            self.effective(to, &mut denials).await?
        };

        let mut decision = AuthorizationDecision {
            allowed: false,
            reasons: Vec::new(),
            effective_from,
            effective_to,
            limits: None,
            balance: None,
        };

        if !denials.should_stop() && decision.effective_from == decision.effective_to {
            denials.push(IDENTICAL_COMBINATIONS_REASON);
        }

        if !denials.should_stop() {
            let validation = self
                .limits
                .validate_transfer(&decision.effective_from, &decision.effective_to, fiscal_year)
                .await?;
            for reason in validation.reasons() {
                denials.push(reason);
            }
            decision.limits = Some(validation);
        }

        if !denials.should_stop() {
            let check = self
                .check_available(&decision.effective_from, amount, fiscal_year)
                .await?;
            if !check.sufficient
                && let Some(reason) = &check.reason
            {
                denials.push(reason.clone());
            }
            decision.balance = Some(check);
        }

        decision.reasons = denials.reasons;
        decision.allowed = decision.reasons.is_empty();

        if decision.allowed {
            info!(
                from = %decision.effective_from,
                to = %decision.effective_to,
                amount = %amount,
                fiscal_year = %fiscal_year,
                "Transfer authorized"
            );
        } else {
            debug!(
                from = %decision.effective_from,
                to = %decision.effective_to,
                amount = %amount,
                reasons = ?decision.reasons,
                "Transfer denied"
            );
        }

        Ok(decision)
    }

    /// Records a committed transfer against the usage counters.
    ///
    /// Combinations go through the same mapping rewrite as [`Self::authorize`].
    ///
    /// # Errors
    ///
    /// Returns an error if a mapping is ambiguous or a repository call fails.
    /// A ceiling reached since authorization is a denied outcome.
    pub async fn record_usage(
        &self,
        from: &SegmentCombination,
        to: &SegmentCombination,
        fiscal_year: &FiscalYear,
    ) -> Result<UsageOutcome, EngineError> {
        let (from, to) = if self.config.apply_mappings {
            (
                self.mappings.apply_to_combination(from).await?,
                self.mappings.apply_to_combination(to).await?,
            )
        } else {
            (from.clone(), to.clone())
        };
        self.limits.record_usage(&from, &to, fiscal_year).await
    }

    /// Applies mappings when enabled. An ambiguous mapping becomes a denial
    /// and the combination is used as given.
    async fn effective(
        &self,
        combination: &SegmentCombination,
        denials: &mut Denials,
    ) -> Result<SegmentCombination, EngineError> {
        if !self.config.apply_mappings {
            return Ok(combination.clone());
        }
        match self.mappings.apply_to_combination(combination).await {
            Ok(mapped) => Ok(mapped),
            Err(err @ EngineError::AmbiguousMapping { .. }) => {
                warn!(combination = %combination, error = %err, "Ambiguous segment mapping");
                denials.push(err.to_string());
                Ok(combination.clone())
            }
            Err(err) => Err(err),
        }
    }
}
