//! Engine façade over analytics, batch processing, and pattern detection
//!
//! Every operation authenticates the caller first (a `None` user is
//! rejected before any collaborator is touched), resolves which accounts
//! the user may see, then drives the pure modules with data fetched
//! through the collaborator traits.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::aggregate::{
    average_transaction_size, date_range, group_transactions, net_amount, AnalyticsCriteria,
    AnalyticsSummary,
};
use crate::batch::{BatchDispatcher, BatchOutcome, BatchRequest, BatchValidator, ValidationLimits};
use crate::error::{Error, Result};
use crate::models::{Granularity, TransactionStatus};
use crate::patterns::{PatternConfig, PatternCriteria, PatternMiner, PatternReport};
use crate::sources::{
    AccountSource, PostProcessor, RiskAnalyzer, StrategyProcessor, TransactionFilter,
    TransactionSource,
};

/// The single entry point callers hold. Collaborators are shared handles,
/// so one engine can serve concurrent callers.
pub struct AnalyticsEngine {
    transactions: Arc<dyn TransactionSource>,
    accounts: Arc<dyn AccountSource>,
    risk: Arc<dyn RiskAnalyzer>,
    strategies: Arc<dyn StrategyProcessor>,
    post: Arc<dyn PostProcessor>,
    limits: ValidationLimits,
    pattern_config: PatternConfig,
}

impl AnalyticsEngine {
    pub fn new(
        transactions: Arc<dyn TransactionSource>,
        accounts: Arc<dyn AccountSource>,
        risk: Arc<dyn RiskAnalyzer>,
        strategies: Arc<dyn StrategyProcessor>,
        post: Arc<dyn PostProcessor>,
    ) -> Self {
        Self {
            transactions,
            accounts,
            risk,
            strategies,
            post,
            limits: ValidationLimits::default(),
            pattern_config: PatternConfig::default(),
        }
    }

    pub fn with_limits(mut self, limits: ValidationLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_pattern_config(mut self, config: PatternConfig) -> Self {
        self.pattern_config = config;
        self
    }

    /// Aggregate the caller's transactions along one grouping dimension.
    ///
    /// Fails with `InvalidArgument` when the user has no accounts at all,
    /// since there is nothing meaningful to aggregate.
    pub async fn analytics_summary(
        &self,
        user: Option<Uuid>,
        criteria: &AnalyticsCriteria,
    ) -> Result<AnalyticsSummary> {
        let user_id = user.ok_or(Error::Unauthorized)?;
        let account_ids = self.accounts.authorized_account_ids(user_id, None).await?;
        if account_ids.is_empty() {
            return Err(Error::InvalidArgument("no accounts found for user".to_string()));
        }

        let filter = TransactionFilter::for_accounts(account_ids)
            .between(criteria.from, criteria.to)
            .exclude_pending(criteria.exclude_pending);
        let transactions = self.transactions.fetch(&filter).await?;

        let granularity = Granularity::from_days(criteria.granularity_days);
        let results = group_transactions(&transactions, criteria.group_by, granularity);
        let risk = self.risk.user_risk_metrics(user_id).await?;

        tracing::info!(
            user_id = %user_id,
            group_by = %criteria.group_by,
            transactions = transactions.len(),
            groups = results.len(),
            "analytics summary generated"
        );

        Ok(AnalyticsSummary {
            user_id,
            group_by: criteria.group_by,
            granularity_days: criteria.granularity_days,
            results,
            total_transactions: transactions.len(),
            total_net_amount: net_amount(&transactions),
            average_transaction_size: average_transaction_size(&transactions),
            date_range: date_range(&transactions),
            generated_at: Utc::now(),
            risk,
        })
    }

    /// Validate a batch of drafts and, unless `validate_only` is set or
    /// any draft is rejected, process all of them.
    ///
    /// A rejected batch surfaces as `Error::ValidationFailed` carrying the
    /// full outcome; a `validate_only` run returns the outcome directly
    /// regardless of rejections. Nothing is posted in either case.
    pub async fn process_batch(
        &self,
        user: Option<Uuid>,
        request: &BatchRequest,
    ) -> Result<BatchOutcome> {
        let user_id = user.ok_or(Error::Unauthorized)?;
        if request.transactions.is_empty() {
            return Ok(BatchOutcome::completed(
                0,
                Vec::new(),
                Vec::new(),
                request.batch_reference.clone(),
            ));
        }

        let mut requested: Vec<Uuid> = Vec::new();
        for draft in &request.transactions {
            if !requested.contains(&draft.account_id) {
                requested.push(draft.account_id);
            }
        }
        let authorized = self
            .accounts
            .authorized_account_ids(user_id, Some(&requested))
            .await?;
        if let Some(offender) = requested.iter().find(|id| !authorized.contains(id)) {
            tracing::warn!(
                user_id = %user_id,
                account_id = %offender,
                "batch references an account the user does not own"
            );
            return Err(Error::NotAuthorizedForAccount(*offender));
        }

        let validator =
            BatchValidator::with_limits(self.accounts.as_ref(), self.risk.as_ref(), self.limits.clone());
        let mut validation = Vec::with_capacity(request.transactions.len());
        for draft in &request.transactions {
            validation.push(validator.validate(draft, user_id).await?);
        }

        let total = request.transactions.len();
        if request.validate_only {
            tracing::info!(user_id = %user_id, total, "batch validated without processing");
            return Ok(BatchOutcome::validated(
                total,
                validation,
                request.batch_reference.clone(),
            ));
        }
        if validation.iter().any(|v| !v.is_valid) {
            let outcome = BatchOutcome::failed(total, validation, request.batch_reference.clone());
            tracing::warn!(
                user_id = %user_id,
                rejected = outcome.rejected_count(),
                total,
                "batch rejected by validation"
            );
            return Err(Error::ValidationFailed(outcome));
        }

        let dispatcher = BatchDispatcher::new(self.strategies.as_ref(), self.post.as_ref());
        let processed = dispatcher.dispatch(&request.transactions, user_id).await?;

        tracing::info!(user_id = %user_id, processed = processed.len(), "batch completed");
        Ok(BatchOutcome::completed(
            total,
            validation,
            processed,
            request.batch_reference.clone(),
        ))
    }

    /// Mine the caller's completed transactions for recurring patterns.
    ///
    /// Thin history is not an error: the report comes back empty with a
    /// message explaining why.
    pub async fn detect_patterns(
        &self,
        user: Option<Uuid>,
        criteria: &PatternCriteria,
    ) -> Result<PatternReport> {
        let user_id = user.ok_or(Error::Unauthorized)?;
        let account_ids = self.accounts.authorized_account_ids(user_id, None).await?;

        let filter = TransactionFilter::for_accounts(account_ids)
            .between(criteria.from, criteria.to)
            .with_status(TransactionStatus::Completed);
        let transactions = self.transactions.fetch(&filter).await?;

        let miner = PatternMiner::with_config(self.pattern_config.clone());
        let report = miner.detect(&transactions, criteria);

        tracing::info!(
            user_id = %user_id,
            transactions = transactions.len(),
            patterns = report.pattern_count,
            "pattern detection finished"
        );
        Ok(report)
    }
}
