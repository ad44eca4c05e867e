//! Batch validation and strategy dispatch
//!
//! A batch run has two stages. Validation checks every draft independently
//! and collects per-transaction failures without stopping early. Dispatch
//! routes each accepted draft to exactly one processing strategy, then runs
//! the post-processing hooks. The engine decides whether dispatch happens
//! at all (`validate_only` requests and batches with any rejected draft
//! never reach dispatch).

use chrono::{DateTime, Utc};
use regex::Regex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{SplitInfo, TransactionStatus};
use crate::sources::{AccountSource, PostProcessor, RiskAnalyzer, StrategyProcessor};

/// Currency that needs no conversion before posting.
pub const BASE_CURRENCY: &str = "USD";

/// Description text that looks like a card or account number. The marker
/// word may be followed by `#` or `:`, and the four digit groups may be
/// separated by hyphens, spaces, or asterisks.
const SENSITIVE_PATTERN: &str =
    r"(?i)(card|account)\s*[#:]?\s*\d{4}[-\s*]\d{4}[-\s*]\d{4}[-\s*]\d{4}";

// ========== Batch Request Models ==========

/// An unposted transaction submitted for batch processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionDraft {
    /// Client-assigned id. A fresh one is generated when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub account_id: Uuid,
    /// Signed amount; negative is a debit.
    pub amount: Decimal,
    /// Posting date. Defaults to the processing time when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant_name: Option<String>,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence_pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split: Option<SplitInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_amount: Option<Decimal>,
}

impl TransactionDraft {
    pub fn new(account_id: Uuid, amount: Decimal, description: impl Into<String>) -> Self {
        Self {
            id: None,
            account_id,
            amount,
            date: None,
            description: description.into(),
            category_id: None,
            category_name: None,
            merchant_name: None,
            is_recurring: false,
            recurrence_pattern: None,
            split: None,
            original_currency: None,
            original_amount: None,
        }
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }

    pub fn with_recurring(mut self, pattern: impl Into<String>) -> Self {
        self.is_recurring = true;
        self.recurrence_pattern = Some(pattern.into());
        self
    }

    pub fn with_split(mut self, split: SplitInfo) -> Self {
        self.split = Some(split);
        self
    }

    pub fn with_foreign_currency(mut self, currency: impl Into<String>, amount: Decimal) -> Self {
        self.original_currency = Some(currency.into());
        self.original_amount = Some(amount);
        self
    }
}

/// A batch of drafts plus processing directives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRequest {
    pub transactions: Vec<TransactionDraft>,
    /// Run validation and stop; nothing is posted.
    #[serde(default)]
    pub validate_only: bool,
    /// Caller-supplied tag echoed back in the outcome.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_reference: Option<String>,
}

// ========== Validation ==========

/// Validation verdict for one draft.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub transaction_id: Uuid,
    pub is_valid: bool,
    pub errors: Vec<String>,
}

/// Thresholds used by the validator.
#[derive(Debug, Clone)]
pub struct ValidationLimits {
    /// Absolute amounts above this trigger a risk lookup.
    pub large_transaction_threshold: Decimal,
    /// Risk scores above this reject the draft.
    pub high_risk_score: f64,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self {
            // Everyday spending stays under this
            large_transaction_threshold: dec!(1000),
            // Scores are in [0, 1]
            high_risk_score: 0.7,
        }
    }
}

/// Per-draft validator. Checks are independent; a draft can fail several
/// at once and the caller gets all of them.
pub struct BatchValidator<'a> {
    accounts: &'a dyn AccountSource,
    risk: &'a dyn RiskAnalyzer,
    limits: ValidationLimits,
    sensitive: Regex,
}

impl<'a> BatchValidator<'a> {
    pub fn new(accounts: &'a dyn AccountSource, risk: &'a dyn RiskAnalyzer) -> Self {
        Self::with_limits(accounts, risk, ValidationLimits::default())
    }

    pub fn with_limits(
        accounts: &'a dyn AccountSource,
        risk: &'a dyn RiskAnalyzer,
        limits: ValidationLimits,
    ) -> Self {
        Self {
            accounts,
            risk,
            limits,
            sensitive: Regex::new(SENSITIVE_PATTERN).expect("valid regex"),
        }
    }

    /// Validate one draft. Collaborator failures propagate; rule failures
    /// land in the returned result.
    pub async fn validate(&self, draft: &TransactionDraft, user_id: Uuid) -> Result<ValidationResult> {
        let mut errors = Vec::new();

        if draft.amount.is_zero() {
            errors.push("Amount cannot be zero".to_string());
        }

        if draft.description.trim().is_empty() {
            errors.push("Description is required".to_string());
        }
        if self.sensitive.is_match(&draft.description) {
            errors.push("Description contains sensitive account or card data".to_string());
        }

        // Funds are only checked for debits against a known account
        if draft.amount < Decimal::ZERO {
            if let Some(account) = self.accounts.fetch(draft.account_id).await? {
                if draft.amount.abs() > account.available_balance {
                    errors.push("Insufficient funds for this transaction".to_string());
                }
            }
        }

        if draft.amount.abs() > self.limits.large_transaction_threshold {
            let score = self.risk.transaction_risk(draft, user_id).await?;
            if score > self.limits.high_risk_score {
                errors.push(format!("High-risk transaction (score: {:.0}%)", score * 100.0));
            }
        }

        Ok(ValidationResult {
            transaction_id: draft.id.unwrap_or_else(Uuid::new_v4),
            is_valid: errors.is_empty(),
            errors,
        })
    }
}

// ========== Strategy Dispatch ==========

/// The processing strategies a draft can route to. Closed set: adding a
/// strategy means adding a variant, and the dispatch match below will not
/// compile until it is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Standard,
    Recurring,
    Split,
    Foreign,
}

impl Strategy {
    /// Pick the strategy for a draft. Precedence when several apply:
    /// recurring, then split, then foreign currency.
    pub fn for_draft(draft: &TransactionDraft) -> Self {
        if draft.is_recurring {
            Self::Recurring
        } else if draft
            .split
            .as_ref()
            .map_or(false, |split| !split.categories.is_empty())
        {
            Self::Split
        } else if draft
            .original_currency
            .as_deref()
            .map_or(false, |currency| !currency.is_empty() && currency != BASE_CURRENCY)
        {
            Self::Foreign
        } else {
            Self::Standard
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Recurring => "recurring",
            Self::Split => "split",
            Self::Foreign => "foreign_currency",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A draft after its strategy has posted it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedTransaction {
    pub transaction_id: Uuid,
    pub account_id: Uuid,
    pub amount: Decimal,
    pub date: DateTime<Utc>,
    pub description: String,
    pub status: TransactionStatus,
    /// What the strategy did, e.g. the conversion applied.
    pub processing_details: String,
}

/// Routes accepted drafts through their strategies, in order, then runs
/// category rules and balance-history updates.
pub struct BatchDispatcher<'a> {
    strategies: &'a dyn StrategyProcessor,
    post: &'a dyn PostProcessor,
}

impl<'a> BatchDispatcher<'a> {
    pub fn new(strategies: &'a dyn StrategyProcessor, post: &'a dyn PostProcessor) -> Self {
        Self { strategies, post }
    }

    /// Process every draft sequentially. The first strategy failure aborts
    /// the batch; nothing after it is dispatched.
    pub async fn dispatch(
        &self,
        drafts: &[TransactionDraft],
        user_id: Uuid,
    ) -> Result<Vec<ProcessedTransaction>> {
        let mut processed = Vec::with_capacity(drafts.len());
        for (index, draft) in drafts.iter().enumerate() {
            let strategy = Strategy::for_draft(draft);
            tracing::debug!(
                strategy = strategy.as_str(),
                account_id = %draft.account_id,
                "dispatching draft"
            );
            let outcome = match strategy {
                Strategy::Standard => self.strategies.process_standard(draft, user_id).await,
                Strategy::Recurring => self.strategies.process_recurring(draft, user_id).await,
                Strategy::Split => self.strategies.process_split(draft, user_id).await,
                Strategy::Foreign => {
                    self.strategies.process_foreign_currency(draft, user_id).await
                }
            };
            let tx = outcome.map_err(|err| {
                Error::ProcessingFailed(format!(
                    "{} strategy failed for transaction {} of {}: {}",
                    strategy,
                    index + 1,
                    drafts.len(),
                    err
                ))
            })?;
            processed.push(tx);
        }

        let ids: Vec<Uuid> = processed.iter().map(|tx| tx.transaction_id).collect();
        self.post
            .apply_category_rules(&ids, user_id)
            .await
            .map_err(|err| Error::ProcessingFailed(format!("category rules failed: {}", err)))?;

        let mut touched: Vec<Uuid> = Vec::new();
        for tx in &processed {
            if !touched.contains(&tx.account_id) {
                touched.push(tx.account_id);
            }
        }
        for account_id in touched {
            self.post
                .update_balance_history(account_id)
                .await
                .map_err(|err| {
                    Error::ProcessingFailed(format!(
                        "balance history update failed for account {}: {}",
                        account_id, err
                    ))
                })?;
        }

        Ok(processed)
    }
}

// ========== Outcome ==========

/// Terminal state of a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    Validated,
    Failed,
    Completed,
}

impl BatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validated => "validated",
            Self::Failed => "failed",
            Self::Completed => "completed",
        }
    }
}

impl std::fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Everything a caller learns about a batch run. Validation results are
/// kept in every status, including `Completed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub status: BatchStatus,
    pub processed_count: usize,
    pub total_count: usize,
    pub validation: Vec<ValidationResult>,
    pub processed: Vec<ProcessedTransaction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_reference: Option<String>,
}

impl BatchOutcome {
    /// Outcome of a `validate_only` run. Nothing was posted.
    pub fn validated(
        total_count: usize,
        validation: Vec<ValidationResult>,
        batch_reference: Option<String>,
    ) -> Self {
        Self {
            status: BatchStatus::Validated,
            processed_count: 0,
            total_count,
            validation,
            processed: Vec::new(),
            batch_id: None,
            completed_at: None,
            batch_reference,
        }
    }

    /// Outcome of a batch rejected by validation. Nothing was posted.
    pub fn failed(
        total_count: usize,
        validation: Vec<ValidationResult>,
        batch_reference: Option<String>,
    ) -> Self {
        Self {
            status: BatchStatus::Failed,
            processed_count: 0,
            total_count,
            validation,
            processed: Vec::new(),
            batch_id: None,
            completed_at: None,
            batch_reference,
        }
    }

    /// Outcome of a fully processed batch.
    pub fn completed(
        total_count: usize,
        validation: Vec<ValidationResult>,
        processed: Vec<ProcessedTransaction>,
        batch_reference: Option<String>,
    ) -> Self {
        Self {
            status: BatchStatus::Completed,
            processed_count: processed.len(),
            total_count,
            validation,
            processed,
            batch_id: Some(Uuid::new_v4()),
            completed_at: Some(Utc::now()),
            batch_reference,
        }
    }

    pub fn rejected_count(&self) -> usize {
        self.validation.iter().filter(|v| !v.is_valid).count()
    }

    pub fn has_rejections(&self) -> bool {
        self.rejected_count() > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Account, CategorySplit, RiskMetrics};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct StubAccounts {
        balance: Decimal,
        exists: bool,
    }

    #[async_trait]
    impl AccountSource for StubAccounts {
        async fn fetch(&self, account_id: Uuid) -> Result<Option<Account>> {
            if !self.exists {
                return Ok(None);
            }
            Ok(Some(Account {
                id: account_id,
                user_id: Uuid::new_v4(),
                name: "Checking".to_string(),
                available_balance: self.balance,
            }))
        }

        async fn authorized_account_ids(
            &self,
            _user_id: Uuid,
            _requested: Option<&[Uuid]>,
        ) -> Result<Vec<Uuid>> {
            Ok(Vec::new())
        }
    }

    struct StubRisk {
        score: f64,
    }

    #[async_trait]
    impl RiskAnalyzer for StubRisk {
        async fn user_risk_metrics(&self, _user_id: Uuid) -> Result<RiskMetrics> {
            Ok(RiskMetrics {
                overall_score: self.score,
                anomaly_index: 0.0,
                unusual_activity_level: "normal".to_string(),
                flagged_count: 0,
            })
        }

        async fn transaction_risk(&self, _draft: &TransactionDraft, _user_id: Uuid) -> Result<f64> {
            Ok(self.score)
        }
    }

    fn validator<'a>(accounts: &'a StubAccounts, risk: &'a StubRisk) -> BatchValidator<'a> {
        BatchValidator::new(accounts, risk)
    }

    fn rich_account() -> StubAccounts {
        StubAccounts {
            balance: dec!(100000),
            exists: true,
        }
    }

    #[tokio::test]
    async fn test_zero_amount_is_rejected() {
        let accounts = rich_account();
        let risk = StubRisk { score: 0.0 };
        let result = validator(&accounts, &risk)
            .validate(&TransactionDraft::new(Uuid::new_v4(), Decimal::ZERO, "lunch"), Uuid::new_v4())
            .await
            .unwrap();

        assert!(!result.is_valid);
        assert_eq!(result.errors, vec!["Amount cannot be zero".to_string()]);
    }

    #[tokio::test]
    async fn test_multiple_failures_are_all_reported() {
        let accounts = rich_account();
        let risk = StubRisk { score: 0.0 };
        let result = validator(&accounts, &risk)
            .validate(&TransactionDraft::new(Uuid::new_v4(), Decimal::ZERO, "   "), Uuid::new_v4())
            .await
            .unwrap();

        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 2);
        assert!(result.errors.contains(&"Amount cannot be zero".to_string()));
        assert!(result.errors.contains(&"Description is required".to_string()));
    }

    #[tokio::test]
    async fn test_sensitive_card_data_is_rejected() {
        let accounts = rich_account();
        let risk = StubRisk { score: 0.0 };
        let v = validator(&accounts, &risk);
        let user = Uuid::new_v4();

        for description in [
            "Payment with card: 4111-1111-1111-1111",
            "account #9999 8888 7777 6666",
            "CARD 1234*5678*9012*3456",
        ] {
            let result = v
                .validate(&TransactionDraft::new(Uuid::new_v4(), dec!(-10), description), user)
                .await
                .unwrap();
            assert!(!result.is_valid, "{description} should be rejected");
            assert_eq!(
                result.errors,
                vec!["Description contains sensitive account or card data".to_string()]
            );
        }

        // A trailing partial number is not a match
        let result = v
            .validate(
                &TransactionDraft::new(Uuid::new_v4(), dec!(-10), "card ending 1111"),
                user,
            )
            .await
            .unwrap();
        assert!(result.is_valid);
    }

    #[tokio::test]
    async fn test_insufficient_funds_only_applies_to_debits() {
        let accounts = StubAccounts {
            balance: dec!(50),
            exists: true,
        };
        let risk = StubRisk { score: 0.0 };
        let v = validator(&accounts, &risk);
        let user = Uuid::new_v4();

        let debit = v
            .validate(&TransactionDraft::new(Uuid::new_v4(), dec!(-80), "rent"), user)
            .await
            .unwrap();
        assert_eq!(debit.errors, vec!["Insufficient funds for this transaction".to_string()]);

        let credit = v
            .validate(&TransactionDraft::new(Uuid::new_v4(), dec!(80), "refund"), user)
            .await
            .unwrap();
        assert!(credit.is_valid);
    }

    #[tokio::test]
    async fn test_unknown_account_skips_funds_check() {
        let accounts = StubAccounts {
            balance: Decimal::ZERO,
            exists: false,
        };
        let risk = StubRisk { score: 0.0 };
        let result = validator(&accounts, &risk)
            .validate(&TransactionDraft::new(Uuid::new_v4(), dec!(-80), "rent"), Uuid::new_v4())
            .await
            .unwrap();

        assert!(result.is_valid);
    }

    #[tokio::test]
    async fn test_high_risk_rejects_only_large_amounts() {
        let accounts = rich_account();
        let risky = StubRisk { score: 0.9 };
        let v = validator(&accounts, &risky);
        let user = Uuid::new_v4();

        let large = v
            .validate(&TransactionDraft::new(Uuid::new_v4(), dec!(-5000), "piano"), user)
            .await
            .unwrap();
        assert_eq!(large.errors, vec!["High-risk transaction (score: 90%)".to_string()]);

        let small = v
            .validate(&TransactionDraft::new(Uuid::new_v4(), dec!(-500), "groceries"), user)
            .await
            .unwrap();
        assert!(small.is_valid);

        let calm = StubRisk { score: 0.5 };
        let large_but_calm = validator(&accounts, &calm)
            .validate(&TransactionDraft::new(Uuid::new_v4(), dec!(-5000), "piano"), user)
            .await
            .unwrap();
        assert!(large_but_calm.is_valid);
    }

    #[tokio::test]
    async fn test_valid_draft_keeps_its_id() {
        let accounts = rich_account();
        let risk = StubRisk { score: 0.0 };
        let id = Uuid::new_v4();
        let result = validator(&accounts, &risk)
            .validate(
                &TransactionDraft::new(Uuid::new_v4(), dec!(-25), "dinner").with_id(id),
                Uuid::new_v4(),
            )
            .await
            .unwrap();

        assert!(result.is_valid);
        assert!(result.errors.is_empty());
        assert_eq!(result.transaction_id, id);
    }

    #[test]
    fn test_strategy_precedence() {
        let account = Uuid::new_v4();
        let split = SplitInfo {
            categories: vec![CategorySplit {
                category_id: Uuid::new_v4(),
                amount: dec!(-10),
                description: None,
            }],
        };

        let recurring_and_split = TransactionDraft::new(account, dec!(-20), "gym")
            .with_recurring("monthly")
            .with_split(split.clone());
        assert_eq!(Strategy::for_draft(&recurring_and_split), Strategy::Recurring);

        let split_and_foreign = TransactionDraft::new(account, dec!(-20), "dinner")
            .with_split(split)
            .with_foreign_currency("EUR", dec!(-18));
        assert_eq!(Strategy::for_draft(&split_and_foreign), Strategy::Split);

        let foreign = TransactionDraft::new(account, dec!(-20), "taxi")
            .with_foreign_currency("EUR", dec!(-18));
        assert_eq!(Strategy::for_draft(&foreign), Strategy::Foreign);

        let base_currency = TransactionDraft::new(account, dec!(-20), "taxi")
            .with_foreign_currency(BASE_CURRENCY, dec!(-20));
        assert_eq!(Strategy::for_draft(&base_currency), Strategy::Standard);

        let empty_split = TransactionDraft::new(account, dec!(-20), "coffee")
            .with_split(SplitInfo { categories: Vec::new() });
        assert_eq!(Strategy::for_draft(&empty_split), Strategy::Standard);
    }

    #[test]
    fn test_outcome_counts() {
        let valid = ValidationResult {
            transaction_id: Uuid::new_v4(),
            is_valid: true,
            errors: Vec::new(),
        };
        let invalid = ValidationResult {
            transaction_id: Uuid::new_v4(),
            is_valid: false,
            errors: vec!["Amount cannot be zero".to_string()],
        };

        let failed = BatchOutcome::failed(2, vec![valid.clone(), invalid], None);
        assert_eq!(failed.status, BatchStatus::Failed);
        assert_eq!(failed.processed_count, 0);
        assert_eq!(failed.total_count, 2);
        assert_eq!(failed.rejected_count(), 1);
        assert!(failed.has_rejections());
        assert!(failed.batch_id.is_none());

        let completed = BatchOutcome::completed(1, vec![valid], Vec::new(), Some("july".into()));
        assert_eq!(completed.status, BatchStatus::Completed);
        assert!(completed.batch_id.is_some());
        assert!(completed.completed_at.is_some());
        assert_eq!(completed.batch_reference.as_deref(), Some("july"));
        assert!(!completed.has_rejections());
    }

    struct RecordingProcessor {
        calls: Mutex<Vec<&'static str>>,
    }

    impl RecordingProcessor {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
            }
        }

        fn posted(&self, draft: &TransactionDraft, which: &'static str) -> Result<ProcessedTransaction> {
            self.calls.lock().unwrap().push(which);
            Ok(ProcessedTransaction {
                transaction_id: draft.id.unwrap_or_else(Uuid::new_v4),
                account_id: draft.account_id,
                amount: draft.amount,
                date: draft.date.unwrap_or_else(Utc::now),
                description: draft.description.clone(),
                status: TransactionStatus::Completed,
                processing_details: which.to_string(),
            })
        }
    }

    #[async_trait]
    impl StrategyProcessor for RecordingProcessor {
        async fn process_standard(
            &self,
            draft: &TransactionDraft,
            _user_id: Uuid,
        ) -> Result<ProcessedTransaction> {
            self.posted(draft, "standard")
        }

        async fn process_recurring(
            &self,
            draft: &TransactionDraft,
            _user_id: Uuid,
        ) -> Result<ProcessedTransaction> {
            self.posted(draft, "recurring")
        }

        async fn process_split(
            &self,
            draft: &TransactionDraft,
            _user_id: Uuid,
        ) -> Result<ProcessedTransaction> {
            self.posted(draft, "split")
        }

        async fn process_foreign_currency(
            &self,
            draft: &TransactionDraft,
            _user_id: Uuid,
        ) -> Result<ProcessedTransaction> {
            self.posted(draft, "foreign_currency")
        }
    }

    struct RecordingPost {
        rule_batches: Mutex<Vec<usize>>,
        history_accounts: Mutex<Vec<Uuid>>,
    }

    #[async_trait]
    impl PostProcessor for RecordingPost {
        async fn apply_category_rules(&self, transaction_ids: &[Uuid], _user_id: Uuid) -> Result<()> {
            self.rule_batches.lock().unwrap().push(transaction_ids.len());
            Ok(())
        }

        async fn update_balance_history(&self, account_id: Uuid) -> Result<()> {
            self.history_accounts.lock().unwrap().push(account_id);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_dispatch_routes_and_runs_post_hooks() {
        let account_a = Uuid::new_v4();
        let account_b = Uuid::new_v4();
        let drafts = vec![
            TransactionDraft::new(account_a, dec!(-10), "coffee"),
            TransactionDraft::new(account_a, dec!(-50), "gym").with_recurring("monthly"),
            TransactionDraft::new(account_b, dec!(-30), "taxi")
                .with_foreign_currency("EUR", dec!(-27)),
        ];

        let processor = RecordingProcessor::new();
        let post = RecordingPost {
            rule_batches: Mutex::new(Vec::new()),
            history_accounts: Mutex::new(Vec::new()),
        };
        let processed = BatchDispatcher::new(&processor, &post)
            .dispatch(&drafts, Uuid::new_v4())
            .await
            .unwrap();

        assert_eq!(processed.len(), 3);
        assert_eq!(
            *processor.calls.lock().unwrap(),
            vec!["standard", "recurring", "foreign_currency"]
        );
        assert_eq!(*post.rule_batches.lock().unwrap(), vec![3]);
        assert_eq!(
            *post.history_accounts.lock().unwrap(),
            vec![account_a, account_b]
        );
    }
}
