//! Collaborator interfaces consumed by the engine
//!
//! The engine never talks to storage, risk scoring, or monetary processing
//! directly; it goes through these traits. Implementations decide where the
//! data lives (a database, a remote service, or the in-memory ledger in
//! `crate::memory`). Failures surface through the normal error taxonomy:
//! an unreachable collaborator is `Error::CollaboratorUnavailable`, never a
//! silently empty result.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::batch::{ProcessedTransaction, TransactionDraft};
use crate::error::Result;
use crate::models::{Account, RiskMetrics, Transaction, TransactionStatus};

/// Immutable query criteria for fetching a transaction set.
///
/// Built once with the consuming setters below and then passed around as a
/// value; sources must not be handed an incrementally mutated query. The
/// `matches` predicate is the single definition of the filter semantics, so
/// an in-memory source and a SQL source cannot drift apart.
#[derive(Debug, Clone)]
pub struct TransactionFilter {
    pub account_ids: Vec<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub exclude_pending: bool,
    pub status: Option<TransactionStatus>,
}

impl TransactionFilter {
    /// Filter scoped to a set of accounts, with no date bounds, including
    /// pending transactions.
    pub fn for_accounts(account_ids: Vec<Uuid>) -> Self {
        Self {
            account_ids,
            from: None,
            to: None,
            exclude_pending: false,
            status: None,
        }
    }

    /// Set optional date bounds (inclusive on both ends).
    pub fn between(mut self, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    /// Set whether pending transactions are excluded.
    pub fn exclude_pending(mut self, value: bool) -> Self {
        self.exclude_pending = value;
        self
    }

    /// Restrict to a single lifecycle status.
    pub fn with_status(mut self, status: TransactionStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Whether a transaction satisfies every criterion of this filter.
    pub fn matches(&self, tx: &Transaction) -> bool {
        if !self.account_ids.contains(&tx.account_id) {
            return false;
        }
        if self.exclude_pending && tx.status == TransactionStatus::Pending {
            return false;
        }
        if let Some(status) = self.status {
            if tx.status != status {
                return false;
            }
        }
        if let Some(from) = self.from {
            if tx.date < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if tx.date > to {
                return false;
            }
        }
        true
    }
}

/// Source of materialized transactions.
#[async_trait]
pub trait TransactionSource: Send + Sync {
    /// Fetch every transaction matching the filter, ordered by date
    /// ascending.
    async fn fetch(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>>;
}

/// Source of accounts and account-ownership answers.
#[async_trait]
pub trait AccountSource: Send + Sync {
    /// Look up a single account. `None` when it does not exist.
    async fn fetch(&self, account_id: Uuid) -> Result<Option<Account>>;

    /// The subset of `requested` the user owns, or every account the user
    /// owns when `requested` is `None`.
    async fn authorized_account_ids(
        &self,
        user_id: Uuid,
        requested: Option<&[Uuid]>,
    ) -> Result<Vec<Uuid>>;
}

/// Black-box risk scoring service.
#[async_trait]
pub trait RiskAnalyzer: Send + Sync {
    /// Portfolio-level risk summary for a user, relayed verbatim into
    /// analytics summaries.
    async fn user_risk_metrics(&self, user_id: Uuid) -> Result<RiskMetrics>;

    /// Risk score in [0, 1] for a proposed transaction.
    async fn transaction_risk(&self, draft: &TransactionDraft, user_id: Uuid) -> Result<f64>;
}

/// Monetary processing collaborator, one method per dispatch strategy. The
/// dispatcher owns precedence and routing; the monetary rules live behind
/// this trait.
#[async_trait]
pub trait StrategyProcessor: Send + Sync {
    async fn process_standard(
        &self,
        draft: &TransactionDraft,
        user_id: Uuid,
    ) -> Result<ProcessedTransaction>;

    async fn process_recurring(
        &self,
        draft: &TransactionDraft,
        user_id: Uuid,
    ) -> Result<ProcessedTransaction>;

    async fn process_split(
        &self,
        draft: &TransactionDraft,
        user_id: Uuid,
    ) -> Result<ProcessedTransaction>;

    async fn process_foreign_currency(
        &self,
        draft: &TransactionDraft,
        user_id: Uuid,
    ) -> Result<ProcessedTransaction>;
}

/// Post-batch hooks, run after every strategy call has succeeded.
#[async_trait]
pub trait PostProcessor: Send + Sync {
    /// Auto-categorization pass over freshly processed transactions.
    async fn apply_category_rules(&self, transaction_ids: &[Uuid], user_id: Uuid) -> Result<()>;

    /// Refresh the balance history of one account for reporting.
    async fn update_balance_history(&self, account_id: Uuid) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn tx_on(account: Uuid, day: u32, status: TransactionStatus) -> Transaction {
        let date = Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap();
        Transaction::new(account, dec!(-10), date, "coffee").with_status(status)
    }

    #[test]
    fn test_filter_scopes_to_accounts() {
        let mine = Uuid::new_v4();
        let theirs = Uuid::new_v4();
        let filter = TransactionFilter::for_accounts(vec![mine]);

        assert!(filter.matches(&tx_on(mine, 1, TransactionStatus::Completed)));
        assert!(!filter.matches(&tx_on(theirs, 1, TransactionStatus::Completed)));
    }

    #[test]
    fn test_filter_pending_and_status() {
        let account = Uuid::new_v4();
        let base = TransactionFilter::for_accounts(vec![account]);

        let pending = tx_on(account, 2, TransactionStatus::Pending);
        assert!(base.clone().matches(&pending));
        assert!(!base.clone().exclude_pending(true).matches(&pending));
        assert!(!base
            .with_status(TransactionStatus::Completed)
            .matches(&pending));
    }

    #[test]
    fn test_filter_date_bounds_inclusive() {
        let account = Uuid::new_v4();
        let from = Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2024, 3, 10, 23, 59, 59).unwrap();
        let filter = TransactionFilter::for_accounts(vec![account]).between(Some(from), Some(to));

        assert!(!filter.matches(&tx_on(account, 4, TransactionStatus::Completed)));
        assert!(filter.matches(&tx_on(account, 5, TransactionStatus::Completed)));
        assert!(filter.matches(&tx_on(account, 10, TransactionStatus::Completed)));
        assert!(!filter.matches(&tx_on(account, 11, TransactionStatus::Completed)));
    }
}
