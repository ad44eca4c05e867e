//! In-memory ledger backing every collaborator interface
//!
//! One `MemoryLedger` serves as transaction source, account source, risk
//! analyzer, strategy processor, and post-processor at the same time. The
//! CLI loads a ledger file into one of these; tests seed it directly.
//! Interior mutability is a `std::sync::RwLock`, so a single instance can
//! sit behind several `Arc<dyn ...>` handles at once.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::batch::{ProcessedTransaction, TransactionDraft, BASE_CURRENCY};
use crate::error::{Error, Result};
use crate::models::{Account, RiskMetrics, Transaction, TransactionKind, TransactionStatus};
use crate::sources::{
    AccountSource, PostProcessor, RiskAnalyzer, StrategyProcessor, TransactionFilter,
    TransactionSource,
};

/// Absolute amounts above this count as flagged in user risk metrics.
const FLAG_THRESHOLD: Decimal = dec!(1000);

/// Keyword rule for auto-categorization. Matched case-insensitively
/// against the description and merchant name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRule {
    pub keyword: String,
    pub category_id: Uuid,
    pub category_name: String,
}

/// Point-in-time account balance, appended by the post-processing hook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    pub account_id: Uuid,
    pub recorded_at: DateTime<Utc>,
    pub balance: Decimal,
}

#[derive(Default)]
struct LedgerState {
    accounts: Vec<Account>,
    transactions: Vec<Transaction>,
    category_rules: Vec<CategoryRule>,
    balance_history: Vec<BalanceSnapshot>,
}

/// Thread-safe in-memory store implementing all collaborator traits.
#[derive(Default)]
pub struct MemoryLedger {
    inner: RwLock<LedgerState>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ledger pre-loaded with accounts and transactions. Transactions are
    /// kept in date order internally.
    pub fn seed(accounts: Vec<Account>, mut transactions: Vec<Transaction>) -> Self {
        transactions.sort_by_key(|tx| tx.date);
        Self {
            inner: RwLock::new(LedgerState {
                accounts,
                transactions,
                category_rules: Vec::new(),
                balance_history: Vec::new(),
            }),
        }
    }

    pub fn add_account(&self, account: Account) -> Result<()> {
        self.write()?.accounts.push(account);
        Ok(())
    }

    pub fn add_transaction(&self, tx: Transaction) -> Result<()> {
        let mut state = self.write()?;
        state.transactions.push(tx);
        state.transactions.sort_by_key(|t| t.date);
        Ok(())
    }

    pub fn add_rule(&self, rule: CategoryRule) -> Result<()> {
        self.write()?.category_rules.push(rule);
        Ok(())
    }

    /// Snapshot of all accounts.
    pub fn accounts(&self) -> Result<Vec<Account>> {
        Ok(self.read()?.accounts.clone())
    }

    /// Snapshot of all transactions, date ascending.
    pub fn transactions(&self) -> Result<Vec<Transaction>> {
        Ok(self.read()?.transactions.clone())
    }

    pub fn balance_history(&self) -> Result<Vec<BalanceSnapshot>> {
        Ok(self.read()?.balance_history.clone())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, LedgerState>> {
        self.inner.read().map_err(|_| ledger_poisoned())
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, LedgerState>> {
        self.inner.write().map_err(|_| ledger_poisoned())
    }

    /// Materialize a draft as a completed transaction, adjust the account
    /// balance, and record what the strategy did.
    fn commit(&self, draft: &TransactionDraft, details: String) -> Result<ProcessedTransaction> {
        let mut state = self.write()?;
        let tx = Transaction {
            id: draft.id.unwrap_or_else(Uuid::new_v4),
            account_id: draft.account_id,
            amount: draft.amount,
            kind: TransactionKind::from_amount(draft.amount),
            status: TransactionStatus::Completed,
            date: draft.date.unwrap_or_else(Utc::now),
            description: draft.description.clone(),
            category_id: draft.category_id,
            category_name: draft.category_name.clone(),
            merchant_name: draft.merchant_name.clone(),
            is_recurring: draft.is_recurring,
            recurrence_pattern: draft.recurrence_pattern.clone(),
            split: draft.split.clone(),
            original_currency: draft.original_currency.clone(),
            original_amount: draft.original_amount,
        };

        if let Some(account) = state.accounts.iter_mut().find(|a| a.id == tx.account_id) {
            account.available_balance += tx.amount;
        }

        let processed = ProcessedTransaction {
            transaction_id: tx.id,
            account_id: tx.account_id,
            amount: tx.amount,
            date: tx.date,
            description: tx.description.clone(),
            status: tx.status,
            processing_details: details,
        };
        state.transactions.push(tx);
        state.transactions.sort_by_key(|t| t.date);
        Ok(processed)
    }
}

fn ledger_poisoned() -> Error {
    Error::CollaboratorUnavailable("ledger lock poisoned".to_string())
}

#[async_trait]
impl TransactionSource for MemoryLedger {
    async fn fetch(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>> {
        let state = self.read()?;
        let mut matched: Vec<Transaction> = state
            .transactions
            .iter()
            .filter(|tx| filter.matches(tx))
            .cloned()
            .collect();
        matched.sort_by_key(|tx| tx.date);
        Ok(matched)
    }
}

#[async_trait]
impl AccountSource for MemoryLedger {
    async fn fetch(&self, account_id: Uuid) -> Result<Option<Account>> {
        let state = self.read()?;
        Ok(state.accounts.iter().find(|a| a.id == account_id).cloned())
    }

    async fn authorized_account_ids(
        &self,
        user_id: Uuid,
        requested: Option<&[Uuid]>,
    ) -> Result<Vec<Uuid>> {
        let state = self.read()?;
        let owned: Vec<Uuid> = state
            .accounts
            .iter()
            .filter(|a| a.user_id == user_id)
            .map(|a| a.id)
            .collect();
        Ok(match requested {
            None => owned,
            Some(ids) => ids.iter().filter(|id| owned.contains(id)).copied().collect(),
        })
    }
}

#[async_trait]
impl RiskAnalyzer for MemoryLedger {
    async fn user_risk_metrics(&self, user_id: Uuid) -> Result<RiskMetrics> {
        let state = self.read()?;
        let owned: Vec<Uuid> = state
            .accounts
            .iter()
            .filter(|a| a.user_id == user_id)
            .map(|a| a.id)
            .collect();
        let amounts: Vec<Decimal> = state
            .transactions
            .iter()
            .filter(|tx| owned.contains(&tx.account_id))
            .map(|tx| tx.amount.abs())
            .collect();

        if amounts.is_empty() {
            return Ok(RiskMetrics {
                overall_score: 0.0,
                anomaly_index: 0.0,
                unusual_activity_level: "normal".to_string(),
                flagged_count: 0,
            });
        }

        let flagged = amounts.iter().filter(|a| **a > FLAG_THRESHOLD).count();
        let overall = flagged as f64 / amounts.len() as f64;
        let total: Decimal = amounts.iter().copied().sum();
        let mean = (total / Decimal::from(amounts.len() as u64))
            .to_f64()
            .unwrap_or(0.0);
        let largest = amounts
            .iter()
            .copied()
            .max()
            .unwrap_or(Decimal::ZERO)
            .to_f64()
            .unwrap_or(0.0);
        let anomaly_index = if mean > 0.0 {
            (largest / (mean * 10.0)).min(1.0)
        } else {
            0.0
        };

        let unusual_activity_level = if overall > 0.6 {
            "high"
        } else if overall > 0.3 {
            "elevated"
        } else {
            "normal"
        };

        Ok(RiskMetrics {
            overall_score: overall,
            anomaly_index,
            unusual_activity_level: unusual_activity_level.to_string(),
            flagged_count: flagged as u32,
        })
    }

    async fn transaction_risk(&self, draft: &TransactionDraft, _user_id: Uuid) -> Result<f64> {
        let magnitude = draft.amount.abs().to_f64().unwrap_or(0.0);
        let mut score = (magnitude / 10_000.0).min(0.6);
        if draft
            .original_currency
            .as_deref()
            .map_or(false, |c| !c.is_empty() && c != BASE_CURRENCY)
        {
            score += 0.2;
        }
        if magnitude >= 5_000.0 {
            score += 0.15;
        }
        Ok(score.min(1.0))
    }
}

#[async_trait]
impl StrategyProcessor for MemoryLedger {
    async fn process_standard(
        &self,
        draft: &TransactionDraft,
        _user_id: Uuid,
    ) -> Result<ProcessedTransaction> {
        self.commit(draft, "processed as standard transaction".to_string())
    }

    async fn process_recurring(
        &self,
        draft: &TransactionDraft,
        _user_id: Uuid,
    ) -> Result<ProcessedTransaction> {
        let schedule = draft
            .recurrence_pattern
            .as_deref()
            .unwrap_or("unspecified schedule");
        self.commit(draft, format!("registered recurring transaction ({})", schedule))
    }

    async fn process_split(
        &self,
        draft: &TransactionDraft,
        _user_id: Uuid,
    ) -> Result<ProcessedTransaction> {
        let parts = draft.split.as_ref().map_or(0, |s| s.categories.len());
        self.commit(draft, format!("split across {} categories", parts))
    }

    async fn process_foreign_currency(
        &self,
        draft: &TransactionDraft,
        _user_id: Uuid,
    ) -> Result<ProcessedTransaction> {
        let currency = draft.original_currency.as_deref().unwrap_or(BASE_CURRENCY);
        let details = match draft.original_amount {
            Some(original) => format!("converted from {} {}", original.abs(), currency),
            None => format!("converted from {}", currency),
        };
        self.commit(draft, details)
    }
}

#[async_trait]
impl PostProcessor for MemoryLedger {
    async fn apply_category_rules(&self, transaction_ids: &[Uuid], _user_id: Uuid) -> Result<()> {
        let mut state = self.write()?;
        let rules = state.category_rules.clone();
        for tx in state.transactions.iter_mut() {
            if !transaction_ids.contains(&tx.id) || tx.category_id.is_some() {
                continue;
            }
            let haystack = match &tx.merchant_name {
                Some(merchant) => format!("{} {}", tx.description, merchant).to_lowercase(),
                None => tx.description.to_lowercase(),
            };
            if let Some(rule) = rules
                .iter()
                .find(|r| haystack.contains(&r.keyword.to_lowercase()))
            {
                tx.category_id = Some(rule.category_id);
                tx.category_name = Some(rule.category_name.clone());
            }
        }
        Ok(())
    }

    async fn update_balance_history(&self, account_id: Uuid) -> Result<()> {
        let mut state = self.write()?;
        let Some(balance) = state
            .accounts
            .iter()
            .find(|a| a.id == account_id)
            .map(|a| a.available_balance)
        else {
            return Err(Error::InvalidArgument(format!(
                "unknown account: {}",
                account_id
            )));
        };
        state.balance_history.push(BalanceSnapshot {
            account_id,
            recorded_at: Utc::now(),
            balance,
        });
        Ok(())
    }
}
