//! Domain models for sift
//!
//! Monetary amounts are `rust_decimal::Decimal` and carry their sign:
//! negative = debit (money out), positive = credit (money in). Floating
//! point appears only in statistical outputs (ratios, scores, confidence),
//! never in money.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

// ========== Transaction Models ==========

/// A settled or pending financial transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub account_id: Uuid,
    /// Signed amount. Negative = debit, positive = credit.
    pub amount: Decimal,
    /// Direction flag, coherent with the amount's sign.
    pub kind: TransactionKind,
    pub status: TransactionStatus,
    pub date: DateTime<Utc>,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Uuid>,
    /// Denormalized category label supplied by the transaction source.
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

impl Transaction {
    /// Create a completed transaction. The direction flag is derived from
    /// the sign of `amount`.
    pub fn new(
        account_id: Uuid,
        amount: Decimal,
        date: DateTime<Utc>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id,
            amount,
            kind: TransactionKind::from_amount(amount),
            status: TransactionStatus::Completed,
            date,
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

    pub fn with_merchant(mut self, merchant: impl Into<String>) -> Self {
        self.merchant_name = Some(merchant.into());
        self
    }

    pub fn with_category(mut self, category_id: Uuid, name: impl Into<String>) -> Self {
        self.category_id = Some(category_id);
        self.category_name = Some(name.into());
        self
    }

    pub fn with_status(mut self, status: TransactionStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.date = date;
        self
    }
}

/// Transaction direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Credit,
    Debit,
}

impl TransactionKind {
    /// Direction implied by a signed amount. Zero counts as credit; a zero
    /// amount never survives validation anyway.
    pub fn from_amount(amount: Decimal) -> Self {
        if amount < Decimal::ZERO {
            Self::Debit
        } else {
            Self::Credit
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Credit => "credit",
            Self::Debit => "debit",
        }
    }
}

impl std::str::FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "credit" => Ok(Self::Credit),
            "debit" => Ok(Self::Debit),
            _ => Err(format!("Unknown transaction kind: {}", s)),
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Transaction lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Cancelled,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::str::FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            _ => Err(format!("Unknown transaction status: {}", s)),
        }
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Split metadata attached to a transaction that spans several categories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitInfo {
    pub categories: Vec<CategorySplit>,
}

/// One leg of a split transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySplit {
    pub category_id: Uuid,
    pub amount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// ========== Account Models ==========

/// A user-owned account. Read-only to this core; balances are mutated only
/// through the balance-history collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub available_balance: Decimal,
}

// ========== Risk Models ==========

/// Opaque risk summary supplied by the risk-analysis collaborator. The core
/// only relays it into analytics summaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskMetrics {
    pub overall_score: f64,
    pub anomaly_index: f64,
    pub unusual_activity_level: String,
    pub flagged_count: u32,
}

// ========== Grouping Models ==========

/// First and last transaction timestamps in an analyzed set.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Analytics grouping dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupKey {
    Category,
    Time,
    Merchant,
}

impl GroupKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Category => "category",
            Self::Time => "time",
            Self::Merchant => "merchant",
        }
    }
}

impl std::str::FromStr for GroupKey {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "category" => Ok(Self::Category),
            "time" => Ok(Self::Time),
            "merchant" => Ok(Self::Merchant),
            _ => Err(Error::InvalidArgument(format!(
                "Unknown grouping key: {} (valid: category, time, merchant)",
                s
            ))),
        }
    }
}

impl std::fmt::Display for GroupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Time bucket size for time-based grouping.
///
/// Week buckets align to the ISO week start (Monday).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl Granularity {
    /// Map a granularity-in-days parameter to the nearest defined bucket.
    /// Unrecognized values fall back to monthly.
    pub fn from_days(days: u32) -> Self {
        match days {
            1 => Self::Day,
            7 => Self::Week,
            30 => Self::Month,
            90 => Self::Quarter,
            365 => Self::Year,
            _ => Self::Month,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Quarter => "quarter",
            Self::Year => "year",
        }
    }
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
