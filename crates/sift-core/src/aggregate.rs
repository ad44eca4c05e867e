//! Transaction grouping and summary statistics
//!
//! Three grouping dimensions over an already-fetched transaction set:
//! category, time bucket, and merchant. The grouping functions are pure;
//! the engine fetches transactions through a source, groups them here, and
//! wraps the result in an [`AnalyticsSummary`] envelope.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{DateRange, Granularity, GroupKey, RiskMetrics, Transaction};

// ========== Criteria ==========

/// What to aggregate and how.
#[derive(Debug, Clone)]
pub struct AnalyticsCriteria {
    pub group_by: GroupKey,
    /// Bucket size for time grouping, mapped through
    /// [`Granularity::from_days`].
    pub granularity_days: u32,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub exclude_pending: bool,
}

impl Default for AnalyticsCriteria {
    fn default() -> Self {
        Self {
            // Category breakdown is the most common starting view
            group_by: GroupKey::Category,
            // Monthly buckets
            granularity_days: 30,
            from: None,
            to: None,
            // Pending amounts are provisional, keep them out of reports
            exclude_pending: true,
        }
    }
}

// ========== Group Models ==========

/// Per-category rollup. Amounts keep their sign, so a spending category
/// carries a negative total.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryGroup {
    pub category_id: Option<Uuid>,
    pub category_name: String,
    pub total_amount: Decimal,
    pub count: usize,
    pub average_amount: Decimal,
    pub min_amount: Decimal,
    pub max_amount: Decimal,
    pub first_date: DateTime<Utc>,
    pub last_date: DateTime<Utc>,
}

/// Per-period rollup. Income and expense are positive magnitudes; the net
/// keeps its sign.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeGroup {
    pub period_start: NaiveDate,
    pub period_label: String,
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub net_amount: Decimal,
    pub count: usize,
    pub transaction_ids: Vec<Uuid>,
}

/// Per-merchant rollup. `frequency_days` is the mean gap between visits,
/// zero when there is only one transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerchantGroup {
    pub merchant_name: String,
    pub total_amount: Decimal,
    pub count: usize,
    pub average_amount: Decimal,
    pub last_transaction: DateTime<Utc>,
    pub frequency_days: f64,
}

/// Grouping results, tagged by the dimension that produced them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "dimension", content = "groups", rename_all = "lowercase")]
pub enum Grouped {
    Category(Vec<CategoryGroup>),
    Time(Vec<TimeGroup>),
    Merchant(Vec<MerchantGroup>),
}

impl Grouped {
    pub fn len(&self) -> usize {
        match self {
            Self::Category(groups) => groups.len(),
            Self::Time(groups) => groups.len(),
            Self::Merchant(groups) => groups.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ========== Summary Envelope ==========

/// Full analytics response for one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsSummary {
    pub user_id: Uuid,
    pub group_by: GroupKey,
    pub granularity_days: u32,
    pub results: Grouped,
    pub total_transactions: usize,
    pub total_net_amount: Decimal,
    /// Mean of absolute amounts, zero for an empty set.
    pub average_transaction_size: Decimal,
    pub date_range: Option<DateRange>,
    pub generated_at: DateTime<Utc>,
    pub risk: RiskMetrics,
}

// ========== Grouping ==========

/// Group a transaction set along one dimension. `granularity` only matters
/// for [`GroupKey::Time`].
pub fn group_transactions(
    transactions: &[Transaction],
    key: GroupKey,
    granularity: Granularity,
) -> Grouped {
    match key {
        GroupKey::Category => Grouped::Category(by_category(transactions)),
        GroupKey::Time => Grouped::Time(by_time(transactions, granularity)),
        GroupKey::Merchant => Grouped::Merchant(by_merchant(transactions)),
    }
}

struct CategoryAcc {
    category_id: Option<Uuid>,
    category_name: Option<String>,
    total: Decimal,
    count: usize,
    min: Decimal,
    max: Decimal,
    first_date: DateTime<Utc>,
    last_date: DateTime<Utc>,
}

impl CategoryAcc {
    fn seed(tx: &Transaction) -> Self {
        Self {
            category_id: tx.category_id,
            category_name: tx.category_name.clone(),
            total: tx.amount,
            count: 1,
            min: tx.amount,
            max: tx.amount,
            first_date: tx.date,
            last_date: tx.date,
        }
    }

    fn fold(&mut self, tx: &Transaction) {
        if self.category_name.is_none() {
            self.category_name = tx.category_name.clone();
        }
        self.total += tx.amount;
        self.count += 1;
        self.min = self.min.min(tx.amount);
        self.max = self.max.max(tx.amount);
        self.first_date = self.first_date.min(tx.date);
        self.last_date = self.last_date.max(tx.date);
    }

    fn finish(self) -> CategoryGroup {
        let category_name = match (self.category_id, self.category_name) {
            (None, _) => "Uncategorized".to_string(),
            (Some(_), Some(name)) => name,
            (Some(_), None) => "Uncategorized".to_string(),
        };
        CategoryGroup {
            category_id: self.category_id,
            category_name,
            total_amount: self.total,
            count: self.count,
            average_amount: self.total / Decimal::from(self.count as u64),
            min_amount: self.min,
            max_amount: self.max,
            first_date: self.first_date,
            last_date: self.last_date,
        }
    }
}

fn by_category(transactions: &[Transaction]) -> Vec<CategoryGroup> {
    // First-encounter order is kept so equal totals tie-break stably
    let mut order: Vec<Option<Uuid>> = Vec::new();
    let mut buckets: HashMap<Option<Uuid>, CategoryAcc> = HashMap::new();
    for tx in transactions {
        match buckets.get_mut(&tx.category_id) {
            Some(acc) => acc.fold(tx),
            None => {
                order.push(tx.category_id);
                buckets.insert(tx.category_id, CategoryAcc::seed(tx));
            }
        }
    }

    let mut groups: Vec<CategoryGroup> = order
        .into_iter()
        .filter_map(|key| buckets.remove(&key))
        .map(CategoryAcc::finish)
        .collect();
    groups.sort_by(|a, b| b.total_amount.abs().cmp(&a.total_amount.abs()));
    groups
}

#[derive(Default)]
struct TimeAcc {
    income: Decimal,
    expense: Decimal,
    count: usize,
    transaction_ids: Vec<Uuid>,
}

fn by_time(transactions: &[Transaction], granularity: Granularity) -> Vec<TimeGroup> {
    let mut buckets: BTreeMap<NaiveDate, TimeAcc> = BTreeMap::new();
    for tx in transactions {
        let start = bucket_start(tx.date, granularity);
        let acc = buckets.entry(start).or_default();
        if tx.amount > Decimal::ZERO {
            acc.income += tx.amount;
        } else {
            acc.expense += -tx.amount;
        }
        acc.count += 1;
        acc.transaction_ids.push(tx.id);
    }

    buckets
        .into_iter()
        .map(|(period_start, acc)| TimeGroup {
            period_start,
            period_label: period_label(period_start, granularity),
            total_income: acc.income,
            total_expense: acc.expense,
            net_amount: acc.income - acc.expense,
            count: acc.count,
            transaction_ids: acc.transaction_ids,
        })
        .collect()
}

struct MerchantAcc {
    total: Decimal,
    count: usize,
    first_date: DateTime<Utc>,
    last_date: DateTime<Utc>,
}

fn by_merchant(transactions: &[Transaction]) -> Vec<MerchantGroup> {
    let mut order: Vec<String> = Vec::new();
    let mut buckets: HashMap<String, MerchantAcc> = HashMap::new();
    for tx in transactions {
        let name = match tx.merchant_name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => "Unknown".to_string(),
        };
        match buckets.get_mut(&name) {
            Some(acc) => {
                acc.total += tx.amount;
                acc.count += 1;
                acc.first_date = acc.first_date.min(tx.date);
                acc.last_date = acc.last_date.max(tx.date);
            }
            None => {
                order.push(name.clone());
                buckets.insert(
                    name,
                    MerchantAcc {
                        total: tx.amount,
                        count: 1,
                        first_date: tx.date,
                        last_date: tx.date,
                    },
                );
            }
        }
    }

    let mut groups: Vec<MerchantGroup> = order
        .into_iter()
        .filter_map(|name| buckets.remove(&name).map(|acc| (name, acc)))
        .map(|(merchant_name, acc)| {
            let span_days = (acc.last_date - acc.first_date).num_seconds() as f64 / 86_400.0;
            MerchantGroup {
                merchant_name,
                total_amount: acc.total,
                count: acc.count,
                average_amount: acc.total / Decimal::from(acc.count as u64),
                last_transaction: acc.last_date,
                frequency_days: span_days / acc.count.saturating_sub(1).max(1) as f64,
            }
        })
        .collect();
    groups.sort_by(|a, b| b.total_amount.abs().cmp(&a.total_amount.abs()));
    groups
}

// ========== Time Buckets ==========

/// First calendar day of the bucket containing `date`. Week buckets start
/// on Monday.
pub fn bucket_start(date: DateTime<Utc>, granularity: Granularity) -> NaiveDate {
    let day = date.date_naive();
    match granularity {
        Granularity::Day => day,
        Granularity::Week => {
            day - chrono::Duration::days(day.weekday().num_days_from_monday() as i64)
        }
        Granularity::Month => NaiveDate::from_ymd_opt(day.year(), day.month(), 1).unwrap(),
        Granularity::Quarter => {
            let quarter_month = ((day.month() - 1) / 3) * 3 + 1;
            NaiveDate::from_ymd_opt(day.year(), quarter_month, 1).unwrap()
        }
        Granularity::Year => NaiveDate::from_ymd_opt(day.year(), 1, 1).unwrap(),
    }
}

/// Human label for a bucket, e.g. `"Week of 2024-03-04"` or `"Q2 2024"`.
pub fn period_label(start: NaiveDate, granularity: Granularity) -> String {
    match granularity {
        Granularity::Day => start.format("%Y-%m-%d").to_string(),
        Granularity::Week => format!("Week of {}", start.format("%Y-%m-%d")),
        Granularity::Month => start.format("%b %Y").to_string(),
        Granularity::Quarter => format!("Q{} {}", (start.month() - 1) / 3 + 1, start.year()),
        Granularity::Year => start.year().to_string(),
    }
}

// ========== Set Statistics ==========

/// Signed sum over the whole set.
pub fn net_amount(transactions: &[Transaction]) -> Decimal {
    transactions.iter().map(|tx| tx.amount).sum()
}

/// Mean absolute amount, zero for an empty set.
pub fn average_transaction_size(transactions: &[Transaction]) -> Decimal {
    if transactions.is_empty() {
        return Decimal::ZERO;
    }
    let total: Decimal = transactions.iter().map(|tx| tx.amount.abs()).sum();
    total / Decimal::from(transactions.len() as u64)
}

/// Earliest and latest transaction timestamps, `None` for an empty set.
pub fn date_range(transactions: &[Transaction]) -> Option<DateRange> {
    let start = transactions.iter().map(|tx| tx.date).min()?;
    let end = transactions.iter().map(|tx| tx.date).max()?;
    Some(DateRange { start, end })
}
