//! Recurring pattern detection over transaction history
//!
//! Two pattern families: per-merchant recurrence (regular visits with
//! steady amounts) and monthly category spend (a category hit most months
//! with steady totals). Detection is pure; the engine fetches completed
//! transactions and hands them over. Sparse history short-circuits to an
//! empty report with an explanatory message instead of an error.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Transaction;

// ========== Criteria & Config ==========

/// What the caller wants out of a detection run.
#[derive(Debug, Clone)]
pub struct PatternCriteria {
    pub min_confidence: f64,
    pub min_occurrences: usize,
    pub include_insights: bool,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl Default for PatternCriteria {
    fn default() -> Self {
        Self {
            // Patterns below this are noise
            min_confidence: 0.6,
            // A pattern needs at least this many observations
            min_occurrences: 3,
            include_insights: true,
            from: None,
            to: None,
        }
    }
}

/// Detection thresholds and confidence weights.
#[derive(Debug, Clone)]
pub struct PatternConfig {
    /// Interval spread over mean interval; below this the schedule is
    /// regular.
    pub max_interval_variation: f64,
    /// Amount spread over mean magnitude; below this amounts are
    /// consistent.
    pub max_amount_variation: f64,
    /// Month-to-month spread of category totals.
    pub max_monthly_variation: f64,
    /// Month coverage above this counts as regular.
    pub regular_coverage: f64,
    /// Every detected merchant pattern starts here.
    pub base_confidence: f64,
    pub regular_bonus: f64,
    pub consistent_bonus: f64,
    /// Added per observed interval, capped below.
    pub per_interval_bonus: f64,
    pub interval_bonus_cap: f64,
    /// Consistent monthly spend scores coverage on this slope and floor.
    pub monthly_consistent_weight: f64,
    pub monthly_consistent_floor: f64,
    /// Inconsistent monthly spend scores coverage alone.
    pub monthly_base_weight: f64,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            max_interval_variation: 0.5,
            max_amount_variation: 0.2,
            max_monthly_variation: 0.3,
            regular_coverage: 0.7,
            base_confidence: 0.5,
            regular_bonus: 0.2,
            consistent_bonus: 0.2,
            per_interval_bonus: 0.02,
            interval_bonus_cap: 0.1,
            monthly_consistent_weight: 0.7,
            monthly_consistent_floor: 0.3,
            monthly_base_weight: 0.5,
        }
    }
}

// ========== Pattern Models ==========

/// The pattern families the miner can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    Merchant,
    MonthlyCategorySpend,
}

impl PatternKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Merchant => "merchant",
            Self::MonthlyCategorySpend => "monthly_category_spend",
        }
    }
}

impl std::fmt::Display for PatternKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One detected pattern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pattern {
    pub kind: PatternKind,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_name: Option<String>,
    pub occurrences: usize,
    /// Signed mean amount; monthly patterns average the month totals.
    pub average_amount: Decimal,
    pub average_interval_days: f64,
    pub last_occurrence: DateTime<Utc>,
    pub is_regular: bool,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_expected: Option<DateTime<Utc>>,
    /// The transactions this pattern was mined from.
    pub transaction_ids: Vec<Uuid>,
}

/// Full detection response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternReport {
    pub pattern_count: usize,
    pub patterns: Vec<Pattern>,
    pub insights: Vec<String>,
    pub generated_at: DateTime<Utc>,
    /// Set when history was too sparse to attempt detection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

// ========== Miner ==========

/// Pattern detector. Stateless apart from its thresholds.
pub struct PatternMiner {
    config: PatternConfig,
}

impl Default for PatternMiner {
    fn default() -> Self {
        Self::new()
    }
}

impl PatternMiner {
    pub fn new() -> Self {
        Self::with_config(PatternConfig::default())
    }

    pub fn with_config(config: PatternConfig) -> Self {
        Self { config }
    }

    /// Detect patterns in a transaction set. Fewer than twice
    /// `min_occurrences` transactions yields an empty report with a
    /// message rather than an error.
    pub fn detect(&self, transactions: &[Transaction], criteria: &PatternCriteria) -> PatternReport {
        if transactions.len() < criteria.min_occurrences * 2 {
            return PatternReport {
                pattern_count: 0,
                patterns: Vec::new(),
                insights: Vec::new(),
                generated_at: Utc::now(),
                message: Some("Not enough transaction history to detect patterns".to_string()),
            };
        }

        // Merchant patterns list first, then monthly; each family is
        // already sorted, and the families are never ranked against each
        // other.
        let mut patterns = self.merchant_patterns(transactions, criteria.min_occurrences);
        patterns.extend(self.monthly_patterns(transactions, criteria.min_occurrences));
        patterns.retain(|p| p.confidence >= criteria.min_confidence);

        let insights = if criteria.include_insights {
            self.insights(&patterns)
        } else {
            Vec::new()
        };

        PatternReport {
            pattern_count: patterns.len(),
            patterns,
            insights,
            generated_at: Utc::now(),
            message: None,
        }
    }

    fn merchant_patterns(&self, transactions: &[Transaction], min_occurrences: usize) -> Vec<Pattern> {
        let mut order: Vec<String> = Vec::new();
        let mut buckets: HashMap<String, Vec<&Transaction>> = HashMap::new();
        for tx in transactions {
            let Some(name) = tx.merchant_name.as_deref().filter(|n| !n.is_empty()) else {
                continue;
            };
            match buckets.get_mut(name) {
                Some(list) => list.push(tx),
                None => {
                    order.push(name.to_string());
                    buckets.insert(name.to_string(), vec![tx]);
                }
            }
        }

        let mut patterns = Vec::new();
        for name in order {
            let Some(mut txs) = buckets.remove(&name) else {
                continue;
            };
            if txs.len() < min_occurrences {
                continue;
            }
            txs.sort_by_key(|tx| tx.date);
            let Some(last) = txs.last() else { continue };
            let last_date = last.date;

            let intervals: Vec<f64> = txs
                .windows(2)
                .map(|pair| (pair[1].date - pair[0].date).num_seconds() as f64 / 86_400.0)
                .collect();
            let avg_interval = mean(&intervals);
            let interval_dev = std_dev(&intervals);

            let amounts: Vec<f64> = txs
                .iter()
                .map(|tx| tx.amount.to_f64().unwrap_or(0.0))
                .collect();
            let avg_amount = mean(&amounts);
            let amount_dev = std_dev(&amounts);

            // Ratio tests guard against a zero mean instead of dividing
            let is_regular = intervals.len() >= 2
                && avg_interval > 0.0
                && interval_dev / avg_interval < self.config.max_interval_variation;
            let is_consistent = avg_amount.abs() > 0.0
                && amount_dev / avg_amount.abs() < self.config.max_amount_variation;

            let total: Decimal = txs.iter().map(|tx| tx.amount).sum();
            let average_amount = total / Decimal::from(txs.len() as u64);

            let next_expected = if is_regular {
                Some(last_date + chrono::Duration::seconds((avg_interval * 86_400.0).round() as i64))
            } else {
                None
            };

            let (category_id, category_name) = dominant_category(&txs);
            let confidence = self.confidence(is_regular, is_consistent, intervals.len());
            let transaction_ids: Vec<Uuid> = txs.iter().map(|tx| tx.id).collect();

            patterns.push(Pattern {
                kind: PatternKind::Merchant,
                name: format!("Transactions at {}", name),
                merchant_name: Some(name),
                category_id,
                category_name,
                occurrences: txs.len(),
                average_amount,
                average_interval_days: avg_interval,
                last_occurrence: last_date,
                is_regular,
                confidence,
                next_expected,
                transaction_ids,
            });
        }
        sort_family(&mut patterns);
        patterns
    }

    fn monthly_patterns(&self, transactions: &[Transaction], min_occurrences: usize) -> Vec<Pattern> {
        struct MonthlyAcc {
            name: Option<String>,
            months: BTreeMap<(i32, u32), Decimal>,
            ids: Vec<Uuid>,
        }

        let mut by_category: BTreeMap<Option<Uuid>, MonthlyAcc> = BTreeMap::new();
        for tx in transactions {
            let acc = by_category.entry(tx.category_id).or_insert_with(|| MonthlyAcc {
                name: None,
                months: BTreeMap::new(),
                ids: Vec::new(),
            });
            if acc.name.is_none() {
                acc.name = tx.category_name.clone();
            }
            *acc
                .months
                .entry((tx.date.year(), tx.date.month()))
                .or_insert(Decimal::ZERO) += tx.amount;
            acc.ids.push(tx.id);
        }

        let mut patterns = Vec::new();
        for (category_id, acc) in by_category {
            if acc.months.len() < min_occurrences {
                continue;
            }
            let Some(&first) = acc.months.keys().next() else {
                continue;
            };
            let Some(&last) = acc.months.keys().next_back() else {
                continue;
            };

            let totals: Vec<Decimal> = acc.months.values().copied().collect();
            let totals_f: Vec<f64> = totals.iter().map(|t| t.to_f64().unwrap_or(0.0)).collect();
            let avg = mean(&totals_f);
            let dev = std_dev(&totals_f);
            let is_consistent =
                avg.abs() > 0.0 && dev / avg.abs() < self.config.max_monthly_variation;

            // Calendar span from first to last bucket, inclusive
            let expected_months =
                ((last.0 - first.0) * 12 + (last.1 as i32 - first.1 as i32) + 1).max(1);
            let coverage = acc.months.len() as f64 / expected_months as f64;

            let confidence = if is_consistent {
                self.config.monthly_consistent_weight * coverage
                    + self.config.monthly_consistent_floor
            } else {
                self.config.monthly_base_weight * coverage
            };

            let total: Decimal = totals.iter().copied().sum();
            let average_amount = total / Decimal::from(totals.len() as u64);

            let label = acc
                .name
                .clone()
                .unwrap_or_else(|| "Uncategorized".to_string());
            let last_month = NaiveDate::from_ymd_opt(last.0, last.1, 1).unwrap();
            let last_occurrence = last_month.and_hms_opt(0, 0, 0).unwrap().and_utc();
            let next_expected = last_month
                .checked_add_months(Months::new(1))
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc());

            patterns.push(Pattern {
                kind: PatternKind::MonthlyCategorySpend,
                name: format!("Monthly spend on {}", label),
                merchant_name: None,
                category_id,
                category_name: Some(label),
                occurrences: acc.months.len(),
                average_amount,
                average_interval_days: 30.0,
                last_occurrence,
                is_regular: coverage > self.config.regular_coverage,
                confidence,
                next_expected,
                transaction_ids: acc.ids,
            });
        }
        sort_family(&mut patterns);
        patterns
    }

    fn confidence(&self, is_regular: bool, is_consistent: bool, interval_count: usize) -> f64 {
        let mut score = self.config.base_confidence;
        if is_regular {
            score += self.config.regular_bonus;
        }
        if is_consistent {
            score += self.config.consistent_bonus;
        }
        score += (self.config.per_interval_bonus * interval_count as f64)
            .min(self.config.interval_bonus_cap);
        score.min(1.0)
    }

    fn insights(&self, patterns: &[Pattern]) -> Vec<String> {
        let mut insights = Vec::new();

        for pattern in patterns {
            if pattern.kind != PatternKind::Merchant || !pattern.is_regular {
                continue;
            }
            let Some(merchant) = pattern.merchant_name.as_deref() else {
                continue;
            };
            insights.push(format!(
                "Detected regular payments of {} to {} roughly every {}",
                format_amount(pattern.average_amount),
                merchant,
                format_interval(pattern.average_interval_days)
            ));
            if let Some(next) = pattern.next_expected {
                insights.push(format!(
                    "The next payment to {} is expected around {}",
                    merchant,
                    next.format("%Y-%m-%d")
                ));
            }
        }

        let mut spend: Vec<&Pattern> = patterns
            .iter()
            .filter(|p| {
                p.kind == PatternKind::MonthlyCategorySpend && p.average_amount < Decimal::ZERO
            })
            .collect();
        spend.sort_by(|a, b| a.average_amount.cmp(&b.average_amount));
        if !spend.is_empty() {
            insights.push("Largest recurring monthly expenses:".to_string());
            for pattern in spend.into_iter().take(3) {
                let label = pattern.category_name.as_deref().unwrap_or("Uncategorized");
                insights.push(format!(
                    "- {}: {} per month",
                    label,
                    format_amount(pattern.average_amount)
                ));
            }
        }

        insights
    }
}

/// Most frequent category in a merchant bucket. Ties keep the category
/// seen first.
fn dominant_category(txs: &[&Transaction]) -> (Option<Uuid>, Option<String>) {
    let mut counts: Vec<(Option<Uuid>, usize)> = Vec::new();
    for tx in txs {
        match counts.iter_mut().find(|(id, _)| *id == tx.category_id) {
            Some((_, n)) => *n += 1,
            None => counts.push((tx.category_id, 1)),
        }
    }

    let mut best: Option<Uuid> = None;
    let mut best_count = 0usize;
    for (id, n) in counts {
        if n > best_count {
            best = id;
            best_count = n;
        }
    }

    let name = txs
        .iter()
        .find(|tx| tx.category_id == best)
        .and_then(|tx| tx.category_name.clone());
    (best, name)
}

/// Orders one pattern family: strongest first, name as the tiebreak.
fn sort_family(patterns: &mut [Pattern]) {
    patterns.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.name.cmp(&b.name))
    });
}

// ========== Formatting ==========

/// Currency rendering for insights, always unsigned.
pub fn format_amount(amount: Decimal) -> String {
    format!("${:.2}", amount.abs())
}

/// Rough human rendering of a day count, e.g. `"1.0 months"`.
pub fn format_interval(days: f64) -> String {
    if days >= 365.0 {
        format!("{:.1} years", days / 365.0)
    } else if days >= 30.0 {
        format!("{:.1} months", days / 30.0)
    } else if days >= 7.0 {
        format!("{:.1} weeks", days / 7.0)
    } else {
        format!("{:.1} days", days)
    }
}

// ========== Statistics ==========

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation; zero for fewer than two values.
fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let avg = mean(values);
    let variance = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn tx(amount: Decimal, y: i32, m: u32, d: u32) -> Transaction {
        let date = Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap();
        Transaction::new(Uuid::new_v4(), amount, date, "test")
    }

    fn criteria(min_confidence: f64, min_occurrences: usize) -> PatternCriteria {
        PatternCriteria {
            min_confidence,
            min_occurrences,
            ..PatternCriteria::default()
        }
    }

    fn gym_every_thirty_days() -> Vec<Transaction> {
        // Exact 30-day gaps, 2024 is a leap year
        vec![
            tx(dec!(-20), 2024, 1, 1).with_merchant("Gym"),
            tx(dec!(-20), 2024, 1, 31).with_merchant("Gym"),
            tx(dec!(-20), 2024, 3, 1).with_merchant("Gym"),
            tx(dec!(-20), 2024, 3, 31).with_merchant("Gym"),
        ]
    }

    #[test]
    fn test_confidence_stays_in_unit_range() {
        let miner = PatternMiner::new();
        for regular in [false, true] {
            for consistent in [false, true] {
                for intervals in [0usize, 3, 50] {
                    let score = miner.confidence(regular, consistent, intervals);
                    assert!((0.0..=1.0).contains(&score), "score {score} out of range");
                }
            }
        }
        // The bonuses sum in f64, so compare approximately
        let maxed = miner.confidence(true, true, 50);
        assert!((maxed - 1.0).abs() < 1e-9);
        // The per-interval bonus caps at 5 intervals
        assert_eq!(maxed, miner.confidence(true, true, 5));
    }

    #[test]
    fn test_steady_merchant_schedule_scores_high() {
        let report = PatternMiner::new().detect(&gym_every_thirty_days(), &criteria(0.6, 2));

        let gym = report
            .patterns
            .iter()
            .find(|p| p.kind == PatternKind::Merchant)
            .expect("gym pattern");
        assert_eq!(gym.name, "Transactions at Gym");
        assert_eq!(gym.occurrences, 4);
        assert!(gym.is_regular);
        // Only the regular and consistency bonuses together reach 0.9
        assert!(gym.confidence >= 0.9);
        assert_eq!(gym.average_amount, dec!(-20));
        assert!((gym.average_interval_days - 30.0).abs() < 1e-9);
        assert_eq!(gym.transaction_ids.len(), 4);
        assert_eq!(
            gym.last_occurrence.format("%Y-%m-%d").to_string(),
            "2024-03-31"
        );

        let next = gym.next_expected.expect("regular pattern has a next date");
        assert_eq!(next.format("%Y-%m-%d").to_string(), "2024-04-30");
        assert!(report.message.is_none());
    }

    #[test]
    fn test_insufficient_history_is_a_message_not_an_error() {
        let txs: Vec<Transaction> = (1..=5)
            .map(|d| tx(dec!(-20), 2024, 1, d).with_merchant("Gym"))
            .collect();

        let report = PatternMiner::new().detect(&txs, &PatternCriteria::default());
        assert_eq!(report.pattern_count, 0);
        assert!(report.patterns.is_empty());
        assert!(report.insights.is_empty());
        assert_eq!(
            report.message.as_deref(),
            Some("Not enough transaction history to detect patterns")
        );
    }

    #[test]
    fn test_irregular_schedule_is_not_regular() {
        // Gaps of 10, 80, and 15 days
        let txs = vec![
            tx(dec!(-10), 2024, 1, 1).with_merchant("Cafe"),
            tx(dec!(-10), 2024, 1, 11).with_merchant("Cafe"),
            tx(dec!(-10), 2024, 3, 31).with_merchant("Cafe"),
            tx(dec!(-10), 2024, 4, 15).with_merchant("Cafe"),
        ];

        let report = PatternMiner::new().detect(&txs, &criteria(0.0, 2));
        let cafe = report
            .patterns
            .iter()
            .find(|p| p.kind == PatternKind::Merchant)
            .expect("cafe pattern");
        assert!(!cafe.is_regular);
        // Steady amounts still earn the consistency bonus: 0.5 + 0.2 + 0.06
        assert!((cafe.confidence - 0.76).abs() < 1e-9);
        assert!(cafe.next_expected.is_none());
    }

    #[test]
    fn test_varying_amounts_earn_no_consistency_bonus() {
        let txs = vec![
            tx(dec!(-10), 2024, 1, 1).with_merchant("Shop"),
            tx(dec!(-10), 2024, 1, 31).with_merchant("Shop"),
            tx(dec!(-30), 2024, 3, 1).with_merchant("Shop"),
            tx(dec!(-10), 2024, 3, 31).with_merchant("Shop"),
        ];

        let report = PatternMiner::new().detect(&txs, &criteria(0.0, 2));
        let shop = report
            .patterns
            .iter()
            .find(|p| p.kind == PatternKind::Merchant)
            .expect("shop pattern");
        assert!(shop.is_regular);
        // 0.5 base + 0.2 regular + 0.06 intervals, no consistency bonus
        assert!((shop.confidence - 0.76).abs() < 1e-9);
    }

    #[test]
    fn test_min_confidence_filters_weak_patterns() {
        let txs = vec![
            tx(dec!(-10), 2024, 1, 1).with_merchant("Shop"),
            tx(dec!(-10), 2024, 1, 31).with_merchant("Shop"),
            tx(dec!(-30), 2024, 3, 1).with_merchant("Shop"),
            tx(dec!(-10), 2024, 3, 31).with_merchant("Shop"),
        ];

        let report = PatternMiner::new().detect(&txs, &criteria(0.9, 2));
        assert_eq!(report.pattern_count, 0);
        assert!(report.patterns.is_empty());
        assert!(report.message.is_none());
    }

    #[test]
    fn test_same_day_history_does_not_panic() {
        let txs: Vec<Transaction> = (0..6)
            .map(|_| tx(dec!(-5), 2024, 1, 15).with_merchant("Dup"))
            .collect();

        let report = PatternMiner::new().detect(&txs, &PatternCriteria::default());
        let dup = report
            .patterns
            .iter()
            .find(|p| p.kind == PatternKind::Merchant)
            .expect("dup pattern");
        assert!(!dup.is_regular);
        assert!(dup.next_expected.is_none());
        assert!(dup.confidence.is_finite());
        assert!((0.0..=1.0).contains(&dup.confidence));
    }

    fn monthly_rent(category: Uuid) -> Vec<Transaction> {
        let mut txs = Vec::new();
        for month in 1..=3 {
            txs.push(tx(dec!(-500), 2024, month, 5).with_category(category, "Rent"));
            txs.push(tx(dec!(-500), 2024, month, 20).with_category(category, "Rent"));
        }
        txs
    }

    #[test]
    fn test_full_coverage_monthly_spend() {
        let category = Uuid::new_v4();
        let report = PatternMiner::new().detect(&monthly_rent(category), &PatternCriteria::default());

        assert!(report.message.is_none());
        let rent = report
            .patterns
            .iter()
            .find(|p| p.kind == PatternKind::MonthlyCategorySpend)
            .expect("rent pattern");
        assert_eq!(rent.name, "Monthly spend on Rent");
        assert_eq!(rent.category_id, Some(category));
        assert_eq!(rent.occurrences, 3);
        assert_eq!(rent.average_amount, dec!(-1000));
        assert!(rent.is_regular);
        // Full coverage on the consistent slope: 0.7 * 1.0 + 0.3
        assert!((rent.confidence - 1.0).abs() < 1e-9);
        assert_eq!(rent.transaction_ids.len(), 6);
        assert_eq!(
            rent.last_occurrence.format("%Y-%m-%d").to_string(),
            "2024-03-01"
        );

        let next = rent.next_expected.expect("next month");
        assert_eq!(next.format("%Y-%m-%d").to_string(), "2024-04-01");
    }

    #[test]
    fn test_merchant_family_lists_before_monthly() {
        // Shop scores 0.76, Gym 0.96, Rent 1.0
        let mut txs = vec![
            tx(dec!(-10), 2024, 1, 1).with_merchant("Shop"),
            tx(dec!(-10), 2024, 1, 31).with_merchant("Shop"),
            tx(dec!(-30), 2024, 3, 1).with_merchant("Shop"),
            tx(dec!(-10), 2024, 3, 31).with_merchant("Shop"),
        ];
        txs.extend(gym_every_thirty_days());
        txs.extend(monthly_rent(Uuid::new_v4()));

        let report = PatternMiner::new().detect(&txs, &criteria(0.5, 3));

        let kinds: Vec<PatternKind> = report.patterns.iter().map(|p| p.kind).collect();
        assert_eq!(
            kinds,
            vec![
                PatternKind::Merchant,
                PatternKind::Merchant,
                PatternKind::MonthlyCategorySpend,
            ]
        );
        // Confidence orders patterns inside the merchant family only
        assert_eq!(report.patterns[0].name, "Transactions at Gym");
        assert_eq!(report.patterns[1].name, "Transactions at Shop");
        // The monthly pattern outscores every merchant yet still lists last
        assert!(report.patterns[2].confidence > report.patterns[0].confidence);
    }

    #[test]
    fn test_skipped_month_lowers_coverage() {
        let category = Uuid::new_v4();
        // January, February, April; March skipped
        let mut txs = Vec::new();
        for month in [1u32, 2, 4] {
            txs.push(tx(dec!(-500), 2024, month, 5).with_category(category, "Rent"));
            txs.push(tx(dec!(-500), 2024, month, 20).with_category(category, "Rent"));
        }

        let report = PatternMiner::new().detect(&txs, &PatternCriteria::default());
        let rent = report
            .patterns
            .iter()
            .find(|p| p.kind == PatternKind::MonthlyCategorySpend)
            .expect("rent pattern");
        assert_eq!(rent.occurrences, 3);
        // 3 observed months over a 4 month span
        assert!((rent.confidence - (0.7 * 0.75 + 0.3)).abs() < 1e-9);
        assert!(rent.is_regular);
        let next = rent.next_expected.expect("next month");
        assert_eq!(next.format("%Y-%m-%d").to_string(), "2024-05-01");
    }

    #[test]
    fn test_insights_for_regular_merchant() {
        let report = PatternMiner::new().detect(&gym_every_thirty_days(), &criteria(0.6, 2));

        assert!(report.insights.contains(
            &"Detected regular payments of $20.00 to Gym roughly every 1.0 months".to_string()
        ));
        assert!(report
            .insights
            .contains(&"The next payment to Gym is expected around 2024-04-30".to_string()));
    }

    #[test]
    fn test_insights_can_be_disabled() {
        let mut c = criteria(0.6, 2);
        c.include_insights = false;
        let report = PatternMiner::new().detect(&gym_every_thirty_days(), &c);

        assert!(report.insights.is_empty());
        assert!(report.pattern_count > 0);
    }

    #[test]
    fn test_monthly_expense_insight_lists_top_three() {
        let mut txs = Vec::new();
        for (name, amount) in [
            ("Rent", dec!(-1000)),
            ("Food", dec!(-400)),
            ("Coffee", dec!(-100)),
            ("Gas", dec!(-50)),
        ] {
            let category = Uuid::new_v4();
            for month in 1..=3 {
                txs.push(tx(amount, 2024, month, 10).with_category(category, name));
            }
        }

        let report = PatternMiner::new().detect(&txs, &PatternCriteria::default());
        let header = report
            .insights
            .iter()
            .position(|line| line == "Largest recurring monthly expenses:")
            .expect("expense header");
        assert_eq!(report.insights[header + 1], "- Rent: $1000.00 per month");
        assert_eq!(report.insights[header + 2], "- Food: $400.00 per month");
        assert_eq!(report.insights[header + 3], "- Coffee: $100.00 per month");
        assert!(!report.insights.iter().any(|line| line.contains("Gas")));
    }

    #[test]
    fn test_dominant_category_keeps_first_seen_on_tie() {
        let groceries = Uuid::new_v4();
        let household = Uuid::new_v4();
        let txs = vec![
            tx(dec!(-40), 2024, 1, 1)
                .with_merchant("Market")
                .with_category(groceries, "Groceries"),
            tx(dec!(-40), 2024, 1, 31)
                .with_merchant("Market")
                .with_category(household, "Household"),
            tx(dec!(-40), 2024, 3, 1)
                .with_merchant("Market")
                .with_category(groceries, "Groceries"),
            tx(dec!(-40), 2024, 3, 31)
                .with_merchant("Market")
                .with_category(household, "Household"),
        ];

        let report = PatternMiner::new().detect(&txs, &criteria(0.0, 2));
        let market = report
            .patterns
            .iter()
            .find(|p| p.kind == PatternKind::Merchant)
            .expect("market pattern");
        assert_eq!(market.category_id, Some(groceries));
        assert_eq!(market.category_name.as_deref(), Some("Groceries"));
    }

    #[test]
    fn test_interval_formatting() {
        assert_eq!(format_interval(3.0), "3.0 days");
        assert_eq!(format_interval(14.0), "2.0 weeks");
        assert_eq!(format_interval(30.0), "1.0 months");
        assert_eq!(format_interval(365.0), "1.0 years");
        assert_eq!(format_amount(dec!(-12.5)), "$12.50");
    }
}
