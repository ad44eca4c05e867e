//! Analytics summary command implementation

use std::path::Path;

use anyhow::Result;
use sift_core::{AnalyticsCriteria, AnalyticsSummary, GroupKey, Grouped};
use uuid::Uuid;

use super::ledger::{build_engine, open_ledger, parse_from_date, parse_to_date, resolve_user};
use super::truncate;

#[allow(clippy::too_many_arguments)]
pub async fn cmd_summary(
    ledger_path: &Path,
    user: Option<Uuid>,
    group_by: &str,
    granularity: u32,
    from: Option<&str>,
    to: Option<&str>,
    include_pending: bool,
    json: bool,
) -> Result<()> {
    let group_by: GroupKey = group_by.parse()?;
    let criteria = AnalyticsCriteria {
        group_by,
        granularity_days: granularity,
        from: from.map(parse_from_date).transpose()?,
        to: to.map(parse_to_date).transpose()?,
        exclude_pending: !include_pending,
    };

    let ledger = open_ledger(ledger_path)?;
    let user_id = resolve_user(&ledger, user)?;
    let engine = build_engine(&ledger);

    let summary = engine.analytics_summary(Some(user_id), &criteria).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &AnalyticsSummary) {
    println!();
    match summary.group_by {
        GroupKey::Category => println!("📊 Summary by Category"),
        GroupKey::Time => println!("📈 Summary over Time ({} day buckets)", summary.granularity_days),
        GroupKey::Merchant => println!("🏪 Summary by Merchant"),
    }
    if let Some(range) = &summary.date_range {
        println!(
            "   Period: {} to {}",
            range.start.date_naive(),
            range.end.date_naive()
        );
    }
    println!("   ─────────────────────────────────────────────────────────────");

    if summary.results.is_empty() {
        println!("   No transactions found in this period.");
        return;
    }

    println!(
        "   Transactions: {}    Net: {:.2}    Avg size: {:.2}",
        summary.total_transactions, summary.total_net_amount, summary.average_transaction_size
    );
    println!(
        "   Risk: {} (score {:.2}, anomaly {:.2}, {} flagged)",
        summary.risk.unusual_activity_level,
        summary.risk.overall_score,
        summary.risk.anomaly_index,
        summary.risk.flagged_count
    );
    println!();

    match &summary.results {
        Grouped::Category(groups) => {
            println!(
                "   {:25} │ {:>12} │ {:>5} │ {:>12}",
                "Category", "Total", "Count", "Average"
            );
            println!("   ──────────────────────────┼──────────────┼───────┼──────────────");
            for group in groups {
                println!(
                    "   {:25} │ {:>12.2} │ {:>5} │ {:>12.2}",
                    truncate(&group.category_name, 25),
                    group.total_amount,
                    group.count,
                    group.average_amount
                );
            }
        }
        Grouped::Time(groups) => {
            println!(
                "   {:16} │ {:>12} │ {:>12} │ {:>12} │ {:>5}",
                "Period", "Income", "Expense", "Net", "Count"
            );
            println!(
                "   ─────────────────┼──────────────┼──────────────┼──────────────┼───────"
            );
            for group in groups {
                println!(
                    "   {:16} │ {:>12.2} │ {:>12.2} │ {:>12.2} │ {:>5}",
                    group.period_label,
                    group.total_income,
                    group.total_expense,
                    group.net_amount,
                    group.count
                );
            }
        }
        Grouped::Merchant(groups) => {
            println!(
                "   {:30} │ {:>12} │ {:>5} │ {:>10}",
                "Merchant", "Total", "Count", "Frequency"
            );
            println!("   ───────────────────────────────┼──────────────┼───────┼────────────");
            for group in groups {
                let frequency = if group.count > 1 {
                    format!("{:.1}d", group.frequency_days)
                } else {
                    "-".to_string()
                };
                println!(
                    "   {:30} │ {:>12.2} │ {:>5} │ {:>10}",
                    truncate(&group.merchant_name, 30),
                    group.total_amount,
                    group.count,
                    frequency
                );
            }
        }
    }
}
