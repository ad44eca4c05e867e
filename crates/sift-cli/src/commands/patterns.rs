//! Pattern detection command implementation

use std::path::Path;

use anyhow::Result;
use sift_core::patterns::{format_amount, format_interval};
use sift_core::{PatternCriteria, PatternKind, PatternReport};
use uuid::Uuid;

use super::ledger::{build_engine, open_ledger, parse_from_date, parse_to_date, resolve_user};
use super::truncate;

#[allow(clippy::too_many_arguments)]
pub async fn cmd_patterns(
    ledger_path: &Path,
    user: Option<Uuid>,
    min_confidence: f64,
    min_occurrences: usize,
    skip_insights: bool,
    from: Option<&str>,
    to: Option<&str>,
    json: bool,
) -> Result<()> {
    let criteria = PatternCriteria {
        min_confidence,
        min_occurrences,
        include_insights: !skip_insights,
        from: from.map(parse_from_date).transpose()?,
        to: to.map(parse_to_date).transpose()?,
    };

    let ledger = open_ledger(ledger_path)?;
    let user_id = resolve_user(&ledger, user)?;
    let engine = build_engine(&ledger);

    let report = engine.detect_patterns(Some(user_id), &criteria).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_report(&report);
    Ok(())
}

fn print_report(report: &PatternReport) {
    println!();
    println!("🔁 Spending Patterns");
    println!("   ─────────────────────────────────────────────────────────────");

    if let Some(message) = &report.message {
        println!("   {}", message);
        return;
    }

    if report.patterns.is_empty() {
        println!("   No patterns above the confidence threshold.");
        return;
    }

    println!("   {} pattern(s) detected", report.pattern_count);
    println!();
    println!(
        "   {:32} │ {:>5} │ {:>5} │ {:>10} │ {:12} │ {:10}",
        "Pattern", "Conf", "Count", "Average", "Every", "Next"
    );
    println!(
        "   ─────────────────────────────────┼───────┼───────┼────────────┼──────────────┼────────────"
    );

    for pattern in &report.patterns {
        let kind_icon = match pattern.kind {
            PatternKind::Merchant => "🔁",
            PatternKind::MonthlyCategorySpend => "📅",
        };
        let next = pattern
            .next_expected
            .map(|d| d.date_naive().to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "   {} {:30} │ {:>4.0}% │ {:>5} │ {:>10} │ {:12} │ {:10}",
            kind_icon,
            truncate(&pattern.name, 30),
            pattern.confidence * 100.0,
            pattern.occurrences,
            format_amount(pattern.average_amount),
            format_interval(pattern.average_interval_days),
            next
        );
    }

    if !report.insights.is_empty() {
        println!();
        println!("💡 Insights");
        for insight in &report.insights {
            println!("   {}", insight);
        }
    }
}
