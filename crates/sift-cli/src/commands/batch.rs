//! Batch command implementation

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use sift_core::{BatchOutcome, BatchRequest, BatchStatus, Error, MemoryLedger};
use uuid::Uuid;

use super::ledger::{build_engine, load_ledger, resolve_user, save_ledger, LedgerFile};
use super::truncate;

pub async fn cmd_batch(
    ledger_path: &Path,
    user: Option<Uuid>,
    file: &Path,
    validate_only: bool,
    save: bool,
    json: bool,
) -> Result<()> {
    let request_json = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read batch file: {}", file.display()))?;
    let mut request: BatchRequest = serde_json::from_str(&request_json)
        .with_context(|| format!("Failed to parse batch file as JSON: {}", file.display()))?;
    if validate_only {
        request.validate_only = true;
    }

    // The ledger file is loaded directly (not via open_ledger) so the
    // category rules survive a --save round trip
    let ledger_file = load_ledger(ledger_path)?;
    let rules = ledger_file.category_rules.clone();
    let ledger = Arc::new(MemoryLedger::seed(
        ledger_file.accounts,
        ledger_file.transactions,
    ));
    for rule in rules.clone() {
        ledger.add_rule(rule)?;
    }

    let user_id = resolve_user(&ledger, user)?;
    let engine = build_engine(&ledger);

    let outcome = match engine.process_batch(Some(user_id), &request).await {
        Ok(outcome) => outcome,
        Err(Error::ValidationFailed(outcome)) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                print_outcome(&outcome);
            }
            anyhow::bail!(
                "Batch validation failed: {} of {} transactions rejected",
                outcome.rejected_count(),
                outcome.total_count
            );
        }
        Err(e) => return Err(e.into()),
    };

    if save && matches!(outcome.status, BatchStatus::Completed) {
        let updated = LedgerFile {
            accounts: ledger.accounts()?,
            transactions: ledger.transactions()?,
            category_rules: rules,
        };
        save_ledger(ledger_path, &updated)?;
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    print_outcome(&outcome);

    if matches!(outcome.status, BatchStatus::Completed) && !save {
        println!();
        println!("💡 Tip: pass --save to write posted transactions back to the ledger file");
    }

    Ok(())
}

fn print_outcome(outcome: &BatchOutcome) {
    println!();
    let icon = match outcome.status {
        BatchStatus::Completed => "✅",
        BatchStatus::Validated => "🔍",
        BatchStatus::Failed => "❌",
    };
    println!("{} Batch {}", icon, outcome.status);
    println!("   ─────────────────────────────────────────────────────────────");
    println!(
        "   Requested: {}    Posted: {}    Rejected: {}",
        outcome.total_count,
        outcome.processed_count,
        outcome.rejected_count()
    );
    if let Some(reference) = &outcome.batch_reference {
        println!("   Reference: {}", reference);
    }
    if let Some(batch_id) = outcome.batch_id {
        println!("   Batch id: {}", batch_id);
    }

    let rejected: Vec<_> = outcome.validation.iter().filter(|v| !v.is_valid).collect();
    if !rejected.is_empty() {
        println!();
        println!("   Rejected transactions:");
        for result in rejected {
            println!("   ❌ {}", result.transaction_id);
            for error in &result.errors {
                println!("      - {}", error);
            }
        }
    }

    if !outcome.processed.is_empty() {
        println!();
        println!(
            "   {:10} │ {:>12} │ {:24} │ {}",
            "Date", "Amount", "Description", "Processing"
        );
        println!("   ───────────┼──────────────┼──────────────────────────┼──────────────────────");
        for tx in &outcome.processed {
            println!(
                "   {:10} │ {:>12.2} │ {:24} │ {}",
                tx.date.date_naive().to_string(),
                tx.amount,
                truncate(&tx.description, 24),
                tx.processing_details
            );
        }
    }
}
