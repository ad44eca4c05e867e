//! Ledger file handling and shared engine setup
//!
//! This module contains:
//! - `LedgerFile` - The on-disk JSON ledger document
//! - `load_ledger` / `save_ledger` - File round-trip with context on failure
//! - `open_ledger` - Shared utility to seed an in-memory ledger from a file
//! - `build_engine` / `resolve_user` - Engine wiring for the analytics commands
//! - `cmd_accounts` - List accounts in the ledger

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sift_core::{Account, AnalyticsEngine, CategoryRule, MemoryLedger, Transaction};
use uuid::Uuid;

use super::truncate;

/// On-disk ledger document.
///
/// A single JSON object holding accounts, transactions, and optional
/// category rules. This is the CLI's persistence layer; the engine only
/// ever sees the in-memory ledger seeded from it.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LedgerFile {
    pub accounts: Vec<Account>,
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub category_rules: Vec<CategoryRule>,
}

pub fn load_ledger(path: &Path) -> Result<LedgerFile> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read ledger file: {}", path.display()))?;
    serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse ledger file as JSON: {}", path.display()))
}

pub fn save_ledger(path: &Path, ledger: &LedgerFile) -> Result<()> {
    let json = serde_json::to_string_pretty(ledger).context("Failed to serialize ledger")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write ledger file: {}", path.display()))
}

/// Load the ledger file and seed an in-memory ledger from it
pub fn open_ledger(path: &Path) -> Result<Arc<MemoryLedger>> {
    let file = load_ledger(path)?;
    let ledger = MemoryLedger::seed(file.accounts, file.transactions);
    for rule in file.category_rules {
        ledger.add_rule(rule)?;
    }
    Ok(Arc::new(ledger))
}

/// Wire an engine where the in-memory ledger plays every collaborator role
pub fn build_engine(ledger: &Arc<MemoryLedger>) -> AnalyticsEngine {
    AnalyticsEngine::new(
        ledger.clone(),
        ledger.clone(),
        ledger.clone(),
        ledger.clone(),
        ledger.clone(),
    )
}

/// Resolve the acting user: --user wins, otherwise the first account's owner
pub fn resolve_user(ledger: &MemoryLedger, user: Option<Uuid>) -> Result<Uuid> {
    if let Some(id) = user {
        return Ok(id);
    }
    let accounts = ledger.accounts()?;
    accounts.first().map(|a| a.user_id).ok_or_else(|| {
        anyhow::anyhow!("Ledger has no accounts. Pass --user or run 'sift import' first.")
    })
}

/// Parse a --from date as the start of that day (UTC)
pub fn parse_from_date(s: &str) -> Result<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .context("Invalid --from date format (use YYYY-MM-DD)")?;
    Ok(date.and_hms_opt(0, 0, 0).unwrap().and_utc())
}

/// Parse a --to date as the end of that day (UTC), so the day is inclusive
pub fn parse_to_date(s: &str) -> Result<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .context("Invalid --to date format (use YYYY-MM-DD)")?;
    Ok(date.and_hms_opt(23, 59, 59).unwrap().and_utc())
}

pub fn cmd_accounts(ledger_path: &Path, json: bool) -> Result<()> {
    let file = load_ledger(ledger_path)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&file.accounts)?);
        return Ok(());
    }

    if file.accounts.is_empty() {
        println!("No accounts found. Import transactions with:");
        println!("  sift import --file statement.csv --account Checking");
        return Ok(());
    }

    println!();
    println!("📁 Accounts");
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   {:20} │ {:>12} │ {:36}", "Name", "Balance", "Account Id");
    println!("   ─────────────────────┼──────────────┼──────────────────────────────────────");

    for account in &file.accounts {
        println!(
            "   {:20} │ {:>12.2} │ {}",
            truncate(&account.name, 20),
            account.available_balance,
            account.id
        );
    }

    println!();
    println!("   {} transactions on file", file.transactions.len());

    Ok(())
}
