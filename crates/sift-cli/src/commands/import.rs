//! CSV import command implementation

use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use sift_core::{Account, Transaction};
use uuid::Uuid;

use super::ledger::{load_ledger, save_ledger, LedgerFile};

/// One row of a bank statement export.
///
/// Only `date`, `amount`, and `description` are required; `merchant` and
/// `category` columns are picked up when present.
#[derive(Debug, Deserialize)]
struct CsvRow {
    date: String,
    amount: Decimal,
    description: String,
    #[serde(default)]
    merchant: Option<String>,
    #[serde(default)]
    category: Option<String>,
}

pub fn cmd_import(
    ledger_path: &Path,
    file: &Path,
    account_name: Option<String>,
    opening_balance: &str,
) -> Result<()> {
    let account_name = account_name.unwrap_or_else(|| "Imported Account".to_string());
    let opening_balance: Decimal = opening_balance
        .parse()
        .context("Invalid --balance amount")?;

    println!("📥 Importing transactions from {}...", file.display());

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(file)
        .with_context(|| format!("Failed to open file: {}", file.display()))?;

    let mut rows = Vec::new();
    for (i, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result.with_context(|| format!("Failed to parse CSV row {}", i + 1))?;
        rows.push(row);
    }

    println!("   Found {} transactions", rows.len());

    // Start a fresh ledger when the file does not exist yet
    let mut ledger = if ledger_path.exists() {
        load_ledger(ledger_path)?
    } else {
        LedgerFile::default()
    };

    // Create/get account. A new account joins the first account's owner so
    // one user sees the whole ledger.
    let account_id = match ledger
        .accounts
        .iter()
        .find(|a| a.name.eq_ignore_ascii_case(&account_name))
    {
        Some(account) => account.id,
        None => {
            let user_id = ledger
                .accounts
                .first()
                .map(|a| a.user_id)
                .unwrap_or_else(Uuid::new_v4);
            let account = Account {
                id: Uuid::new_v4(),
                user_id,
                name: account_name.clone(),
                available_balance: opening_balance,
            };
            let id = account.id;
            ledger.accounts.push(account);
            println!("   Created account: {}", account_name);
            id
        }
    };

    // Reuse category ids already present in the ledger so grouping stays
    // stable across imports
    let mut category_ids: HashMap<String, Uuid> = HashMap::new();
    for tx in &ledger.transactions {
        if let (Some(id), Some(name)) = (tx.category_id, tx.category_name.as_ref()) {
            category_ids.entry(name.clone()).or_insert(id);
        }
    }

    let mut seen: HashSet<(Uuid, NaiveDate, Decimal, String)> = ledger
        .transactions
        .iter()
        .map(|tx| {
            (
                tx.account_id,
                tx.date.date_naive(),
                tx.amount,
                tx.description.clone(),
            )
        })
        .collect();

    let mut imported = 0;
    let mut skipped = 0;
    let mut net = Decimal::ZERO;

    for (i, row) in rows.into_iter().enumerate() {
        let date = NaiveDate::parse_from_str(&row.date, "%Y-%m-%d")
            .with_context(|| format!("Invalid date in row {}: {} (use YYYY-MM-DD)", i + 1, row.date))?
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc();

        let key = (account_id, date.date_naive(), row.amount, row.description.clone());
        if !seen.insert(key) {
            skipped += 1;
            continue;
        }

        let mut tx = Transaction::new(account_id, row.amount, date, row.description);
        if let Some(merchant) = row.merchant.filter(|m| !m.is_empty()) {
            tx = tx.with_merchant(merchant);
        }
        if let Some(category) = row.category.filter(|c| !c.is_empty()) {
            let id = *category_ids
                .entry(category.clone())
                .or_insert_with(Uuid::new_v4);
            tx = tx.with_category(id, category);
        }

        net += tx.amount;
        ledger.transactions.push(tx);
        imported += 1;
    }

    // Imported activity moves the account balance, same as posting a batch
    if let Some(account) = ledger.accounts.iter_mut().find(|a| a.id == account_id) {
        account.available_balance += net;
    }
    ledger.transactions.sort_by_key(|tx| tx.date);

    save_ledger(ledger_path, &ledger)?;

    println!("✅ Import complete!");
    println!("   Imported: {}", imported);
    println!("   Skipped (duplicates): {}", skipped);
    if let Some(account) = ledger.accounts.iter().find(|a| a.id == account_id) {
        println!(
            "   Account: {} (balance {:.2})",
            account.name, account.available_balance
        );
    }
    println!("   Ledger: {}", ledger_path.display());

    Ok(())
}
