//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use uuid::Uuid;

/// Sift - Transaction analytics and pattern detection
#[derive(Parser)]
#[command(name = "sift")]
#[command(about = "Transaction analytics and pattern detection over a JSON ledger", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Ledger file path
    #[arg(long, default_value = "ledger.json", global = true)]
    pub ledger: PathBuf,

    /// Acting user id
    ///
    /// Every command runs on behalf of a user and only sees that user's
    /// accounts. Defaults to the owner of the first account in the ledger.
    #[arg(long, global = true)]
    pub user: Option<Uuid>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print results as JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analytics summary grouped by category, time, or merchant
    Summary {
        /// Grouping dimension: category, time, merchant
        #[arg(long, default_value = "category")]
        group_by: String,

        /// Time bucket size in days for time grouping (1, 7, 30, 90, 365)
        #[arg(short, long, default_value = "30")]
        granularity: u32,

        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,

        /// Include pending transactions
        #[arg(long)]
        include_pending: bool,
    },

    /// Validate and post a batch of transactions from a JSON file
    Batch {
        /// JSON batch request file
        #[arg(short, long)]
        file: PathBuf,

        /// Validate only, post nothing
        #[arg(long)]
        validate_only: bool,

        /// Write posted transactions back to the ledger file
        #[arg(long)]
        save: bool,
    },

    /// Detect recurring merchants and monthly spending habits
    Patterns {
        /// Minimum confidence to report (0.0 to 1.0)
        #[arg(long, default_value = "0.6")]
        min_confidence: f64,

        /// Minimum occurrences for a recurring merchant
        #[arg(long, default_value = "3")]
        min_occurrences: usize,

        /// Skip the generated insight lines
        #[arg(long)]
        no_insights: bool,

        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
    },

    /// List accounts in the ledger
    Accounts,

    /// Import transactions from CSV into the ledger
    Import {
        /// CSV file to import (columns: date, amount, description[, merchant, category])
        #[arg(short, long)]
        file: PathBuf,

        /// Account name to import into (created if missing)
        #[arg(short, long)]
        account: Option<String>,

        /// Opening balance when creating a new account
        #[arg(long, default_value = "0")]
        balance: String,
    },
}
