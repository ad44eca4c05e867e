//! Sift CLI - Transaction analytics and pattern detection
//!
//! Usage:
//!   sift import --file CSV       Import transactions into the ledger
//!   sift summary --group-by time Analytics summary over a dimension
//!   sift batch --file batch.json Validate and post a transaction batch
//!   sift patterns                Detect recurring spending

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Summary {
            group_by,
            granularity,
            from,
            to,
            include_pending,
        } => {
            commands::cmd_summary(
                &cli.ledger,
                cli.user,
                &group_by,
                granularity,
                from.as_deref(),
                to.as_deref(),
                include_pending,
                cli.json,
            )
            .await
        }
        Commands::Batch {
            file,
            validate_only,
            save,
        } => {
            commands::cmd_batch(&cli.ledger, cli.user, &file, validate_only, save, cli.json).await
        }
        Commands::Patterns {
            min_confidence,
            min_occurrences,
            no_insights,
            from,
            to,
        } => {
            commands::cmd_patterns(
                &cli.ledger,
                cli.user,
                min_confidence,
                min_occurrences,
                no_insights,
                from.as_deref(),
                to.as_deref(),
                cli.json,
            )
            .await
        }
        Commands::Accounts => commands::cmd_accounts(&cli.ledger, cli.json),
        Commands::Import {
            file,
            account,
            balance,
        } => commands::cmd_import(&cli.ledger, &file, account, &balance),
    }
}
