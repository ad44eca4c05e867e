//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `batch` - Batch validation and posting from a JSON request file
//! - `import` - CSV import into the ledger file
//! - `ledger` - Ledger file loading/saving and shared engine setup
//! - `patterns` - Recurring spending detection
//! - `summary` - Analytics summary command (plus the accounts listing)

pub mod batch;
pub mod import;
pub mod ledger;
pub mod patterns;
pub mod summary;

// Re-export command functions for main.rs
pub use batch::*;
pub use import::*;
pub use ledger::*;
pub use patterns::*;
pub use summary::*;

/// Truncate a string to a maximum length in bytes, adding "..." if
/// truncated. The cut always lands on a character boundary.
pub fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let cut = s
        .char_indices()
        .map(|(i, _)| i)
        .take_while(|&i| i <= max.saturating_sub(3))
        .last()
        .unwrap_or(0);
    format!("{}...", &s[..cut])
}
