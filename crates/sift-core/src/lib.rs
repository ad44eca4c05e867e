//! Sift Core Library
//!
//! Shared functionality for the Sift transaction analytics engine:
//! - Grouped analytics over transaction history (category, time, merchant)
//! - Batch validation and strategy-based transaction processing
//! - Recurring pattern detection with plain-language insights
//! - Collaborator traits for storage, risk scoring, and processing
//! - An in-memory ledger implementation backing the CLI and tests

pub mod aggregate;
pub mod batch;
pub mod engine;
pub mod error;
pub mod memory;
pub mod models;
pub mod patterns;
pub mod sources;

pub use aggregate::{
    group_transactions, AnalyticsCriteria, AnalyticsSummary, CategoryGroup, Grouped, MerchantGroup,
    TimeGroup,
};
pub use batch::{
    BatchDispatcher, BatchOutcome, BatchRequest, BatchStatus, BatchValidator, ProcessedTransaction,
    Strategy, TransactionDraft, ValidationLimits, ValidationResult, BASE_CURRENCY,
};
pub use engine::AnalyticsEngine;
pub use error::{Error, Result};
pub use memory::{BalanceSnapshot, CategoryRule, MemoryLedger};
pub use models::{
    Account, DateRange, Granularity, GroupKey, RiskMetrics, SplitInfo, Transaction,
    TransactionKind, TransactionStatus,
};
pub use patterns::{
    Pattern, PatternConfig, PatternCriteria, PatternKind, PatternMiner, PatternReport,
};
pub use sources::{
    AccountSource, PostProcessor, RiskAnalyzer, StrategyProcessor, TransactionFilter,
    TransactionSource,
};
