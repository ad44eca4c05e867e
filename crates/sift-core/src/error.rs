//! Error types for sift
//!
//! The taxonomy is deliberately closed: every failure a caller can see maps
//! to one of these variants, each with a stable machine-readable code and a
//! human-readable message. Insufficient data for pattern detection is *not*
//! an error; it is a successful empty report carrying a message.

use thiserror::Error;
use uuid::Uuid;

use crate::batch::BatchOutcome;

#[derive(Error, Debug)]
pub enum Error {
    /// The caller supplied no authenticated user identity.
    #[error("No authenticated user")]
    Unauthorized,

    /// The batch references an account the caller does not own. The whole
    /// batch is rejected before any per-transaction validation runs.
    #[error("Not authorized for account {0}")]
    NotAuthorizedForAccount(Uuid),

    /// Unknown grouping key, malformed parameter, or a caller with no
    /// accounts to analyze.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// One or more transactions in the batch failed validation. Carries the
    /// full outcome (status `Failed`, zero processed, every per-transaction
    /// result) so callers can report the details without a side channel.
    #[error("Batch validation failed: {} of {} transactions rejected", .0.rejected_count(), .0.total_count)]
    ValidationFailed(BatchOutcome),

    /// A strategy or post-processing collaborator call failed mid-batch.
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),

    /// The risk analyzer or a data source is unreachable. Distinct from a
    /// legitimately empty result.
    #[error("Collaborator unavailable: {0}")]
    CollaboratorUnavailable(String),
}

impl Error {
    /// Stable, enumerable code for each failure category. These strings are
    /// part of the public contract; the Display messages are not.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Unauthorized => "unauthorized",
            Error::NotAuthorizedForAccount(_) => "not_authorized_for_account",
            Error::InvalidArgument(_) => "invalid_argument",
            Error::ValidationFailed(_) => "validation_failed",
            Error::ProcessingFailed(_) => "processing_failed",
            Error::CollaboratorUnavailable(_) => "collaborator_unavailable",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
