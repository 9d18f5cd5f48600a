//! Error types for the economy services.
//!
//! Business outcomes that callers must branch on ([`InsufficientBalance`],
//! earn denials) are typed values; store failures surface as `Persistence`.

use posty_core::error::InsufficientBalance;
use posty_core::types::Tokens;
use posty_store::StoreError;

/// Errors returned by ledger and governor operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Spend exceeds the current balance. Recoverable; do not retry.
    #[error(transparent)]
    InsufficientBalance(#[from] InsufficientBalance),

    /// Amounts must be strictly positive.
    #[error("Invalid token amount: {0}")]
    InvalidAmount(Tokens),

    /// The durable store could not be read or written.
    #[error("Persistence failure: {0}")]
    Persistence(#[from] StoreError),
}

/// Errors returned by badge counter mutations.
#[derive(Debug, thiserror::Error)]
pub enum BadgeError {
    /// The durable store could not be written; in-memory state is unchanged.
    #[error("Persistence failure: {0}")]
    Persistence(#[from] StoreError),
}
