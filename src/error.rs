//! Error types for the Tradepost core.

use std::time::Duration;
use thiserror::Error;

/// Main error type for Tradepost operations.
///
/// No variant is fatal to the process; every error is scoped to a single
/// operation and recoverable by the caller retrying or informing the user.
#[derive(Error, Debug)]
pub enum TradepostError {
    /// Input failed validation (non-positive amount, out-of-range price,
    /// missing fields).
    #[error("Validation error: {0}")]
    Validation(String),

    /// A listing or offer was not found.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The acting user is not allowed to perform the operation.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The entity is in a state that does not permit the operation
    /// (offer no longer pending, listing no longer active).
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Too many failed login attempts for this client key.
    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited {
        /// Time remaining until the block expires.
        retry_after: Duration,
    },

    /// A listing write lost a serialization race and retries were exhausted.
    #[error("Concurrency conflict: {0}")]
    Conflict(String),

    /// The durable store failed for a reason other than a conflict.
    #[error("Store error: {0}")]
    Store(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Tradepost operations.
pub type Result<T> = std::result::Result<T, TradepostError>;
