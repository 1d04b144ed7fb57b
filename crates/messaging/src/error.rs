//! Queue error types.

use thiserror::Error;

/// Errors reported by queue backends.
#[derive(Debug, Error)]
pub enum QueueError {
    /// The receipt does not match an in-flight message, usually because its
    /// visibility timeout expired and it was delivered again.
    #[error("Receipt not found on queue {queue}: {receipt}")]
    ReceiptNotFound { queue: String, receipt: String },

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Convenience type alias for queue results.
pub type Result<T> = std::result::Result<T, QueueError>;
