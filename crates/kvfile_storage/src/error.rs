//! Error types for store operations.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A mutation was attempted inside a read-only transaction.
    #[error("transaction is read-only")]
    ReadOnlyTransaction,

    /// The store connection is closed.
    #[error("store connection is closed")]
    Closed,

    /// The underlying store rejected or failed a request.
    #[error("store request failed: {0}")]
    Request(String),
}

impl StoreError {
    /// Creates a request failure from the store's own error text.
    pub fn request(message: impl Into<String>) -> Self {
        Self::Request(message.into())
    }
}
