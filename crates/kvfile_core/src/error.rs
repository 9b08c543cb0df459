//! Error types for kvfile core.

use kvfile_storage::StoreError;
use thiserror::Error;

/// Result type for file operations.
pub type FileResult<T> = Result<T, FileError>;

/// Errors that can occur in file engine operations.
#[derive(Debug, Error)]
pub enum FileError {
    /// The operation requires file metadata but none exists for the path.
    #[error("file not found: {path}")]
    NotFound {
        /// The path that has no stored metadata.
        path: String,
    },

    /// The cursor is at or beyond the logical end of the file, or a
    /// negative seek offset was supplied (the engine reuses this error
    /// kind for invalid negative seeks).
    #[error("end of file")]
    EndOfFile,

    /// A write was attempted on a read-only handle.
    #[error("file handle is read-only")]
    ReadOnly,

    /// A non-positive version was supplied to a write.
    #[error("invalid version: {version}")]
    InvalidVersion {
        /// The rejected version value.
        version: i64,
    },

    /// An argument was outside its accepted set.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Description of the rejected argument.
        message: String,
    },

    /// The handle was closed and can no longer reach the store.
    #[error("file handle is closed")]
    Closed,

    /// The content needs more pages than the key scheme can order.
    #[error("file too large: {page_count} pages exceeds the {max_page_count} page limit")]
    TooLarge {
        /// Pages the content would need.
        page_count: u32,
        /// The engine's page limit.
        max_page_count: u32,
    },

    /// A stored record failed validation.
    #[error("stored record corrupted: {message}")]
    Corrupted {
        /// Description of the corruption.
        message: String,
    },

    /// Store adapter error, surfaced verbatim.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl FileError {
    /// Creates a not-found error for a path.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Creates an invalid-argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates a corrupted-record error.
    pub fn corrupted(message: impl Into<String>) -> Self {
        Self::Corrupted {
            message: message.into(),
        }
    }
}
