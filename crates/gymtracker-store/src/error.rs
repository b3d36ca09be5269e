//! Error types for the gymtracker-store crate.
//!
//! All storage operations return [`StoreError`] via [`StoreResult`].
//! "Not found" is never an error here: lookups return `Option`, updates
//! return `bool` and deletes return a row count.

use thiserror::Error;

/// Alias for `Result<T, StoreError>`.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in the storage engine.
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLite operation failed.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// JSON serialization or deserialization failed (preference files).
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem I/O failed (preference files, data directory).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Creating or resetting the schema failed.
    #[error("schema v{version} failed: {message}")]
    Schema { version: u32, message: String },

    /// An invalid argument was provided, or a stored value could not be
    /// mapped back into its domain type.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A cryptographic primitive was unavailable or failed.
    #[error("crypto error: {0}")]
    Crypto(String),

    /// The shared connection lock was poisoned by a panicking holder.
    #[error("lock poisoned: {0}")]
    Lock(String),
}
