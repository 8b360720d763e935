/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result alias for pool construction and configuration
pub type PoolResult<T> = Result<T, PoolError>;

/// Result alias for cancellable lock acquisition
pub type AcquireResult<T> = Result<T, AcquireError>;

/// Pool construction and configuration errors
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum PoolError {
    #[error("Invalid pool capacity: {0}")]
    #[diagnostic(
        code(pool::invalid_capacity),
        help("A mutex pool needs at least one lock. Use a capacity of 1 or more.")
    )]
    InvalidCapacity(usize),

    #[error("Unknown hash algorithm: {0}")]
    #[diagnostic(
        code(pool::unknown_hash),
        help("Use one of: identity, md5, sha1, sha256, sha512, crc32, fnv32, fnv32a, fnv64, fnv64a, fnv128, fnv128a, ahash.")
    )]
    UnknownHash(String),

    #[error("Unknown shard strategy: {0}")]
    #[diagnostic(
        code(pool::unknown_strategy),
        help("Use one of: reference, direct, streaming.")
    )]
    UnknownStrategy(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(
        code(pool::configuration_error),
        help("Invalid configuration. Review the JSON document or MUTEX_POOL_* environment variables.")
    )]
    Config(String),
}

impl From<serde_json::Error> for PoolError {
    fn from(err: serde_json::Error) -> Self {
        PoolError::Config(err.to_string())
    }
}

/// Cancellable acquisition errors
///
/// Either variant means the lock is NOT held; the caller must not release it.
#[derive(Error, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(rename_all = "snake_case")]
pub enum AcquireError {
    #[error("Lock acquisition was cancelled")]
    #[diagnostic(
        code(lock::cancelled),
        help("The cancel token fired before the lock became available.")
    )]
    Cancelled,

    #[error("Lock acquisition deadline exceeded")]
    #[diagnostic(
        code(lock::deadline_exceeded),
        help("The lock stayed contended past the deadline. Check for long critical sections or shard collisions.")
    )]
    DeadlineExceeded,
}
