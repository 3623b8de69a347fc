//! Error types for the expiring cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache.
///
/// `NotFound` and `Expired` are ordinary misses. `Closed` marks a violated
/// lifecycle contract and is never handed back to callers as a value: the
/// cache panics with it instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Key not present in the cache
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Key present but its TTL has elapsed (not yet swept)
    #[error("Key expired: {0}")]
    Expired(String),

    /// Rejected configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// No tokio runtime available to host the background cleaner
    #[error("No tokio runtime available to run the cleanup task")]
    NoRuntime,

    /// Operation attempted on a closed cache
    #[error("cache is closed")]
    Closed,
}

impl CacheError {
    // == Is Miss ==
    /// Returns true for the recoverable lookup failures.
    pub fn is_miss(&self) -> bool {
        matches!(self, CacheError::NotFound(_) | CacheError::Expired(_))
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
