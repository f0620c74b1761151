//! Error types for the memoization engine
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// TTL is not a positive duration
    #[error("Invalid TTL: {0}")]
    InvalidTtl(String),

    /// An argument cannot take part in a cache key
    #[error("Unhashable argument: {0}")]
    UnhashableArgument(String),

    /// Call arguments do not fit the declared signature
    #[error("Signature mismatch: {0}")]
    SignatureMismatch(String),

    /// Configuration value out of range
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

impl CacheError {
    // == Is Key Error ==
    /// Returns true for errors raised while deriving a cache key.
    ///
    /// The memoization wrapper recovers from these by running the wrapped
    /// function uncached.
    pub fn is_key_error(&self) -> bool {
        matches!(
            self,
            CacheError::UnhashableArgument(_) | CacheError::SignatureMismatch(_)
        )
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache engine.
pub type Result<T> = std::result::Result<T, CacheError>;
