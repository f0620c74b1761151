//! Validated time-to-live.

use std::time::Duration;

use crate::error::{CacheError, Result};

// == Ttl ==
/// A positive duration, checked once at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ttl(Duration);

impl Ttl {
    /// Fails with `InvalidTtl` for a zero duration.
    pub fn new(duration: Duration) -> Result<Self> {
        if duration.is_zero() {
            return Err(CacheError::InvalidTtl(
                "ttl must be a positive duration".to_string(),
            ));
        }
        Ok(Self(duration))
    }

    pub fn from_secs(secs: u64) -> Result<Self> {
        Self::new(Duration::from_secs(secs))
    }

    pub fn from_millis(millis: u64) -> Result<Self> {
        Self::new(Duration::from_millis(millis))
    }

    pub fn get(self) -> Duration {
        self.0
    }

    /// Whole milliseconds, saturating at `u64::MAX`.
    pub fn as_millis(self) -> u64 {
        u64::try_from(self.0.as_millis()).unwrap_or(u64::MAX)
    }
}

impl TryFrom<Duration> for Ttl {
    type Error = CacheError;

    fn try_from(duration: Duration) -> Result<Self> {
        Self::new(duration)
    }
}

impl From<Ttl> for Duration {
    fn from(ttl: Ttl) -> Self {
        ttl.0
    }
}
