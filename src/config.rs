//! Configuration Module
//!
//! Decoration-time settings for a memoized function and the background sweep.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{CacheError, Result};

/// Default TTL applied when none is configured.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Default interval between background sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// Memoization parameters fixed at decoration time.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoConfig {
    /// Lifetime of every stored result unless a call overrides it
    pub ttl: Duration,
    /// Optional cap; the oldest-inserted entry is evicted when exceeded
    pub max_entries: Option<usize>,
    /// Run an inline sweep every N writes
    pub sweep_every: Option<u64>,
    /// Let only one caller compute a missing key while the rest wait
    pub single_flight: bool,
}

impl MemoConfig {
    /// Creates a config with the given TTL and defaults for everything else.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            ..Self::default()
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = Some(max_entries);
        self
    }

    pub fn with_sweep_every(mut self, writes: u64) -> Self {
        self.sweep_every = Some(writes);
        self
    }

    pub fn with_single_flight(mut self, enabled: bool) -> Self {
        self.single_flight = enabled;
        self
    }

    // == Validate ==
    /// Checks every field, failing on the first value out of range.
    pub fn validate(&self) -> Result<()> {
        if self.ttl.is_zero() {
            return Err(CacheError::InvalidTtl(
                "ttl must be a positive duration".to_string(),
            ));
        }
        if self.max_entries == Some(0) {
            return Err(CacheError::InvalidConfig(
                "max_entries must be at least 1".to_string(),
            ));
        }
        if self.sweep_every == Some(0) {
            return Err(CacheError::InvalidConfig(
                "sweep_every must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Creates a new MemoConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `TTL_CACHE_TTL_MS` - Entry lifetime in milliseconds (default: 300000)
    /// - `TTL_CACHE_MAX_ENTRIES` - Entry cap (default: unbounded)
    /// - `TTL_CACHE_SWEEP_EVERY` - Inline sweep period in writes (default: off)
    /// - `TTL_CACHE_SINGLE_FLIGHT` - `true`/`false` (default: false)
    pub fn from_env() -> Self {
        Self {
            ttl: parse_var::<u64>("TTL_CACHE_TTL_MS")
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_TTL),
            max_entries: parse_var("TTL_CACHE_MAX_ENTRIES"),
            sweep_every: parse_var("TTL_CACHE_SWEEP_EVERY"),
            single_flight: parse_var("TTL_CACHE_SINGLE_FLIGHT").unwrap_or(false),
        }
    }
}

impl Default for MemoConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            max_entries: None,
            sweep_every: None,
            single_flight: false,
        }
    }
}

/// Background sweep settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepConfig {
    /// Time between sweep passes
    pub interval: Duration,
}

impl SweepConfig {
    /// Reads `TTL_CACHE_SWEEP_INTERVAL_MS` (default: 1000). Zero falls back
    /// to the default.
    pub fn from_env() -> Self {
        Self {
            interval: parse_var::<u64>("TTL_CACHE_SWEEP_INTERVAL_MS")
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_SWEEP_INTERVAL),
        }
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = MemoConfig::default();
        assert_eq!(config.ttl, Duration::from_secs(300));
        assert_eq!(config.max_entries, None);
        assert_eq!(config.sweep_every, None);
        assert!(!config.single_flight);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = MemoConfig::new(Duration::from_secs(2))
            .with_max_entries(10)
            .with_sweep_every(50)
            .with_single_flight(true);

        assert_eq!(config.ttl, Duration::from_secs(2));
        assert_eq!(config.max_entries, Some(10));
        assert_eq!(config.sweep_every, Some(50));
        assert!(config.single_flight);
    }

    #[test]
    fn test_validate_zero_ttl() {
        let config = MemoConfig::new(Duration::ZERO);
        assert!(matches!(config.validate(), Err(CacheError::InvalidTtl(_))));
    }

    #[test]
    fn test_validate_zero_cap() {
        let config = MemoConfig::default().with_max_entries(0);
        assert!(matches!(config.validate(), Err(CacheError::InvalidConfig(_))));

        let config = MemoConfig::default().with_sweep_every(0);
        assert!(matches!(config.validate(), Err(CacheError::InvalidConfig(_))));
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("TTL_CACHE_TTL_MS");
        env::remove_var("TTL_CACHE_MAX_ENTRIES");
        env::remove_var("TTL_CACHE_SWEEP_EVERY");
        env::remove_var("TTL_CACHE_SINGLE_FLIGHT");
        env::remove_var("TTL_CACHE_SWEEP_INTERVAL_MS");

        assert_eq!(MemoConfig::from_env(), MemoConfig::default());
        assert_eq!(SweepConfig::from_env(), SweepConfig::default());
    }

    #[test]
    fn test_zero_sweep_interval_uses_default() {
        env::set_var("TTL_CACHE_SWEEP_INTERVAL_MS", "0");
        let sweep = SweepConfig::from_env();
        env::remove_var("TTL_CACHE_SWEEP_INTERVAL_MS");

        assert_eq!(sweep.interval, DEFAULT_SWEEP_INTERVAL);
    }
}
