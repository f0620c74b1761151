//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::{Duration, Instant};

// == Cache Entry ==
/// A single stored result with its expiration instant.
///
/// `expires_at` is fixed at insertion; re-inserting a key replaces the
/// whole entry instead of touching this one. A TTL too long for the clock to
/// represent leaves it `None`, and the entry never expires.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The memoized value
    pub value: V,
    /// Monotonic instant of insertion
    pub inserted_at: Instant,
    /// Monotonic instant after which the entry is invalid
    pub expires_at: Option<Instant>,
    /// Insertion sequence number, used to recognize stale order records
    pub seq: u64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates an entry inserted at `now` that lives for `ttl`.
    ///
    pub fn new(value: V, now: Instant, ttl: Duration, seq: u64) -> Self {
        Self {
            value,
            inserted_at: now,
            expires_at: now.checked_add(ttl),
            seq,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// Boundary condition: an entry is expired once `now >= expires_at`, so
    /// it is valid strictly before the TTL has fully elapsed.
    pub fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.map_or(false, |at| now >= at)
    }

    // == Time To Live ==
    /// Returns the remaining lifetime, or zero once expired.
    pub fn ttl_remaining(&self, now: Instant) -> Duration {
        self.expires_at
            .map_or(Duration::MAX, |at| at.saturating_duration_since(now))
    }
}
