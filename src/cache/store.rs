//! Expiring Store Module
//!
//! Main cache engine combining a sharded map with TTL expiration and an
//! optional insertion-order cap.

use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::debug;

use crate::cache::{CacheEntry, CacheStats, InsertionOrder};
use crate::clock::{Clock, MonotonicClock};
use crate::error::{CacheError, Result};

/// Dead order records tolerated before the queue is compacted.
const ORDER_SLACK: usize = 64;

// == Expiring Store ==
/// Thread-safe mapping from key to value with per-entry expiration.
///
/// Entries live in a `DashMap`, so an operation locks only the shard holding
/// its key. A sweep walks the shards one at a time and never holds the whole
/// map. Concurrent `put`s on one key are linearized by the shard lock and the
/// last writer wins.
#[derive(Debug)]
pub struct ExpiringStore<K, V, C = MonotonicClock>
where
    K: Eq + Hash,
{
    entries: DashMap<K, CacheEntry<V>>,
    /// Insertion order; only maintained when the store is capped
    order: Mutex<InsertionOrder<K>>,
    stats: Mutex<CacheStats>,
    next_seq: AtomicU64,
    writes: AtomicU64,
    clock: C,
    /// Maximum number of entries, unbounded when None
    max_entries: Option<NonZeroUsize>,
    /// Run a sweep every N writes
    sweep_every: Option<u64>,
}

impl<K, V> ExpiringStore<K, V, MonotonicClock>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    // == Constructor ==
    /// Creates an unbounded store on the process monotonic clock.
    pub fn new() -> Self {
        Self::with_clock(MonotonicClock)
    }
}

impl<K, V> Default for ExpiringStore<K, V, MonotonicClock>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, C> ExpiringStore<K, V, C>
where
    K: Eq + Hash + Clone,
    V: Clone,
    C: Clock,
{
    /// Creates an unbounded store reading time from `clock`.
    pub fn with_clock(clock: C) -> Self {
        Self {
            entries: DashMap::new(),
            order: Mutex::new(InsertionOrder::new()),
            stats: Mutex::new(CacheStats::new()),
            next_seq: AtomicU64::new(0),
            writes: AtomicU64::new(0),
            clock,
            max_entries: None,
            sweep_every: None,
        }
    }

    /// Caps the store at `max_entries`, evicting the oldest insertion first.
    pub fn with_max_entries(mut self, max_entries: Option<NonZeroUsize>) -> Self {
        self.max_entries = max_entries;
        self
    }

    /// Sweeps after every `writes` insertions. `Some(0)` turns it off.
    pub fn with_sweep_every(mut self, writes: Option<u64>) -> Self {
        self.sweep_every = writes.filter(|n| *n > 0);
        self
    }

    pub fn max_entries(&self) -> Option<usize> {
        self.max_entries.map(NonZeroUsize::get)
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    // == Get ==
    /// Retrieves a live value by key.
    ///
    /// An expired entry counts as a miss and is removed on the spot.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        let lookup = self
            .entries
            .get(key)
            .map(|entry| (!entry.is_expired(now)).then(|| entry.value.clone()));

        match lookup {
            Some(Some(value)) => {
                self.stats.lock().record_hit();
                Some(value)
            }
            Some(None) => {
                // Only remove what is still expired; a put may have landed since
                let removed = self
                    .entries
                    .remove_if(key, |_, entry| entry.is_expired(now))
                    .is_some();
                let mut stats = self.stats.lock();
                if removed {
                    stats.record_expirations(1);
                    debug!("Lazily evicted expired entry");
                }
                stats.record_miss();
                None
            }
            None => {
                self.stats.lock().record_miss();
                None
            }
        }
    }

    // == Recheck ==
    /// Looks a key up again after waiting on a concurrent writer.
    ///
    /// A live value counts as a hit. Absence is not counted, the caller's
    /// first lookup already recorded the miss.
    pub fn recheck(&self, key: &K) -> Option<V> {
        let value = self.peek(key)?;
        self.stats.lock().record_hit();
        Some(value)
    }

    // == Contains ==
    /// Returns true if a live entry exists. Does not touch statistics.
    pub fn contains(&self, key: &K) -> bool {
        let now = self.clock.now();
        self.entries
            .get(key)
            .map_or(false, |entry| !entry.is_expired(now))
    }

    // == Peek ==
    /// Returns a live value without touching statistics or evicting.
    pub fn peek(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        self.entries
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.value.clone())
    }

    // == Put ==
    /// Stores a value that expires `ttl` from now.
    ///
    /// Re-inserting a key replaces its entry and restarts its TTL. A zero
    /// TTL is rejected with `InvalidTtl`. A TTL longer than the clock can
    /// represent never expires.
    pub fn put(&self, key: K, value: V, ttl: Duration) -> Result<()> {
        if ttl.is_zero() {
            return Err(CacheError::InvalidTtl(
                "ttl must be a positive duration".to_string(),
            ));
        }
        self.insert(key, value, ttl);
        Ok(())
    }

    /// Stores a value for a TTL the caller has already checked is positive.
    pub(crate) fn insert(&self, key: K, value: V, ttl: Duration) {
        let now = self.clock.now();

        match self.max_entries {
            Some(max) => {
                // Capped writes serialize on the order lock so the cap holds.
                // Lookups never take it.
                let mut order = self.order.lock();
                let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
                if !self.entries.contains_key(&key) && self.entries.len() >= max.get() {
                    // Reclaim expired slots before evicting anything live
                    let removed = self.remove_expired(now);
                    if removed > 0 {
                        debug!("Reclaimed {} expired entries at capacity", removed);
                    }
                    while self.entries.len() >= max.get() && self.evict_oldest(&mut order) {}
                }
                order.push(seq, key.clone());
                self.entries.insert(key, CacheEntry::new(value, now, ttl, seq));
                self.compact_order(&mut order);
            }
            None => {
                let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
                self.entries.insert(key, CacheEntry::new(value, now, ttl, seq));
            }
        }

        let writes = self.writes.fetch_add(1, Ordering::Relaxed) + 1;
        if let Some(every) = self.sweep_every {
            if writes % every == 0 {
                let removed = self.sweep();
                debug!("Write-triggered sweep removed {} entries", removed);
            }
        }
    }

    // == Sweep ==
    /// Removes all expired entries from the store.
    ///
    /// Locks one shard at a time, so lookups on keys in other shards proceed
    /// while the pass runs. Returns the number of entries removed.
    pub fn sweep(&self) -> usize {
        let removed = self.remove_expired(self.clock.now());
        if self.max_entries.is_some() {
            let mut order = self.order.lock();
            self.compact_order(&mut order);
        }
        removed
    }

    // == Clear ==
    /// Empties the store and resets its statistics.
    pub fn clear(&self) {
        let mut order = self.order.lock();
        self.entries.clear();
        order.clear();
        *self.stats.lock() = CacheStats::new();
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.lock().clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    // == TTL Remaining ==
    /// Remaining lifetime of a live entry.
    pub fn ttl_remaining(&self, key: &K) -> Option<Duration> {
        let now = self.clock.now();
        self.entries
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.ttl_remaining(now))
    }

    // == Length ==
    /// Returns the number of stored entries, including expired ones not yet
    /// removed.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn remove_expired(&self, now: Instant) -> usize {
        let mut removed = 0;
        self.entries.retain(|_, entry| {
            let expired = entry.is_expired(now);
            if expired {
                removed += 1;
            }
            !expired
        });
        if removed > 0 {
            self.stats.lock().record_expirations(removed);
        }
        removed
    }

    /// Evicts the oldest-inserted live entry. Returns false if none is left.
    fn evict_oldest(&self, order: &mut InsertionOrder<K>) -> bool {
        while let Some((seq, key)) = order.pop_oldest() {
            if self.entries.remove_if(&key, |_, entry| entry.seq == seq).is_some() {
                self.stats.lock().record_eviction();
                return true;
            }
        }
        false
    }

    fn compact_order(&self, order: &mut InsertionOrder<K>) {
        if order.len() > self.entries.len() * 2 + ORDER_SLACK {
            order.compact(|seq, key| self.entries.get(key).map(|e| e.seq) == Some(seq));
        }
    }
}
