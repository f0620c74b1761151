//! Memoization Wrapper
//!
//! Binds a function to its own expiring store and runs the hit/miss protocol
//! on every call.

use std::fmt;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::cache::ExpiringStore;
use crate::clock::{Clock, MonotonicClock};
use crate::config::MemoConfig;
use crate::error::Result;
use crate::key::{CacheKey, CallArgs, KeyDeriver, Signature};
use crate::memo::{InFlight, Ttl};

// == Cache Info ==
/// Snapshot of a memoized function's cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheInfo {
    /// Entries currently stored, expired ones not yet removed included
    pub size: usize,
    /// Results served from the cache, single-flight waiters included
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    /// Calls that ran uncached because their arguments could not be keyed
    pub uncached_calls: u64,
    pub ttl_ms: u64,
    pub max_entries: Option<usize>,
}

// == Memoized ==
/// A function wrapped with a TTL cache.
///
/// Each wrapper owns its store; dropping the wrapper drops every cached
/// result. Only `Ok` results are stored.
pub struct Memoized<F, V, C = MonotonicClock> {
    func: F,
    deriver: KeyDeriver,
    store: Arc<ExpiringStore<CacheKey, V, C>>,
    ttl: Ttl,
    inflight: Option<InFlight>,
    uncached_calls: AtomicU64,
}

/// Wraps `func` under `name` with the given configuration.
///
/// Fails with `InvalidTtl` or `InvalidConfig` when `config` does not validate.
pub fn memoize<F, V, E>(name: &str, config: MemoConfig, func: F) -> Result<Memoized<F, V>>
where
    F: Fn(&CallArgs) -> std::result::Result<V, E>,
    V: Clone,
{
    Memoized::new(name, config, func)
}

impl<F, V> Memoized<F, V, MonotonicClock>
where
    V: Clone,
{
    // == Constructor ==
    /// Creates a wrapper with strict key derivation.
    pub fn new<E>(name: &str, config: MemoConfig, func: F) -> Result<Self>
    where
        F: Fn(&CallArgs) -> std::result::Result<V, E>,
    {
        Self::with_clock(KeyDeriver::new(name), config, MonotonicClock, func)
    }

    /// Creates a wrapper that binds calls to `signature` before keying, so
    /// positional and keyword forms of one call share an entry.
    pub fn with_signature<E>(
        name: &str,
        signature: &Signature,
        config: MemoConfig,
        func: F,
    ) -> Result<Self>
    where
        F: Fn(&CallArgs) -> std::result::Result<V, E>,
    {
        let deriver = KeyDeriver::with_signature(name, signature)?;
        Self::with_clock(deriver, config, MonotonicClock, func)
    }
}

impl<F, V, C> Memoized<F, V, C>
where
    V: Clone,
    C: Clock,
{
    /// Creates a wrapper from an explicit deriver and clock.
    pub fn with_clock<E>(deriver: KeyDeriver, config: MemoConfig, clock: C, func: F) -> Result<Self>
    where
        F: Fn(&CallArgs) -> std::result::Result<V, E>,
    {
        config.validate()?;
        let ttl = Ttl::new(config.ttl)?;
        let store = ExpiringStore::with_clock(clock)
            .with_max_entries(config.max_entries.and_then(NonZeroUsize::new))
            .with_sweep_every(config.sweep_every);

        debug!(
            function = deriver.function(),
            ttl_ms = ttl.as_millis(),
            max_entries = ?config.max_entries,
            single_flight = config.single_flight,
            "Memoized function created"
        );

        Ok(Self {
            func,
            deriver,
            store: Arc::new(store),
            ttl,
            inflight: config.single_flight.then(InFlight::new),
            uncached_calls: AtomicU64::new(0),
        })
    }

    // == Call ==
    /// Calls the wrapped function, answering from the cache when possible.
    pub fn call<E>(&self, args: &CallArgs) -> std::result::Result<V, E>
    where
        F: Fn(&CallArgs) -> std::result::Result<V, E>,
    {
        self.call_with_ttl(args, self.ttl)
    }

    /// Like [`call`](Self::call), but a result computed by this call is
    /// stored for `ttl` instead of the configured default.
    pub fn call_with_ttl<E>(&self, args: &CallArgs, ttl: Ttl) -> std::result::Result<V, E>
    where
        F: Fn(&CallArgs) -> std::result::Result<V, E>,
    {
        let key = match self.deriver.derive(args) {
            Ok(key) => key,
            Err(err) => {
                self.uncached_calls.fetch_add(1, Ordering::Relaxed);
                warn!(
                    function = self.deriver.function(),
                    error = %err,
                    "Arguments cannot be keyed, calling uncached"
                );
                return (self.func)(args);
            }
        };

        if let Some(value) = self.store.get(&key) {
            debug!(key = %key, "Cache hit");
            return Ok(value);
        }
        debug!(key = %key, "Cache miss");

        match &self.inflight {
            Some(inflight) => inflight.run(&key, || {
                // A caller ahead of us may have stored the result already
                if let Some(value) = self.store.recheck(&key) {
                    debug!(key = %key, "Result computed by concurrent caller");
                    return Ok(value);
                }
                self.compute_and_store(key.clone(), args, ttl)
            }),
            None => self.compute_and_store(key, args, ttl),
        }
    }

    fn compute_and_store<E>(
        &self,
        key: CacheKey,
        args: &CallArgs,
        ttl: Ttl,
    ) -> std::result::Result<V, E>
    where
        F: Fn(&CallArgs) -> std::result::Result<V, E>,
    {
        let value = (self.func)(args)?;
        self.store.insert(key, value.clone(), ttl.get());
        debug!(function = self.deriver.function(), "Stored result");
        Ok(value)
    }

    // == Cache Clear ==
    /// Drops every cached result and resets the counters.
    pub fn cache_clear(&self) {
        self.store.clear();
        self.uncached_calls.store(0, Ordering::Relaxed);
        debug!(function = self.deriver.function(), "Cache cleared");
    }

    // == Cache Info ==
    pub fn cache_info(&self) -> CacheInfo {
        let stats = self.store.stats();
        CacheInfo {
            size: stats.total_entries,
            hits: stats.hits,
            misses: stats.misses,
            evictions: stats.evictions,
            expirations: stats.expirations,
            uncached_calls: self.uncached_calls.load(Ordering::Relaxed),
            ttl_ms: self.ttl.as_millis(),
            max_entries: self.store.max_entries(),
        }
    }

    /// Shared handle to the backing store, e.g. for a background sweep.
    pub fn store(&self) -> Arc<ExpiringStore<CacheKey, V, C>> {
        Arc::clone(&self.store)
    }

    pub fn name(&self) -> &str {
        self.deriver.function()
    }

    pub fn ttl(&self) -> Ttl {
        self.ttl
    }
}

impl<F, V, C> fmt::Debug for Memoized<F, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memoized")
            .field("function", &self.deriver.function())
            .field("ttl", &self.ttl)
            .field("single_flight", &self.inflight.is_some())
            .finish()
    }
}
