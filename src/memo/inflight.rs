//! In-flight call coalescing.
//!
//! One lock per key currently being computed. Callers that miss on the same
//! key queue on that lock, so only the first one runs the wrapped function.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::key::CacheKey;

#[derive(Debug, Default)]
pub struct InFlight {
    slots: Mutex<HashMap<CacheKey, Arc<Mutex<()>>>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    // == Run ==
    /// Runs `f` while holding the lock for `key`.
    ///
    /// The slot is dropped once no other caller is waiting on it.
    pub fn run<T>(&self, key: &CacheKey, f: impl FnOnce() -> T) -> T {
        let slot = {
            let mut slots = self.slots.lock();
            Arc::clone(
                slots
                    .entry(key.clone())
                    .or_insert_with(|| Arc::new(Mutex::new(()))),
            )
        };

        let result = {
            let _guard = slot.lock();
            f()
        };

        // Clones are only taken under the map lock, so the count is stable here
        let mut slots = self.slots.lock();
        if Arc::strong_count(&slot) == 2 {
            slots.remove(key);
        }
        result
    }

    /// Number of keys with a computation running or queued.
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::{CallArgs, KeyDeriver};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn key(n: i64) -> CacheKey {
        KeyDeriver::new("f").derive(&CallArgs::new().arg(n)).unwrap()
    }

    #[test]
    fn test_slot_removed_after_run() {
        let inflight = InFlight::new();
        let value = inflight.run(&key(1), || 42);
        assert_eq!(value, 42);
        assert!(inflight.is_empty());
    }

    #[test]
    fn test_same_key_runs_are_serialized() {
        let inflight = InFlight::new();
        let active = AtomicUsize::new(0);
        let max_active = AtomicUsize::new(0);

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    inflight.run(&key(1), || {
                        let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                        max_active.fetch_max(now, Ordering::SeqCst);
                        std::thread::sleep(Duration::from_millis(5));
                        active.fetch_sub(1, Ordering::SeqCst);
                    });
                });
            }
        });

        assert_eq!(max_active.load(Ordering::SeqCst), 1);
        assert!(inflight.is_empty());
    }

    #[test]
    fn test_distinct_keys_do_not_share_a_slot() {
        let inflight = InFlight::new();
        let inner = inflight.run(&key(1), || inflight.run(&key(2), || inflight.len()));
        assert_eq!(inner, 2);
    }
}
