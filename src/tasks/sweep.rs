//! Sweep Task
//!
//! Background task that periodically removes expired entries, reclaiming
//! memory for keys that are never looked up again.

use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::ExpiringStore;
use crate::clock::Clock;

/// Spawns a background task that periodically sweeps expired entries.
///
/// The task runs in an infinite loop, sleeping for `interval` between
/// passes. A pass locks one shard of the store at a time, so lookups keep
/// being served while it runs.
///
/// # Returns
/// A JoinHandle for the spawned task; abort it to stop sweeping.
///
/// # Example
/// ```ignore
/// let square = memoize("square", MemoConfig::default(), |args: &CallArgs| { ... })?;
/// let sweep_handle = spawn_sweep_task(square.store(), Duration::from_secs(1));
/// // Later, during shutdown:
/// sweep_handle.abort();
/// ```
pub fn spawn_sweep_task<K, V, C>(
    store: Arc<ExpiringStore<K, V, C>>,
    interval: Duration,
) -> JoinHandle<()>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    C: Clock + 'static,
{
    tokio::spawn(async move {
        info!("Starting sweep task with interval of {:?}", interval);

        loop {
            tokio::time::sleep(interval).await;

            let removed = store.sweep();

            if removed > 0 {
                info!("Sweep: removed {} expired entries", removed);
            } else {
                debug!("Sweep: no expired entries found");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    const INTERVAL: Duration = Duration::from_millis(20);

    fn manual_store() -> (Arc<ExpiringStore<String, String, ManualClock>>, ManualClock) {
        let clock = ManualClock::new();
        (Arc::new(ExpiringStore::with_clock(clock.clone())), clock)
    }

    #[tokio::test]
    async fn test_sweep_task_removes_expired_entries() {
        let (store, clock) = manual_store();
        store
            .put("expire_soon".to_string(), "value".to_string(), Duration::from_secs(1))
            .unwrap();
        clock.advance(Duration::from_secs(2));

        let handle = spawn_sweep_task(store.clone(), INTERVAL);

        // Wait for at least one pass
        tokio::time::sleep(INTERVAL * 5).await;

        // Removed without ever being looked up
        assert!(store.is_empty(), "Expired entry should have been swept");
        assert_eq!(store.stats().misses, 0);
        assert_eq!(store.stats().expirations, 1);

        handle.abort();
    }

    #[tokio::test]
    async fn test_sweep_task_preserves_valid_entries() {
        let (store, _) = manual_store();
        store
            .put("long_lived".to_string(), "value".to_string(), Duration::from_secs(3600))
            .unwrap();

        let handle = spawn_sweep_task(store.clone(), INTERVAL);
        tokio::time::sleep(INTERVAL * 5).await;

        assert_eq!(store.get(&"long_lived".to_string()), Some("value".to_string()));

        handle.abort();
    }

    #[tokio::test]
    async fn test_sweep_task_can_be_aborted() {
        let (store, _) = manual_store();

        let handle = spawn_sweep_task(store, INTERVAL);
        handle.abort();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
