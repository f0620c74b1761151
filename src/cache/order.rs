//! Insertion Order Module
//!
//! Tracks insertion order for capacity eviction of the oldest-inserted entry.

use std::collections::VecDeque;

// == Insertion Order ==
/// FIFO record of insertions.
///
/// Records are `(seq, key)` pairs where:
/// - Front = Oldest insertion
/// - Back = Newest insertion
///
/// Overwrites and removals do not touch the queue. A record is live only if
/// the store still holds an entry for its key with the same `seq`; the store
/// skips dead records on eviction and compacts the queue when they pile up.
#[derive(Debug)]
pub struct InsertionOrder<K> {
    records: VecDeque<(u64, K)>,
}

impl<K> InsertionOrder<K> {
    // == Constructor ==
    pub fn new() -> Self {
        Self {
            records: VecDeque::new(),
        }
    }

    // == Push ==
    /// Records a fresh insertion.
    pub fn push(&mut self, seq: u64, key: K) {
        self.records.push_back((seq, key));
    }

    // == Pop Oldest ==
    /// Returns and removes the oldest record, live or dead.
    pub fn pop_oldest(&mut self) -> Option<(u64, K)> {
        self.records.pop_front()
    }

    // == Compact ==
    /// Drops records for which `is_live` returns false.
    pub fn compact(&mut self, mut is_live: impl FnMut(u64, &K) -> bool) {
        self.records.retain(|(seq, key)| is_live(*seq, key));
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    // == Length ==
    /// Returns the number of records, including dead ones.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<K> Default for InsertionOrder<K> {
    fn default() -> Self {
        Self::new()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_new() {
        let order: InsertionOrder<String> = InsertionOrder::new();
        assert!(order.is_empty());
        assert_eq!(order.len(), 0);
    }

    #[test]
    fn test_pop_oldest_is_fifo() {
        let mut order = InsertionOrder::new();

        order.push(0, "key1");
        order.push(1, "key2");
        order.push(2, "key3");

        assert_eq!(order.pop_oldest(), Some((0, "key1")));
        assert_eq!(order.pop_oldest(), Some((1, "key2")));
        assert_eq!(order.len(), 1);
    }

    #[test]
    fn test_pop_empty() {
        let mut order: InsertionOrder<&str> = InsertionOrder::new();
        assert_eq!(order.pop_oldest(), None);
    }

    #[test]
    fn test_compact_drops_dead_records() {
        let mut order = InsertionOrder::new();

        order.push(0, "a");
        order.push(1, "b");
        // "a" re-inserted; its first record is now dead
        order.push(2, "a");

        order.compact(|seq, key| !(*key == "a" && seq == 0));

        assert_eq!(order.len(), 2);
        assert_eq!(order.pop_oldest(), Some((1, "b")));
        assert_eq!(order.pop_oldest(), Some((2, "a")));
    }

    #[test]
    fn test_clear() {
        let mut order = InsertionOrder::new();
        order.push(0, "a");
        order.clear();
        assert!(order.is_empty());
    }
}
