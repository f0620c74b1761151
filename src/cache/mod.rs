//! Cache Module
//!
//! Provides in-memory storage with TTL expiration, lazy and active eviction,
//! and an optional insertion-order cap.

mod entry;
mod order;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use order::InsertionOrder;
pub use stats::CacheStats;
pub use store::ExpiringStore;
