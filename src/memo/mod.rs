//! Memo Module
//!
//! Function-level memoization on top of the expiring store.

mod inflight;
mod ttl;
mod wrapper;

pub use inflight::InFlight;
pub use ttl::Ttl;
pub use wrapper::{memoize, CacheInfo, Memoized};
