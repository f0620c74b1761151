//! TTL Cache - function-level memoization with time-bounded validity
//!
//! Wraps a function so that repeated calls with the same arguments within a
//! configurable time-to-live return the stored result instead of running the
//! function again.
//!
//! # Example
//! ```
//! use std::convert::Infallible;
//! use std::time::Duration;
//! use ttl_cache::{memoize, ArgValue, CallArgs, MemoConfig};
//!
//! let square = memoize("square", MemoConfig::new(Duration::from_secs(2)), |args: &CallArgs| {
//!     match args.positional() {
//!         [ArgValue::Int(x)] => Ok::<_, Infallible>(x * x),
//!         _ => Ok(0),
//!     }
//! })
//! .unwrap();
//!
//! assert_eq!(square.call(&CallArgs::new().arg(3)), Ok(9));
//! assert_eq!(square.call(&CallArgs::new().arg(3)), Ok(9));
//! assert_eq!(square.cache_info().hits, 1);
//! ```

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod key;
pub mod memo;
pub mod tasks;

pub use cache::{CacheStats, ExpiringStore};
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::{MemoConfig, SweepConfig};
pub use error::{CacheError, Result};
pub use key::{ArgValue, CacheKey, CallArgs, KeyDeriver, Signature};
pub use memo::{memoize, CacheInfo, Memoized, Ttl};
pub use tasks::spawn_sweep_task;
