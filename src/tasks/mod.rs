//! Background Tasks Module
//!
//! Contains background tasks that run alongside memoized functions.
//!
//! # Tasks
//! - Sweep: Removes expired entries from a store at a fixed interval

mod sweep;

pub use sweep::spawn_sweep_task;
