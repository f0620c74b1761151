//! Key Module
//!
//! Derives canonical, hashable cache keys from a function identity and its
//! call arguments.

mod deriver;
mod signature;
mod value;

pub use deriver::{CacheKey, KeyDeriver};
pub use signature::{Binder, BoundArgs, Param, Signature};
pub use value::{ArgValue, CallArgs, KeyPart};
