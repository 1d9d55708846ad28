//! Construction-time error types.
//!
//! The cache has no fallible operations on the hot path: `Get`/`Put`/`Del`
//! always succeed and report outcomes through hit flags or the inspector
//! chain. The only place a `Result` is warranted is at construction, where
//! misuse that would otherwise silently produce a useless cache is
//! rejected instead.

use thiserror::Error;

/// Errors raised while building a [`crate::Cache`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// `capPerBkt` was zero; a bucket with no slots can never hold anything.
    #[error("per-bucket capacity must be greater than zero")]
    ZeroCapacity,

    /// A requested capacity does not fit the 16-bit slot index used by the
    /// arena-backed LRU list.
    #[error("capacity {0} exceeds the maximum representable slot count ({max})", max = u16::MAX)]
    CapacityTooLarge(usize),

    /// A requested shard count does not fit the 16-bit shard index.
    #[error("shard count {0} exceeds the maximum representable shard count ({max})", max = u16::MAX as usize + 1)]
    ShardCountTooLarge(usize),
}
