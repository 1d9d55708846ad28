//! Cache construction parameters.
//!
//! A small config struct plus [`crate::CacheBuilder`], scoped to exactly
//! what a cache constructor needs: no file parsing, no `serde`, no
//! environment layering.

use std::time::Duration;

/// Construction parameters for a [`crate::Cache`].
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Requested shard count. Rounded up to the next power of two to form
    /// the shard index mask. Zero is treated as one shard.
    pub shard_count: usize,
    /// Per-shard `L0` capacity.
    pub capacity_per_bucket: usize,
    /// Optional time-to-live applied on every `put`/refreshing `get`.
    /// `None` means permanent.
    pub expiration: Option<Duration>,
    /// Per-shard `L1` capacity. `Some` enables LRU-2 at construction time,
    /// equivalent to calling [`crate::Cache::enable_lru2`] once per shard
    /// up front.
    pub lru2_capacity: Option<usize>,
}

impl Default for CacheConfig {
    /// A single-shard, 1024-entry, permanent cache with LRU-2 disabled —
    /// a reasonable default for tests and small embedded uses.
    fn default() -> Self {
        Self {
            shard_count: 1,
            capacity_per_bucket: 1024,
            expiration: None,
            lru2_capacity: None,
        }
    }
}

impl CacheConfig {
    pub fn new(shard_count: usize, capacity_per_bucket: usize) -> Self {
        Self {
            shard_count,
            capacity_per_bucket,
            ..Self::default()
        }
    }

    pub fn with_expiration(mut self, expiration: Duration) -> Self {
        self.expiration = Some(expiration);
        self
    }

    pub fn with_lru2(mut self, capacity: usize) -> Self {
        self.lru2_capacity = Some(capacity);
        self
    }
}
