//! Read-only observability snapshot.
//!
//! Exposes per-shard and aggregate occupancy counters the core already
//! maintains, without changing eviction or promotion semantics.

/// Snapshot of one shard's occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShardStats {
    pub shard: usize,
    /// Combined `L0` + `L1` live entry count.
    pub len: usize,
}

/// Aggregate snapshot across every shard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub shards: Vec<ShardStats>,
    pub total_len: usize,
}
