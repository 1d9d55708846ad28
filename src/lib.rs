//! An in-process, concurrency-safe, generic key/value cache with bounded
//! capacity and optional time-based expiration.
//!
//! Supports two eviction disciplines: plain LRU and a two-level LRU
//! (LRU-2), in which an entry is promoted to a second, "hot" level only
//! after a second access. The cache is sharded by key hash into
//! independently-locked buckets to reduce contention on the hot path.
//!
//! ```no_run
//! # #[tokio::main]
//! # async fn main() {
//! use shardcache::{Cache, CacheConfig};
//!
//! let cache: Cache<String> = Cache::new(CacheConfig::new(16, 1024)).unwrap();
//! cache.put_int64("hits".to_string(), 1);
//! assert_eq!(cache.get_int64(&"hits".to_string()), Some(1));
//! # }
//! ```

mod bucket;
mod cache;
mod config;
mod error;
mod hash;
mod inspector;
mod level;
mod stats;
mod time;
mod value;

pub use cache::Cache;
pub use config::CacheConfig;
pub use error::CacheError;
pub use hash::CacheKey;
pub use inspector::{Action, Event, Observer, Status};
pub use stats::{CacheStats, ShardStats};
pub use value::{Opaque, Payload};

mod builder;
pub use builder::CacheBuilder;
