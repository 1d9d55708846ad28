//! Ergonomic builder wrapping construction, LRU-2 activation, and
//! observer registration behind a fluent chain of configuration calls.

use std::time::Duration;

use crate::cache::Cache;
use crate::config::CacheConfig;
use crate::error::CacheError;
use crate::hash::CacheKey;
use crate::inspector::Observer;

/// Builds a [`Cache`] from a fluent chain of configuration calls.
pub struct CacheBuilder<K: CacheKey> {
    config: CacheConfig,
    observers: Vec<Observer<K>>,
}

impl<K: CacheKey> CacheBuilder<K> {
    pub fn new(shard_count: usize, capacity_per_bucket: usize) -> Self {
        Self {
            config: CacheConfig::new(shard_count, capacity_per_bucket),
            observers: Vec::new(),
        }
    }

    /// Sets a time-to-live applied on every `put` and refreshed on every
    /// live `get`. Left unset, the cache is permanent.
    pub fn expiration(mut self, ttl: Duration) -> Self {
        self.config.expiration = Some(ttl);
        self
    }

    /// Enables LRU-2 at construction time with the given per-shard `L1`
    /// capacity.
    pub fn lru2(mut self, capacity_per_bucket: usize) -> Self {
        self.config.lru2_capacity = Some(capacity_per_bucket);
        self
    }

    /// Registers an observer, run after every previously-registered one
    /// once the cache is built.
    pub fn inspect(mut self, observer: Observer<K>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Constructs the cache. Must be called from within a Tokio runtime
    /// context (see [`Cache::new`]).
    pub fn build(self) -> Result<Cache<K>, CacheError> {
        let cache = Cache::new(self.config)?;
        for observer in self.observers {
            cache.inspect(observer);
        }
        Ok(cache)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn builder_wires_config_and_observers() {
        let hits = Arc::new(AtomicUsize::new(0));
        let hits2 = hits.clone();

        let cache: crate::Cache<String> = CacheBuilder::new(4, 8)
            .expiration(Duration::from_secs(60))
            .lru2(8)
            .inspect(Box::new(move |_e| {
                hits2.fetch_add(1, Ordering::SeqCst);
            }))
            .build()
            .unwrap();

        cache.put_int64("a".to_string(), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(cache.shard_count(), 4);
    }
}
