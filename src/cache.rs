//! The sharded cache facade: dispatches each public operation to exactly
//! one shard's lock, releases it, then fires the inspector chain outside
//! the lock.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};

use crate::config::CacheConfig;
use crate::error::CacheError;
use crate::hash::{shard_index, CacheKey};
use crate::inspector::{Action, Event, Inspector, Observer, Status};
use crate::level::{Level, NEVER_EXPIRES};
use crate::stats::{CacheStats, ShardStats};
use crate::time::{self, Clock, ClockHandle};
use crate::value::Payload;

fn validate_capacity(capacity: usize) -> Result<u16, CacheError> {
    if capacity == 0 {
        return Err(CacheError::ZeroCapacity);
    }
    u16::try_from(capacity).map_err(|_| CacheError::CapacityTooLarge(capacity))
}

/// A generic, sharded, concurrency-safe LRU / LRU-2 cache.
///
/// Keys must implement [`CacheKey`]; values are stored as a [`Payload`]
/// envelope. Every public operation locks exactly one shard; no global
/// lock is ever held. Construct via [`Cache::new`] or
/// [`crate::CacheBuilder`].
///
/// Must be constructed from within a Tokio runtime context: construction
/// starts a background clock-refresh task scoped to this instance, so
/// that a host with no use for a process-wide clock only pays for one
/// extra task per cache it builds.
pub struct Cache<K: CacheKey> {
    shard_mask: u32,
    shards: Vec<Mutex<Level<K>>>,
    expiration_nanos: Option<i64>,
    clock: Arc<Clock>,
    // Kept alive for the lifetime of the cache; dropping it stops the
    // background refresh task (see time::ClockHandle).
    _clock_handle: ClockHandle,
    inspector: RwLock<Inspector<K>>,
}

impl<K: CacheKey> Cache<K> {
    /// Builds a cache from [`CacheConfig`].
    ///
    /// A requested shard count of zero is treated as one shard; a
    /// per-bucket capacity of zero is rejected, since a bucket with no
    /// slots can never hold anything.
    pub fn new(config: CacheConfig) -> Result<Self, CacheError> {
        let requested_shards = config.shard_count.max(1);
        let shard_count = requested_shards.next_power_of_two();
        if shard_count > u16::MAX as usize + 1 {
            return Err(CacheError::ShardCountTooLarge(requested_shards));
        }

        let cap = validate_capacity(config.capacity_per_bucket)?;
        let cap2 = config.lru2_capacity.map(validate_capacity).transpose()?;

        let mut shards = Vec::with_capacity(shard_count);
        for _ in 0..shard_count {
            let mut level = Level::new(cap);
            if let Some(cap2) = cap2 {
                level.enable_lru2(cap2);
            }
            shards.push(Mutex::new(level));
        }

        let clock_handle = time::start();
        let clock = clock_handle.clock();

        info!(
            component = "cache",
            event = "constructed",
            shard_count,
            capacity_per_bucket = config.capacity_per_bucket,
            lru2_enabled = cap2.is_some(),
            "cache constructed"
        );

        Ok(Self {
            shard_mask: (shard_count - 1) as u32,
            shards,
            expiration_nanos: config.expiration.map(|d| d.as_nanos() as i64),
            clock,
            _clock_handle: clock_handle,
            inspector: RwLock::new(Inspector::default()),
        })
    }

    /// Lazily allocates the `L1` bucket on every shard, enabling LRU-2
    /// promotion. Idempotent per shard: a shard that already has an `L1`
    /// keeps its existing capacity.
    pub fn enable_lru2(&self, capacity_per_bucket: usize) -> Result<(), CacheError> {
        let cap2 = validate_capacity(capacity_per_bucket)?;
        for shard in &self.shards {
            shard.lock().enable_lru2(cap2);
        }
        debug!(component = "cache", event = "lru2_enabled", capacity_per_bucket, "LRU-2 enabled across shards");
        Ok(())
    }

    /// Registers an observer to run after every previously-registered one.
    /// The default chain is empty.
    pub fn inspect(&self, observer: Observer<K>) {
        self.inspector.write().register(observer);
    }

    fn shard_index(&self, key: &K) -> usize {
        shard_index(key.shard_hash(), self.shard_mask)
    }

    fn next_expire_at(&self) -> i64 {
        match self.expiration_nanos {
            Some(ttl) => self.clock.now().saturating_add(ttl),
            None => NEVER_EXPIRES,
        }
    }

    fn fire(&self, action: Action, key: &K, payload: &Payload, status: Status) {
        self.inspector.read().fire(Event { action, key, payload, status });
    }

    /// Stores `value` under `key`, always targeting `L0`. Fires a
    /// `Put`/`Added` or `Put`/`Updated` event, and — if capacity forced
    /// eviction of a still-live victim — a trailing `Put`/`Evicted` event
    /// for that victim, both outside the shard lock.
    pub fn put(&self, key: K, value: Payload) {
        let idx = self.shard_index(&key);
        let expire_at = self.next_expire_at();

        let inspector_active = !self.inspector.read().is_empty();
        let event_key = inspector_active.then(|| key.clone());
        let event_value = inspector_active.then(|| value.clone());

        let (outcome, evicted) = self.shards[idx].lock().put(key, value, expire_at);

        if inspector_active {
            let status = match outcome {
                crate::bucket::PutOutcome::Added => Status::Added,
                crate::bucket::PutOutcome::Updated => Status::Updated,
            };
            self.fire(Action::Put, event_key.as_ref().unwrap(), event_value.as_ref().unwrap(), status);
        }
        if let Some(victim) = evicted {
            self.fire(Action::Put, &victim.key, &victim.payload, Status::Evicted);
        }
    }

    /// Convenience wrapper storing a raw byte buffer.
    pub fn put_bytes(&self, key: K, bytes: Vec<u8>) {
        self.put(key, Payload::from_bytes(bytes));
    }

    /// Convenience wrapper storing an int64 as 8 little-endian bytes.
    pub fn put_int64(&self, key: K, n: i64) {
        self.put(key, Payload::from_int64(n));
    }

    /// Looks up `key`, promoting it through LRU-2 on a second touch if
    /// enabled. Returns the full value envelope on a live hit.
    pub fn get(&self, key: &K) -> Option<Payload> {
        let idx = self.shard_index(key);
        let expire_at = self.next_expire_at();
        let now = self.clock.now();
        let expiration_enabled = self.expiration_nanos.is_some();

        let (hit, evicted) = self.shards[idx].lock().get(key, now, expire_at, expiration_enabled);

        if !self.inspector.read().is_empty() {
            let status = if hit.is_some() { Status::Added } else { Status::Updated };
            let payload = hit.as_ref().map_or_else(Payload::default, |h| h.payload.clone());
            self.fire(Action::Get, key, &payload, status);
        }
        if let Some(victim) = evicted {
            self.fire(Action::Put, &victim.key, &victim.payload, Status::Evicted);
        }

        hit.map(|h| h.payload)
    }

    /// Convenience wrapper reading the byte payload only.
    pub fn get_bytes(&self, key: &K) -> Option<Vec<u8>> {
        self.get(key)?.bytes
    }

    /// Convenience wrapper decoding an int64 from the byte payload.
    /// Requires at least 8 stored bytes; reports not-found otherwise.
    pub fn get_int64(&self, key: &K) -> Option<i64> {
        self.get(key)?.as_int64()
    }

    /// Convenience wrapper downcasting the opaque handle to `T`.
    pub fn get_opaque<T: std::any::Any + Send + Sync>(&self, key: &K) -> Option<Arc<T>> {
        self.get(key)?.downcast_opaque::<T>()
    }

    /// Tombstones `key` across both levels if present. Idempotent: a
    /// second `del` on the same key reports a miss.
    pub fn del(&self, key: &K) {
        let idx = self.shard_index(key);
        let hit = self.shards[idx].lock().del(key);

        if !self.inspector.read().is_empty() {
            let status = if hit.is_some() { Status::Added } else { Status::Updated };
            let payload = hit.map_or_else(Payload::default, |h| h.payload);
            self.fire(Action::Del, key, &payload, status);
        }
    }

    /// Traverses every shard MRU-to-LRU, releasing each shard's lock
    /// before moving to the next. Not a single-shard critical section
    /// like the other operations, but never holds more than one lock at
    /// a time.
    pub fn walk<F: FnMut(&K, &Payload, i64) -> bool>(&self, mut f: F) {
        for shard in &self.shards {
            let mut cont = true;
            shard.lock().walk(|k, v, e| {
                cont = f(k, v, e);
                cont
            });
            if !cont {
                return;
            }
        }
    }

    /// Number of configured shards. Always a power of two, since the
    /// shard index is computed by masking a hash rather than taking a
    /// modulus.
    pub fn shard_count(&self) -> usize {
        self.shard_mask as usize + 1
    }

    /// Read-only occupancy snapshot across every shard.
    pub fn stats(&self) -> CacheStats {
        let shards: Vec<ShardStats> = self
            .shards
            .iter()
            .enumerate()
            .map(|(idx, shard)| ShardStats { shard: idx, len: shard.lock().len() })
            .collect();
        let total_len = shards.iter().map(|s| s.len).sum();
        CacheStats { shards, total_len }
    }
}
