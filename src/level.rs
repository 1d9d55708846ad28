//! The two-level coordinator: a per-shard pair of buckets (`L0`, optional
//! `L1`) implementing LRU-2 promotion.
//!
//! One-shot keys (scan floods) never reach `L1` and are evicted from `L0`
//! without polluting the hot set; only keys touched at least twice earn a
//! residency in `L1`.

use crate::bucket::{Bucket, PutOutcome};
use crate::hash::CacheKey;
use crate::value::Payload;

/// Sentinel deadline meaning "never expires". Stored instead of `now()`
/// for permanent entries, so a permanent entry can never read back as
/// already-expired even if expiration were somehow toggled on later.
pub const NEVER_EXPIRES: i64 = i64::MAX;

/// Outcome of a public-facing `get`/`del`, independent of which level it
/// was served from.
pub struct Hit {
    pub payload: Payload,
}

/// A victim reported through the inspector as a `Put`/`Evicted` callback —
/// this fires both for plain-bucket capacity eviction and for LRU-2
/// promotions that evict from a full `L1`.
pub struct EvictedVictim<K> {
    pub key: K,
    pub payload: Payload,
}

fn is_live(expire_at: i64, now: i64, expiration_enabled: bool) -> bool {
    expire_at > 0 && (!expiration_enabled || now < expire_at)
}

/// Per-shard L0/L1 bucket pair.
pub struct Level<K: CacheKey> {
    l0: Bucket<K>,
    l1: Option<Bucket<K>>,
}

impl<K: CacheKey> Level<K> {
    pub fn new(cap_l0: u16) -> Self {
        Self { l0: Bucket::new(cap_l0), l1: None }
    }

    /// Lazily allocates `L1`. Idempotent — a second call with a different
    /// capacity does not resize an already-enabled `L1`.
    pub fn enable_lru2(&mut self, cap_l1: u16) {
        if self.l1.is_none() {
            self.l1 = Some(Bucket::new(cap_l1));
        }
    }

    pub fn lru2_enabled(&self) -> bool {
        self.l1.is_some()
    }

    pub fn len(&self) -> usize {
        self.l0.len() + self.l1.as_ref().map_or(0, Bucket::len)
    }

    /// Always writes to `L0`; refreshes in place if the key already lives
    /// there. Writes never directly touch `L1` — promotion only happens
    /// through `get`.
    pub fn put(&mut self, key: K, value: Payload, expire_at: i64) -> (PutOutcome, Option<EvictedVictim<K>>) {
        let (outcome, evicted) = self.l0.put(key, value, expire_at);
        (outcome, evicted.map(|(key, payload)| EvictedVictim { key, payload }))
    }

    /// Looks up `key`, promoting an `L0` hit into `L1` on its second touch
    /// and refreshing an `L1` hit's MRU position and deadline in place.
    ///
    /// Returns the hit (if live) and, when LRU-2 promotion evicted a live
    /// `L1` victim, that victim for the inspector chain.
    pub fn get(
        &mut self,
        key: &K,
        now: i64,
        new_expire_at: i64,
        expiration_enabled: bool,
    ) -> (Option<Hit>, Option<EvictedVictim<K>>) {
        let Some(l1) = self.l1.as_mut() else {
            return (Self::get_l0_and_refresh(&mut self.l0, key, now, new_expire_at, expiration_enabled), None);
        };

        if let Some((payload, old_expire_at)) = self.l0.del(key) {
            // Promotion happens regardless of liveness — an expired entry
            // still migrates to L1 on its second touch; it just won't be
            // reported as found this call.
            let (_, evicted) = l1.put(key.clone(), payload.clone(), old_expire_at);
            let hit = is_live(old_expire_at, now, expiration_enabled).then_some(Hit { payload });
            return (hit, evicted.map(|(k, p)| EvictedVictim { key: k, payload: p }));
        }

        match l1.get(key) {
            Some((payload, old_expire_at)) => {
                if is_live(old_expire_at, now, expiration_enabled) {
                    l1.set_expire_at(key, new_expire_at);
                    (Some(Hit { payload }), None)
                } else {
                    (None, None)
                }
            }
            None => (None, None),
        }
    }

    /// The no-LRU-2 half of `get`: look up in `L0` and, on a live hit,
    /// refresh its MRU position and its deadline. `Bucket::get`
    /// unconditionally refreshes MRU position on lookup, before liveness
    /// is even checked here.
    fn get_l0_and_refresh(
        l0: &mut Bucket<K>,
        key: &K,
        now: i64,
        new_expire_at: i64,
        expiration_enabled: bool,
    ) -> Option<Hit> {
        let (payload, old_expire_at) = l0.get(key)?;
        if is_live(old_expire_at, now, expiration_enabled) {
            l0.set_expire_at(key, new_expire_at);
            Some(Hit { payload })
        } else {
            None
        }
    }

    /// Deletes from `L0` (and `L1` if enabled), reporting whichever side
    /// held the more-recently-touched copy.
    pub fn del(&mut self, key: &K) -> Option<Hit> {
        let l0_hit = self.l0.del(key);
        let l1_hit = self.l1.as_mut().and_then(|l1| l1.del(key));

        match (l0_hit, l1_hit) {
            (Some((p0, t0)), Some((p1, t1))) => Some(Hit { payload: if t1 >= t0 { p1 } else { p0 } }),
            (Some((p, _)), None) => Some(Hit { payload: p }),
            (None, Some((p, _))) => Some(Hit { payload: p }),
            (None, None) => None,
        }
    }

    /// Visits every live entry across both levels, MRU to LRU within each
    /// level, L0 before L1.
    pub fn walk<F: FnMut(&K, &Payload, i64) -> bool>(&self, mut f: F) {
        let mut cont = true;
        self.l0.walk(|k, v, e| {
            cont = f(k, v, e);
            cont
        });
        if !cont {
            return;
        }
        if let Some(l1) = &self.l1 {
            l1.walk(|k, v, e| f(k, v, e));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(n: i64) -> Payload {
        Payload::from_int64(n)
    }

    #[test]
    fn put_always_targets_l0() {
        let mut level: Level<String> = Level::new(4);
        level.enable_lru2(4);
        level.put("a".to_string(), payload(1), NEVER_EXPIRES);
        // Nothing promoted yet: a single put must not appear in L1.
        let (hit, _) = level.l1.as_mut().unwrap().get(&"a".to_string()).map_or((None, None), |_| (Some(()), None));
        assert!(hit.is_none());
    }

    #[test]
    fn lru2_promotion_scenario() {
        let mut level: Level<String> = Level::new(2);
        level.enable_lru2(2);

        level.put("a".to_string(), payload(1), NEVER_EXPIRES);
        level.put("b".to_string(), payload(2), NEVER_EXPIRES);
        // Access "a" once: promotes it into L1.
        let (hit, _) = level.get(&"a".to_string(), 0, NEVER_EXPIRES, false);
        assert_eq!(hit.unwrap().payload.as_int64(), Some(1));

        level.put("c".to_string(), payload(3), NEVER_EXPIRES);
        level.put("d".to_string(), payload(4), NEVER_EXPIRES);

        // "a" survives in L1; "b" was evicted from L0 and never promoted.
        let (hit_a, _) = level.get(&"a".to_string(), 0, NEVER_EXPIRES, false);
        assert_eq!(hit_a.unwrap().payload.as_int64(), Some(1));
        let (hit_b, _) = level.get(&"b".to_string(), 0, NEVER_EXPIRES, false);
        assert!(hit_b.is_none());
    }

    #[test]
    fn one_shot_key_never_reaches_l1() {
        let mut level: Level<String> = Level::new(2);
        level.enable_lru2(2);
        level.put("a".to_string(), payload(1), NEVER_EXPIRES);
        level.put("b".to_string(), payload(2), NEVER_EXPIRES);
        level.put("c".to_string(), payload(3), NEVER_EXPIRES);
        // "a" was evicted from L0 without ever being accessed, so it
        // cannot have been promoted.
        let (hit, _) = level.get(&"a".to_string(), 0, NEVER_EXPIRES, false);
        assert!(hit.is_none());
    }

    #[test]
    fn lazy_expiration_scenario() {
        let mut level: Level<String> = Level::new(4);
        let expire_at = 1_000i64;
        level.put("k".to_string(), payload(1), expire_at);
        let (hit, _) = level.get(&"k".to_string(), 1_001, expire_at, true);
        assert!(hit.is_none());
    }

    #[test]
    fn get_without_lru2_refreshes_mru_and_deadline() {
        let mut level: Level<String> = Level::new(4);
        level.put("a".to_string(), payload(1), 100);
        level.put("b".to_string(), payload(2), 100);
        let (hit, _) = level.get(&"a".to_string(), 0, 500, false);
        assert_eq!(hit.unwrap().payload.as_int64(), Some(1));
        // Deadline must have moved to the new value.
        let (_, refreshed) = level.get(&"a".to_string(), 0, 500, false);
        assert!(refreshed.is_none());
        assert_eq!(level.l0.get(&"a".to_string()).unwrap().1, 500);
    }

    #[test]
    fn del_reports_most_recently_touched_copy() {
        let mut level: Level<String> = Level::new(4);
        level.enable_lru2(4);
        level.put("a".to_string(), payload(1), 100);
        level.get(&"a".to_string(), 0, 200, false); // promotes into L1 with deadline 100... then updated
        level.put("a".to_string(), payload(2), 300); // refresh in L0
        let hit = level.del(&"a".to_string()).unwrap();
        // L1 held deadline carried over from the promotion (100), L0 holds
        // the freshly-put deadline (300); L0's copy is more recent.
        assert_eq!(hit.payload.as_int64(), Some(2));
    }

    #[test]
    fn walk_visits_l0_before_l1() {
        let mut level: Level<String> = Level::new(4);
        level.enable_lru2(4);
        level.put("a".to_string(), payload(1), NEVER_EXPIRES);
        level.get(&"a".to_string(), 0, NEVER_EXPIRES, false); // promote a into L1
        level.put("b".to_string(), payload(2), NEVER_EXPIRES);

        let mut seen = Vec::new();
        level.walk(|k, _v, _e| {
            seen.push(k.clone());
            true
        });
        assert_eq!(seen, vec!["b".to_string(), "a".to_string()]);
    }
}
