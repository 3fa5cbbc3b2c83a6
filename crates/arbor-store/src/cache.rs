// SPDX-License-Identifier: Apache-2.0
//! Bounded TTL cache with write-amortized eviction.
//!
//! Both result caches (outgoing-edges-by-type and shortest-path) share this
//! structure. A miss is the `None` arm of the return value — there is no
//! error signal to leak to callers. Expired entries are reaped lazily on
//! read; the size cap is enforced by an eviction pass armed every 100th
//! write, which drops the entries closest to expiry.
use std::hash::Hash;

use arbor_model::now_ms;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

/// How often (in writes) the eviction pass is considered.
const EVICTION_PERIOD: u64 = 100;

struct Slot<V> {
    value: V,
    expires_at: i64,
}

struct Inner<K, V> {
    entries: FxHashMap<K, Slot<V>>,
    writes: u64,
}

/// A keyed cache of `(value, expires_at)` slots.
pub(crate) struct TtlCache<K, V> {
    inner: Mutex<Inner<K, V>>,
    max_size: usize,
    default_ttl_ms: u64,
    /// Percentage of entries (oldest first) dropped by an eviction pass.
    evict_percent: usize,
}

impl<K: Eq + Hash + Clone, V: Clone> TtlCache<K, V> {
    pub(crate) fn new(max_size: usize, default_ttl_ms: u64, evict_percent: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: FxHashMap::default(),
                writes: 0,
            }),
            max_size,
            default_ttl_ms,
            evict_percent,
        }
    }

    /// Returns the live value under `key`. Expired slots are removed and
    /// reported as a miss.
    pub(crate) fn get(&self, key: &K) -> Option<V> {
        let mut inner = self.inner.lock();
        match inner.entries.get(key) {
            Some(slot) if now_ms() < slot.expires_at => Some(slot.value.clone()),
            Some(_) => {
                inner.entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Inserts with the cache's default TTL.
    pub(crate) fn put(&self, key: K, value: V) {
        self.put_with_ttl(key, value, self.default_ttl_ms);
    }

    /// Inserts with an explicit TTL in milliseconds.
    pub(crate) fn put_with_ttl(&self, key: K, value: V, ttl_ms: u64) {
        let expires_at = now_ms().saturating_add(i64::try_from(ttl_ms).unwrap_or(i64::MAX));
        let mut inner = self.inner.lock();
        inner.entries.insert(key, Slot { value, expires_at });
        inner.writes += 1;
        if inner.writes % EVICTION_PERIOD == 0 && inner.entries.len() > self.max_size {
            self.evict(&mut inner);
        }
    }

    /// Drops the entry under `key`, if any.
    pub(crate) fn invalidate(&self, key: &K) {
        self.inner.lock().entries.remove(key);
    }

    /// Drops every entry.
    pub(crate) fn clear(&self) {
        self.inner.lock().entries.clear();
    }

    /// Current entry count (expired slots included until reaped).
    pub(crate) fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Sorts entries by `expires_at` ascending and removes the oldest
    /// `evict_percent` of them.
    fn evict(&self, inner: &mut Inner<K, V>) {
        let drop_count = inner.entries.len() * self.evict_percent / 100;
        if drop_count == 0 {
            return;
        }
        let mut by_expiry: Vec<(K, i64)> = inner
            .entries
            .iter()
            .map(|(k, slot)| (k.clone(), slot.expires_at))
            .collect();
        by_expiry.sort_by_key(|(_, expires_at)| *expires_at);
        for (key, _) in by_expiry.into_iter().take(drop_count) {
            inner.entries.remove(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn hit_then_expiry() {
        let cache: TtlCache<&str, u32> = TtlCache::new(16, 20, 20);
        cache.put("k", 7);
        assert_eq!(cache.get(&"k"), Some(7));
        thread::sleep(Duration::from_millis(30));
        assert_eq!(cache.get(&"k"), None);
        // The expired slot was reaped on read.
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn invalidate_removes_a_single_key() {
        let cache: TtlCache<&str, u32> = TtlCache::new(16, 60_000, 20);
        cache.put("a", 1);
        cache.put("b", 2);
        cache.invalidate(&"a");
        assert_eq!(cache.get(&"a"), None);
        assert_eq!(cache.get(&"b"), Some(2));
    }

    #[test]
    fn eviction_pass_drops_the_oldest_slice() {
        let cache: TtlCache<u32, u32> = TtlCache::new(50, 60_000, 20);
        // Earlier keys get earlier expiries via explicit TTLs.
        for i in 0..200u32 {
            cache.put_with_ttl(i, i, 10_000 + u64::from(i) * 100);
        }
        // 200 writes means the eviction pass ran at least once above the cap.
        assert!(cache.len() < 200);
        // The newest entries survive.
        assert_eq!(cache.get(&199), Some(199));
    }

    #[test]
    fn per_entry_ttl_beats_the_default() {
        let cache: TtlCache<&str, u32> = TtlCache::new(16, 10, 20);
        cache.put_with_ttl("long", 1, 60_000);
        thread::sleep(Duration::from_millis(20));
        assert_eq!(cache.get(&"long"), Some(1));
    }
}
