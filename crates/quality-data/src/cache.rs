use std::hash::Hash;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

/// Default entry lifetime (5 minutes)
pub const DEFAULT_TTL_SECS: i64 = 300;
pub const DEFAULT_MAX_ENTRIES: usize = 1_000;

struct CacheEntry<V> {
    value: V,
    cached_at: DateTime<Utc>,
}

/// Concurrent TTL map owned by the caller and shared by reference or `Arc`.
///
/// When full, inserting a new key drops expired entries first and then the
/// oldest one.
pub struct TtlCache<K, V> {
    entries: DashMap<K, CacheEntry<V>>,
    ttl: Duration,
    max_entries: usize,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn is_fresh(&self, entry: &CacheEntry<V>, now: DateTime<Utc>) -> bool {
        now - entry.cached_at < self.ttl
    }

    /// Cached value if present and younger than the TTL
    pub fn get(&self, key: &K) -> Option<V> {
        let now = Utc::now();
        let expired = match self.entries.get(key) {
            Some(entry) if self.is_fresh(&entry, now) => return Some(entry.value.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove(key);
        }
        None
    }

    pub fn set(&self, key: K, value: V) {
        if self.entries.len() >= self.max_entries && !self.entries.contains_key(&key) {
            self.purge_expired();
            if self.entries.len() >= self.max_entries {
                let oldest = self
                    .entries
                    .iter()
                    .min_by_key(|e| e.value().cached_at)
                    .map(|e| e.key().clone());
                if let Some(oldest) = oldest {
                    self.entries.remove(&oldest);
                }
            }
        }

        self.entries.insert(
            key,
            CacheEntry {
                value,
                cached_at: Utc::now(),
            },
        );
    }

    /// Returns whether the key was cached
    pub fn invalidate(&self, key: &K) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Drop expired entries, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| now - entry.cached_at < self.ttl);
        before - self.entries.len()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V: Clone> TtlCache<String, V> {
    /// Drop every key starting with `prefix`
    pub fn invalidate_prefix(&self, prefix: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| !key.starts_with(prefix));
        before - self.entries.len()
    }
}

impl<K, V> Default for TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_TTL_SECS), DEFAULT_MAX_ENTRIES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_invalidate() {
        let cache: TtlCache<String, u32> = TtlCache::default();
        cache.set("a".to_string(), 1);
        assert_eq!(cache.get(&"a".to_string()), Some(1));
        assert!(cache.invalidate(&"a".to_string()));
        assert_eq!(cache.get(&"a".to_string()), None);
        assert!(!cache.invalidate(&"a".to_string()));
    }

    #[test]
    fn test_expired_entries_are_misses() {
        let cache: TtlCache<String, u32> = TtlCache::new(Duration::zero(), 10);
        cache.set("a".to_string(), 1);
        assert_eq!(cache.get(&"a".to_string()), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_prefix_invalidation() {
        let cache: TtlCache<String, u32> = TtlCache::default();
        cache.set("aggregates:CDC:2024".to_string(), 1);
        cache.set("aggregates:CDC:2023".to_string(), 2);
        cache.set("aggregates:CBP:2024".to_string(), 3);

        assert_eq!(cache.invalidate_prefix("aggregates:CDC:"), 2);
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_capacity_is_bounded() {
        let cache: TtlCache<u32, u32> = TtlCache::new(Duration::seconds(60), 2);
        cache.set(1, 1);
        cache.set(2, 2);
        cache.set(3, 3);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&3), Some(3));

        // Overwriting an existing key never evicts
        cache.set(3, 30);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&3), Some(30));
    }
}
