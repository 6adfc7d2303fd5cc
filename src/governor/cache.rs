use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub total_requests: u64,
    pub last_reset: DateTime<Utc>,
}

impl CacheStats {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            hits: 0,
            misses: 0,
            total_requests: 0,
            last_reset: now,
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    data: V,
    stored_at: DateTime<Utc>,
}

#[derive(Debug)]
struct CacheState<V> {
    entries: HashMap<String, CacheEntry<V>>,
    stats: CacheStats,
}

/// Keyed store whose entries expire `ttl` after they were written.
///
/// Every operation runs under one lock, so a lookup and its lazy eviction
/// are observed atomically by concurrent callers.
#[derive(Debug)]
pub struct TtlCache<V> {
    ttl: Duration,
    state: Mutex<CacheState<V>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                stats: CacheStats::new(Utc::now()),
            }),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn set(&self, key: &str, data: V) {
        self.set_at(key, data, Utc::now());
    }

    pub fn set_at(&self, key: &str, data: V, now: DateTime<Utc>) {
        self.state
            .lock()
            .entries
            .insert(key.to_string(), CacheEntry { data, stored_at: now });
    }

    pub fn get(&self, key: &str) -> Option<V> {
        self.get_at(key, Utc::now())
    }

    /// Returns the entry if it is at most `ttl` old, evicting it otherwise.
    pub fn get_at(&self, key: &str, now: DateTime<Utc>) -> Option<V> {
        let mut state = self.state.lock();
        state.stats.total_requests += 1;

        let fresh = match state.entries.get(key) {
            None => None,
            Some(entry) if now - entry.stored_at > self.ttl => {
                debug!("Cache entry expired: {}", key);
                state.entries.remove(key);
                None
            }
            Some(entry) => Some(entry.data.clone()),
        };

        match fresh {
            Some(data) => {
                state.stats.hits += 1;
                Some(data)
            }
            None => {
                state.stats.misses += 1;
                None
            }
        }
    }

    pub fn stats(&self) -> CacheStats {
        self.state.lock().stats
    }

    pub fn reset_stats(&self) {
        self.state.lock().stats = CacheStats::new(Utc::now());
    }

    /// Drops all entries and zeroes the statistics.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.entries.clear();
        state.stats = CacheStats::new(Utc::now());
    }

    /// Removes expired entries, returning how many were dropped.
    pub fn cleanup_at(&self, now: DateTime<Utc>) -> usize {
        let mut state = self.state.lock();
        let before = state.entries.len();
        state.entries.retain(|_, entry| now - entry.stored_at <= self.ttl);
        before - state.entries.len()
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn set_then_get_hits() {
        let cache = TtlCache::new(Duration::minutes(30));
        cache.set("k", "v".to_string());
        assert_eq!(cache.get("k").as_deref(), Some("v"));

        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses, stats.total_requests), (1, 0, 1));
    }

    #[test]
    fn expired_entry_misses_and_is_evicted() {
        let cache = TtlCache::new(Duration::minutes(30));
        let t0 = Utc::now();
        cache.set_at("k", 1, t0);

        assert_eq!(cache.get_at("k", t0 + Duration::minutes(30)), Some(1));
        assert_eq!(cache.get_at("k", t0 + Duration::minutes(31)), None);
        assert_eq!(cache.len(), 0);

        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.total_requests, 2);
    }

    #[test]
    fn set_overwrites_and_refreshes_timestamp() {
        let cache = TtlCache::new(Duration::minutes(10));
        let t0 = Utc::now();
        cache.set_at("k", 1, t0);
        cache.set_at("k", 2, t0 + Duration::minutes(9));
        assert_eq!(cache.get_at("k", t0 + Duration::minutes(15)), Some(2));
    }

    #[test]
    fn unknown_key_counts_as_miss() {
        let cache: TtlCache<u32> = TtlCache::new(Duration::minutes(1));
        assert_eq!(cache.get("missing"), None);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn reset_and_clear() {
        let cache = TtlCache::new(Duration::minutes(1));
        cache.set("a", 1);
        cache.get("a");
        cache.get("b");

        let before = cache.stats().last_reset;
        cache.reset_stats();
        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses, stats.total_requests), (0, 0, 0));
        assert!(stats.last_reset >= before);
        assert_eq!(cache.len(), 1);

        cache.get("a");
        cache.clear();
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.stats().total_requests, 0);
    }

    #[test]
    fn cleanup_drops_only_stale_entries() {
        let cache = TtlCache::new(Duration::minutes(30));
        let t0 = Utc::now();
        cache.set_at("old", 1, t0);
        cache.set_at("new", 2, t0 + Duration::minutes(20));

        assert_eq!(cache.cleanup_at(t0 + Duration::minutes(40)), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get_at("new", t0 + Duration::minutes(40)), Some(2));
    }

    #[test]
    fn concurrent_gets_are_all_counted() {
        let cache = Arc::new(TtlCache::new(Duration::minutes(5)));
        cache.set("k", 7u32);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        assert_eq!(cache.get("k"), Some(7));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let stats = cache.stats();
        assert_eq!(stats.hits, 800);
        assert_eq!(stats.total_requests, 800);
    }
}
