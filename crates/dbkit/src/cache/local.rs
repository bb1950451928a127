//! Local in-process LRU-by-TTL [`CacheProvider`] — the reference
//! implementation spec.md §4.5 ships (the remote KV contract is the trait
//! itself; no concrete remote store is shipped, per spec.md's non-goals).

use super::{CacheProvider, CachedValue};
use crate::error::DbResult;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct Entry {
    value: CachedValue,
    expires_at: Instant,
}

/// Bounded by entry count, not byte size. Eviction is approximate LRU: the
/// least-recently-*touched* key (get or set) is dropped first once
/// `capacity` is exceeded.
pub struct LocalCache {
    capacity: usize,
    entries: Mutex<HashMap<String, Entry>>,
    order: Mutex<Vec<String>>,
}

impl LocalCache {
    pub fn new(capacity: usize) -> Self {
        Self { capacity, entries: Mutex::new(HashMap::new()), order: Mutex::new(Vec::new()) }
    }

    fn touch(&self, key: &str) {
        let mut order = self.order.lock().unwrap_or_else(|e| e.into_inner());
        order.retain(|k| k != key);
        order.push(key.to_string());
    }

    fn evict_if_over_capacity(&self) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let mut order = self.order.lock().unwrap_or_else(|e| e.into_inner());
        while entries.len() > self.capacity && !order.is_empty() {
            let oldest = order.remove(0);
            entries.remove(&oldest);
        }
    }
}

#[async_trait]
impl CacheProvider for LocalCache {
    async fn get(&self, key: &str) -> DbResult<Option<CachedValue>> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let Some(entry) = entries.get(key) else {
            return Ok(None);
        };
        if entry.expires_at <= Instant::now() {
            entries.remove(key);
            return Ok(None);
        }
        let value = entry.value.clone();
        drop(entries);
        self.touch(key);
        Ok(Some(value))
    }

    async fn set(&self, key: &str, value: CachedValue, ttl: Duration) -> DbResult<()> {
        {
            let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
            entries.insert(key.to_string(), Entry { value, expires_at: Instant::now() + ttl });
        }
        self.touch(key);
        self.evict_if_over_capacity();
        Ok(())
    }

    async fn delete(&self, key: &str) -> DbResult<()> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).remove(key);
        self.order.lock().unwrap_or_else(|e| e.into_inner()).retain(|k| k != key);
        Ok(())
    }

    async fn clear(&self) -> DbResult<()> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).clear();
        self.order.lock().unwrap_or_else(|e| e.into_inner()).clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stores_and_retrieves_within_ttl() {
        let cache = LocalCache::new(10);
        cache.set("k", CachedValue::encode(&42i64).unwrap(), Duration::from_secs(60)).await.unwrap();
        let got = cache.get("k").await.unwrap().unwrap();
        assert_eq!(got.decode::<i64>().unwrap(), 42);
    }

    #[tokio::test]
    async fn expired_entry_is_a_miss() {
        let cache = LocalCache::new(10);
        cache.set("k", CachedValue::encode(&1i64).unwrap(), Duration::from_millis(1)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(cache.get("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn evicts_least_recently_touched_past_capacity() {
        let cache = LocalCache::new(2);
        cache.set("a", CachedValue::encode(&1i64).unwrap(), Duration::from_secs(60)).await.unwrap();
        cache.set("b", CachedValue::encode(&2i64).unwrap(), Duration::from_secs(60)).await.unwrap();
        cache.get("a").await.unwrap();
        cache.set("c", CachedValue::encode(&3i64).unwrap(), Duration::from_secs(60)).await.unwrap();
        assert!(cache.get("b").await.unwrap().is_none());
        assert!(cache.get("a").await.unwrap().is_some());
        assert!(cache.get("c").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn delete_and_clear_remove_entries() {
        let cache = LocalCache::new(10);
        cache.set("a", CachedValue::encode(&1i64).unwrap(), Duration::from_secs(60)).await.unwrap();
        cache.delete("a").await.unwrap();
        assert!(cache.get("a").await.unwrap().is_none());

        cache.set("b", CachedValue::encode(&1i64).unwrap(), Duration::from_secs(60)).await.unwrap();
        cache.clear().await.unwrap();
        assert!(cache.get("b").await.unwrap().is_none());
    }
}
