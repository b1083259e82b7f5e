//! Memory cache implementation with per-entry expiration and a size cap.

use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::Instant;

use crate::cache::{AppCache, CacheError, CachePriority, EntryOptions, Expiration, KeyPattern};
use crate::config::settings::MemoryCacheConfig;

#[derive(Debug, Clone)]
struct MemoryEntry {
    value: Vec<u8>,
    expires_at: Option<Instant>,
    sliding: Option<Duration>,
    priority: CachePriority,
    last_access: Instant,
}

impl MemoryEntry {
    fn new(value: Vec<u8>, options: &EntryOptions) -> Self {
        let now = Instant::now();
        let (expires_at, sliding) = match options.expiration {
            Expiration::Absolute(ttl) => (Some(now + ttl), None),
            Expiration::Sliding(ttl) => (Some(now + ttl), Some(ttl)),
            Expiration::Never => (None, None),
        };
        Self {
            value,
            expires_at,
            sliding,
            priority: options.priority,
            last_access: now,
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|exp| now >= exp)
    }

    fn touch(&mut self, now: Instant) {
        self.last_access = now;
        if let Some(ttl) = self.sliding {
            self.expires_at = Some(now + ttl);
        }
    }
}

/// In-memory cache with size limit and per-entry TTL.
///
/// Time is read from `tokio::time::Instant`, so tests can drive expiry with a
/// paused clock.
pub struct MemoryCache {
    store: DashMap<String, MemoryEntry>,
    max_size: usize,
}

impl MemoryCache {
    pub fn new(config: &MemoryCacheConfig) -> Self {
        Self {
            store: DashMap::new(),
            max_size: config.max_size,
        }
    }

    /// Number of entries currently held, expired ones included.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    fn purge_expired(&self, now: Instant) {
        self.store.retain(|_, entry| !entry.is_expired(now));
    }

    /// Make room for one more entry: drop expired entries, then the lowest
    /// priority entry that was read least recently.
    fn make_room(&self, now: Instant) {
        if self.store.len() < self.max_size {
            return;
        }
        self.purge_expired(now);

        while self.store.len() >= self.max_size {
            let victim = self
                .store
                .iter()
                .filter(|e| e.priority != CachePriority::NeverRemove)
                .min_by_key(|e| (e.priority, e.last_access))
                .map(|e| e.key().clone());

            match victim {
                Some(key) => {
                    tracing::trace!(cache_key = %key, "evicting memory cache entry");
                    self.store.remove(&key);
                }
                // Everything left is pinned.
                None => break,
            }
        }
    }
}

#[async_trait]
impl AppCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let now = Instant::now();
        let Some(mut entry) = self.store.get_mut(key) else {
            return Ok(None);
        };

        if entry.is_expired(now) {
            drop(entry);
            self.store.remove_if(key, |_, e| e.is_expired(now));
            return Ok(None);
        }

        entry.touch(now);
        Ok(Some(entry.value.clone()))
    }

    async fn set(
        &self,
        key: &str,
        value: Vec<u8>,
        options: &EntryOptions,
    ) -> Result<(), CacheError> {
        let now = Instant::now();
        if !self.store.contains_key(key) {
            self.make_room(now);
        }
        self.store
            .insert(key.to_string(), MemoryEntry::new(value, options));
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), CacheError> {
        self.store.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        let now = Instant::now();
        Ok(self
            .store
            .get(key)
            .is_some_and(|entry| !entry.is_expired(now)))
    }

    async fn remove_by_pattern(&self, pattern: &KeyPattern) -> Result<usize, CacheError> {
        if pattern.matches_all() {
            let removed = self.store.len();
            self.store.clear();
            return Ok(removed);
        }

        let before = self.store.len();
        self.store.retain(|key, _| !pattern.matches(key));
        Ok(before.saturating_sub(self.store.len()))
    }

    async fn clear(&self) -> Result<(), CacheError> {
        self.store.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache_with_size(max_size: usize) -> MemoryCache {
        MemoryCache::new(&MemoryCacheConfig {
            max_size,
            ttl_seconds: 300,
        })
    }

    #[tokio::test]
    async fn test_get_set() {
        let cache = cache_with_size(10);
        cache
            .set("key", b"value".to_vec(), &EntryOptions::absolute_secs(60))
            .await
            .unwrap();
        assert_eq!(cache.get("key").await.unwrap(), Some(b"value".to_vec()));
        assert!(cache.exists("key").await.unwrap());
        assert_eq!(cache.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let cache = cache_with_size(10);
        let options = EntryOptions::absolute_secs(60);
        cache.set("key", b"v1".to_vec(), &options).await.unwrap();
        cache.set("key", b"v2".to_vec(), &options).await.unwrap();
        assert_eq!(cache.get("key").await.unwrap(), Some(b"v2".to_vec()));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_absolute_expiration() {
        let cache = cache_with_size(10);
        cache
            .set("key", b"value".to_vec(), &EntryOptions::absolute_secs(10))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(9)).await;
        assert!(cache.get("key").await.unwrap().is_some());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cache.get("key").await.unwrap(), None);
        assert!(!cache.exists("key").await.unwrap());
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sliding_expiration_resets_on_read() {
        let cache = cache_with_size(10);
        cache
            .set(
                "key",
                b"value".to_vec(),
                &EntryOptions::sliding(Duration::from_secs(10)),
            )
            .await
            .unwrap();

        for _ in 0..3 {
            tokio::time::advance(Duration::from_secs(8)).await;
            assert!(cache.get("key").await.unwrap().is_some());
        }

        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(cache.get("key").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_eviction_prefers_low_priority_then_oldest() {
        let cache = cache_with_size(3);
        let normal = EntryOptions::never();
        cache
            .set(
                "low",
                b"1".to_vec(),
                &normal.with_priority(CachePriority::Low),
            )
            .await
            .unwrap();
        tokio::time::advance(Duration::from_millis(1)).await;
        cache.set("old", b"2".to_vec(), &normal).await.unwrap();
        tokio::time::advance(Duration::from_millis(1)).await;
        cache.set("new", b"3".to_vec(), &normal).await.unwrap();

        tokio::time::advance(Duration::from_millis(1)).await;
        cache.set("fourth", b"4".to_vec(), &normal).await.unwrap();
        assert!(!cache.exists("low").await.unwrap());

        tokio::time::advance(Duration::from_millis(1)).await;
        cache.set("fifth", b"5".to_vec(), &normal).await.unwrap();
        assert!(!cache.exists("old").await.unwrap());
        assert!(cache.exists("new").await.unwrap());
        assert_eq!(cache.len(), 3);
    }

    #[tokio::test]
    async fn test_never_remove_entries_are_pinned() {
        let cache = cache_with_size(1);
        let pinned = EntryOptions::never().with_priority(CachePriority::NeverRemove);
        cache.set("pinned", b"1".to_vec(), &pinned).await.unwrap();
        cache
            .set("other", b"2".to_vec(), &EntryOptions::never())
            .await
            .unwrap();
        assert!(cache.exists("pinned").await.unwrap());
    }

    #[tokio::test]
    async fn test_remove_by_pattern() {
        let cache = cache_with_size(10);
        let options = EntryOptions::never();
        for key in ["ListPeopleQuery:", "GetPersonQuery:id=1", "GetPersonQuery:id=2"] {
            cache.set(key, b"v".to_vec(), &options).await.unwrap();
        }

        let pattern = KeyPattern::new("GetPersonQuery:*").unwrap();
        assert_eq!(cache.remove_by_pattern(&pattern).await.unwrap(), 2);
        assert!(cache.exists("ListPeopleQuery:").await.unwrap());

        assert_eq!(cache.remove_by_pattern(&KeyPattern::all()).await.unwrap(), 1);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_batch_operations() {
        let cache = cache_with_size(10);
        cache
            .set_many(
                vec![
                    ("a".to_string(), b"1".to_vec()),
                    ("b".to_string(), b"2".to_vec()),
                ],
                &EntryOptions::never(),
            )
            .await
            .unwrap();

        let values = cache
            .get_many(&["a".to_string(), "missing".to_string(), "b".to_string()])
            .await
            .unwrap();
        assert_eq!(values, vec![Some(b"1".to_vec()), None, Some(b"2".to_vec())]);
    }
}
