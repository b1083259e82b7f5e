//! Disk cache implementation with per-entry TTL support.

use std::time::Duration;

use async_trait::async_trait;
use cached::IOCached;
use cached::stores::DiskCache as CachedDiskCache;
use tokio::sync::Mutex;

use crate::cache::entry::StoredEntry;
use crate::cache::index::KeyIndex;
use crate::cache::{AppCache, CacheError, EntryOptions, KeyPattern};
use crate::config::settings::DiskCacheConfig;

/// Disk-based cache with per-entry TTL.
///
/// The underlying store cannot enumerate its keys, so every written key is
/// tracked in a [`KeyIndex`] for pattern removal.
pub struct DiskCache {
    store: Mutex<CachedDiskCache<String, Vec<u8>>>,
    index: KeyIndex,
}

impl DiskCache {
    pub fn new(config: &DiskCacheConfig, cache_name: &str) -> Result<Self, CacheError> {
        // Set a very long lifespan - we manage TTL ourselves via StoredEntry
        let store = CachedDiskCache::new(cache_name)
            .set_disk_directory(&config.directory)
            .set_lifespan(Duration::from_secs(86400 * 365)) // 1 year max
            .build()
            .map_err(|e| CacheError::Connection(e.to_string()))?;

        // Entries left by a previous process are not in the key index and
        // could never be invalidated by pattern.
        let db = store.connection();
        db.clear()
            .map_err(|e| CacheError::Operation(e.to_string()))?;

        Ok(Self {
            store: Mutex::new(store),
            index: KeyIndex::new(),
        })
    }

    async fn read_entry(&self, key: &str) -> Result<Option<StoredEntry>, CacheError> {
        let key_string = key.to_string();
        let store = self.store.lock().await;

        let Some(bytes) = store
            .cache_get(&key_string)
            .map_err(|e| CacheError::Operation(e.to_string()))?
        else {
            return Ok(None);
        };

        let mut entry: StoredEntry = serde_json::from_slice(&bytes)?;
        if entry.is_expired() {
            if let Err(e) = store.cache_remove(&key_string) {
                tracing::warn!(cache_key = %key, error = %e, "failed to drop expired disk entry");
            }
            self.index.remove(key)?;
            return Ok(None);
        }

        if entry.touch() {
            let bytes = serde_json::to_vec(&entry)?;
            store
                .cache_set(key_string, bytes)
                .map_err(|e| CacheError::Operation(e.to_string()))?;
            self.index.insert(key, entry.expires_at)?;
        }
        Ok(Some(entry))
    }
}

#[async_trait]
impl AppCache for DiskCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(self.read_entry(key).await?.map(|entry| entry.value))
    }

    async fn set(
        &self,
        key: &str,
        value: Vec<u8>,
        options: &EntryOptions,
    ) -> Result<(), CacheError> {
        let entry = StoredEntry::new(value, options);
        let expires_at = entry.expires_at;
        let bytes = serde_json::to_vec(&entry)?;

        let store = self.store.lock().await;
        store
            .cache_set(key.to_string(), bytes)
            .map_err(|e| CacheError::Operation(e.to_string()))?;
        self.index.insert(key, expires_at)?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), CacheError> {
        let key_string = key.to_string();
        let store = self.store.lock().await;
        store
            .cache_remove(&key_string)
            .map_err(|e| CacheError::Operation(e.to_string()))?;
        self.index.remove(key)?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.read_entry(key).await?.is_some())
    }

    async fn remove_by_pattern(&self, pattern: &KeyPattern) -> Result<usize, CacheError> {
        let store = self.store.lock().await;

        // Entries that expired without being read again.
        for key in self.index.take_expired()? {
            if let Err(e) = store.cache_remove(&key) {
                tracing::warn!(cache_key = %key, error = %e, "failed to drop expired disk entry");
            }
        }

        let keys = self.index.matching(pattern)?;
        for key in &keys {
            store
                .cache_remove(key)
                .map_err(|e| CacheError::Operation(e.to_string()))?;
            self.index.remove(key)?;
        }
        Ok(keys.len())
    }

    async fn clear(&self) -> Result<(), CacheError> {
        let store = self.store.lock().await;
        let db = store.connection();

        // Use sled's clear (more efficient than iterating)
        db.clear()
            .map_err(|e| CacheError::Operation(e.to_string()))?;
        db.flush()
            .map_err(|e| CacheError::Operation(e.to_string()))?;
        self.index.clear()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_config(dir: &TempDir) -> DiskCacheConfig {
        DiskCacheConfig {
            directory: dir.path().to_str().unwrap().to_string(),
            ttl_seconds: 3600,
        }
    }

    #[tokio::test]
    async fn test_get_set() {
        let dir = TempDir::new().unwrap();
        let cache = DiskCache::new(&test_config(&dir), "test_get_set").unwrap();
        cache
            .set("key", b"value".to_vec(), &EntryOptions::absolute_secs(60))
            .await
            .unwrap();
        assert_eq!(cache.get("key").await.unwrap(), Some(b"value".to_vec()));
        assert!(cache.exists("key").await.unwrap());
    }

    #[tokio::test]
    async fn test_remove() {
        let dir = TempDir::new().unwrap();
        let cache = DiskCache::new(&test_config(&dir), "test_remove").unwrap();
        cache
            .set("key", b"value".to_vec(), &EntryOptions::never())
            .await
            .unwrap();
        cache.remove("key").await.unwrap();
        assert_eq!(cache.get("key").await.unwrap(), None);
        cache.remove("key").await.unwrap();
    }

    #[tokio::test]
    async fn test_ttl_expiration() {
        let dir = TempDir::new().unwrap();
        let cache = DiskCache::new(&test_config(&dir), "test_ttl").unwrap();
        cache
            .set("key", b"value".to_vec(), &EntryOptions::absolute_secs(1))
            .await
            .unwrap();
        assert_eq!(cache.get("key").await.unwrap(), Some(b"value".to_vec()));
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(cache.get("key").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_remove_by_pattern_uses_index() {
        let dir = TempDir::new().unwrap();
        let cache = DiskCache::new(&test_config(&dir), "test_pattern").unwrap();
        let options = EntryOptions::never();
        for key in ["roles:", "roles:page=2", "ListPeopleQuery:"] {
            cache.set(key, b"v".to_vec(), &options).await.unwrap();
        }

        let removed = cache
            .remove_by_pattern(&KeyPattern::new("roles:*").unwrap())
            .await
            .unwrap();
        assert_eq!(removed, 2);
        assert_eq!(cache.get("roles:").await.unwrap(), None);
        assert!(cache.exists("ListPeopleQuery:").await.unwrap());
    }

    #[tokio::test]
    async fn test_pattern_removal_sweeps_unread_expired_entries() {
        let dir = TempDir::new().unwrap();
        let cache = DiskCache::new(&test_config(&dir), "test_sweep").unwrap();
        cache
            .set("stale:1", b"v".to_vec(), &EntryOptions::absolute_secs(1))
            .await
            .unwrap();
        cache
            .set("live:1", b"v".to_vec(), &EntryOptions::never())
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;

        // The expired entry is not counted as removed, but is dropped.
        let removed = cache
            .remove_by_pattern(&KeyPattern::new("live:*").unwrap())
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert!(cache.index.matching(&KeyPattern::all()).unwrap().is_empty());
        let store = cache.store.lock().await;
        assert_eq!(store.cache_get(&"stale:1".to_string()).unwrap(), None);
    }

    #[tokio::test]
    async fn test_clear() {
        let dir = TempDir::new().unwrap();
        let cache = DiskCache::new(&test_config(&dir), "test_clear").unwrap();
        let options = EntryOptions::never();
        cache.set("k1", b"v1".to_vec(), &options).await.unwrap();
        cache.set("k2", b"v2".to_vec(), &options).await.unwrap();
        cache.clear().await.unwrap();
        assert_eq!(cache.get("k1").await.unwrap(), None);
        assert_eq!(cache.get("k2").await.unwrap(), None);
        assert_eq!(
            cache.remove_by_pattern(&KeyPattern::all()).await.unwrap(),
            0
        );
    }
}
