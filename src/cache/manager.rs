//! Cache manager: the store boundary used by the rest of the crate.

use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::cache::disk::DiskCache;
use crate::cache::memory::MemoryCache;
use crate::cache::noop::NoOpCache;
use crate::cache::redis::RedisCache;
use crate::cache::{AppCache, CacheError, EntryOptions, KeyPattern};
use crate::config::settings::{CacheBackend, CacheConfig};

/// Cache manager that provides access to the configured cache backend.
///
/// Reads and writes never fail from the caller's point of view: backend
/// faults and (de)serialization problems are logged and turned into a miss
/// or a dropped write. Only [`CacheManager::remove_by_pattern`] and
/// [`CacheManager::clear`] report errors, so invalidation can log each
/// target on its own.
///
/// Cloning is cheap; all clones share one backend.
#[derive(Clone)]
pub struct CacheManager {
    backend: Arc<dyn AppCache>,
    config: CacheConfig,
}

impl CacheManager {
    /// Create a new cache manager with the given configuration.
    ///
    /// If caching is disabled, a NoOpCache is used.
    pub async fn new(config: CacheConfig, cache_name: &str) -> Result<Self, CacheError> {
        let backend: Arc<dyn AppCache> = if !config.enabled {
            Arc::new(NoOpCache::new())
        } else {
            match config.backend {
                CacheBackend::Memory => Arc::new(MemoryCache::new(&config.memory)),
                CacheBackend::Disk => Arc::new(DiskCache::new(&config.disk, cache_name)?),
                CacheBackend::Redis => Arc::new(RedisCache::new(&config.redis, cache_name).await?),
            }
        };

        tracing::info!(
            enabled = config.enabled,
            backend = ?config.backend,
            cache_name,
            "cache initialized"
        );

        Ok(Self { backend, config })
    }

    /// Wrap an already constructed backend.
    pub fn with_backend(backend: Arc<dyn AppCache>, config: CacheConfig) -> Self {
        Self { backend, config }
    }

    /// An enabled in-memory cache with default settings.
    pub fn in_memory() -> Self {
        let config = CacheConfig::default();
        let backend = Arc::new(MemoryCache::new(&config.memory));
        Self { backend, config }
    }

    /// Get a reference to the cache backend.
    pub fn backend(&self) -> &Arc<dyn AppCache> {
        &self.backend
    }

    /// Get the cache configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Check if caching is enabled.
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Absolute expiry using the active backend's configured TTL.
    pub fn default_options(&self) -> EntryOptions {
        EntryOptions::absolute_secs(self.config.backend_ttl_seconds())
    }

    // ========================================================================
    // Byte-level operations
    // ========================================================================

    /// Get raw bytes. Backend failures read as a miss.
    pub async fn get_raw(&self, key: &str) -> Option<Vec<u8>> {
        match self.backend.get(key).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(cache_key = %key, error = %e, "cache read failed, treating as miss");
                None
            }
        }
    }

    /// Store raw bytes. Backend failures are logged and dropped.
    pub async fn set_raw(&self, key: &str, value: Vec<u8>, options: &EntryOptions) {
        if let Err(e) = self.backend.set(key, value, options).await {
            tracing::warn!(cache_key = %key, error = %e, "cache write failed, dropping entry");
        }
    }

    // ========================================================================
    // Typed operations
    // ========================================================================

    /// Get a value, deserialized from JSON.
    ///
    /// Missing, expired, unreadable and undecodable entries all read as `None`.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let bytes = self.get_raw(key).await?;
        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(cache_key = %key, error = %e, "cached value could not be decoded, treating as miss");
                None
            }
        }
    }

    /// Serialize and store a value, overwriting any previous entry.
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T, options: &EntryOptions) {
        match serde_json::to_vec(value) {
            Ok(bytes) => self.set_raw(key, bytes, options).await,
            Err(e) => {
                tracing::warn!(cache_key = %key, error = %e, "value could not be serialized, skipping cache write");
            }
        }
    }

    /// Remove a value. Missing keys and backend failures are not errors.
    pub async fn remove(&self, key: &str) {
        if let Err(e) = self.backend.remove(key).await {
            tracing::warn!(cache_key = %key, error = %e, "cache remove failed");
        }
    }

    /// Whether a live entry exists. Backend failures read as `false`.
    pub async fn exists(&self, key: &str) -> bool {
        match self.backend.exists(key).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(cache_key = %key, error = %e, "cache exists check failed");
                false
            }
        }
    }

    /// Return the cached value or compute, store and return it.
    ///
    /// Not single-flight: callers that miss concurrently on the same key each
    /// run their factory and the last write wins. Factory errors propagate
    /// and are never cached.
    pub async fn get_or_set<T, E, F, Fut>(
        &self,
        key: &str,
        factory: F,
        options: &EntryOptions,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.get::<T>(key).await {
            tracing::debug!(cache_key = %key, outcome = "hit", "get_or_set");
            return Ok(value);
        }

        tracing::debug!(cache_key = %key, outcome = "miss", "get_or_set");
        let value = factory().await?;
        self.set(key, &value, options).await;
        Ok(value)
    }

    /// Batch read; same semantics as repeated [`CacheManager::get`].
    pub async fn get_many<T: DeserializeOwned>(&self, keys: &[String]) -> Vec<Option<T>> {
        let raw = match self.backend.get_many(keys).await {
            Ok(values) => values,
            Err(e) => {
                tracing::warn!(keys = keys.len(), error = %e, "cache batch read failed, treating as misses");
                return keys.iter().map(|_| None).collect();
            }
        };

        raw.into_iter()
            .zip(keys)
            .map(|(bytes, key)| {
                let bytes = bytes?;
                serde_json::from_slice(&bytes)
                    .map_err(|e| {
                        tracing::warn!(cache_key = %key, error = %e, "cached value could not be decoded, treating as miss");
                    })
                    .ok()
            })
            .collect()
    }

    /// Batch write; not atomic. Entries that fail to serialize are skipped.
    pub async fn set_many<T: Serialize>(&self, entries: &[(String, T)], options: &EntryOptions) {
        let encoded: Vec<(String, Vec<u8>)> = entries
            .iter()
            .filter_map(|(key, value)| match serde_json::to_vec(value) {
                Ok(bytes) => Some((key.clone(), bytes)),
                Err(e) => {
                    tracing::warn!(cache_key = %key, error = %e, "value could not be serialized, skipping cache write");
                    None
                }
            })
            .collect();

        if encoded.is_empty() {
            return;
        }
        if let Err(e) = self.backend.set_many(encoded, options).await {
            tracing::warn!(error = %e, "cache batch write failed");
        }
    }

    // ========================================================================
    // Invalidation
    // ========================================================================

    /// Remove every key matching a glob pattern (`*`, `?`).
    pub async fn remove_by_pattern(&self, pattern: &str) -> Result<usize, CacheError> {
        let pattern = KeyPattern::new(pattern)?;
        let removed = self.backend.remove_by_pattern(&pattern).await?;
        tracing::debug!(pattern = %pattern, removed, "cache entries removed by pattern");
        Ok(removed)
    }

    /// Clear all values from the cache.
    pub async fn clear(&self) -> Result<(), CacheError> {
        self.backend.clear().await
    }
}
