//! AppCache trait definition.

use async_trait::async_trait;

use crate::cache::{CacheError, EntryOptions, KeyPattern};

/// Trait for cache backends.
///
/// All cache backends must implement this trait to provide a unified
/// interface. Values are opaque bytes; typing and failure absorption live in
/// [`CacheManager`](crate::cache::CacheManager).
#[async_trait]
pub trait AppCache: Send + Sync {
    /// Get a value from the cache. Expired entries read as `None`.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Set a value, overwriting any previous entry for the key.
    async fn set(
        &self,
        key: &str,
        value: Vec<u8>,
        options: &EntryOptions,
    ) -> Result<(), CacheError>;

    /// Remove a value from the cache. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), CacheError>;

    /// Whether a live (non-expired) entry exists for the key.
    async fn exists(&self, key: &str) -> Result<bool, CacheError>;

    /// Remove every key matching the pattern, returning how many were removed.
    async fn remove_by_pattern(&self, pattern: &KeyPattern) -> Result<usize, CacheError>;

    /// Clear all values from the cache.
    async fn clear(&self) -> Result<(), CacheError>;

    /// Batch read. Same semantics as calling [`AppCache::get`] per key.
    async fn get_many(&self, keys: &[String]) -> Result<Vec<Option<Vec<u8>>>, CacheError> {
        let mut values = Vec::with_capacity(keys.len());
        for key in keys {
            values.push(self.get(key).await?);
        }
        Ok(values)
    }

    /// Batch write. Not atomic: a failure may leave earlier entries written.
    async fn set_many(
        &self,
        entries: Vec<(String, Vec<u8>)>,
        options: &EntryOptions,
    ) -> Result<(), CacheError> {
        for (key, value) in entries {
            self.set(&key, value, options).await?;
        }
        Ok(())
    }
}
