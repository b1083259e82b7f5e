//! NoOp cache implementation.
//!
//! Used when caching is disabled. Every read is a miss and every write is
//! discarded, so the pipeline behaves as if nothing were ever cached.

use async_trait::async_trait;

use crate::cache::{AppCache, CacheError, EntryOptions, KeyPattern};

/// A no-operation cache that doesn't store anything.
///
/// Used when `cache.enabled = false` in configuration.
pub struct NoOpCache;

impl NoOpCache {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NoOpCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AppCache for NoOpCache {
    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(None)
    }

    async fn set(
        &self,
        _key: &str,
        _value: Vec<u8>,
        _options: &EntryOptions,
    ) -> Result<(), CacheError> {
        Ok(())
    }

    async fn remove(&self, _key: &str) -> Result<(), CacheError> {
        Ok(())
    }

    async fn exists(&self, _key: &str) -> Result<bool, CacheError> {
        Ok(false)
    }

    async fn remove_by_pattern(&self, _pattern: &KeyPattern) -> Result<usize, CacheError> {
        Ok(0)
    }

    async fn clear(&self) -> Result<(), CacheError> {
        Ok(())
    }
}
