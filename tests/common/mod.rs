#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use query_cache::cache::{AppCache, CacheConfig, CacheError, EntryOptions, KeyPattern};
use query_cache::people::{self, PeopleRepository};
use query_cache::{CacheManager, Mediator};

/// A backend whose every operation fails, counting the attempts.
#[derive(Default)]
pub struct FailingCache {
    pub attempts: AtomicUsize,
}

impl FailingCache {
    fn fail<T>(&self) -> Result<T, CacheError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(CacheError::Connection("backend unavailable".to_string()))
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AppCache for FailingCache {
    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        self.fail()
    }

    async fn set(
        &self,
        _key: &str,
        _value: Vec<u8>,
        _options: &EntryOptions,
    ) -> Result<(), CacheError> {
        self.fail()
    }

    async fn remove(&self, _key: &str) -> Result<(), CacheError> {
        self.fail()
    }

    async fn exists(&self, _key: &str) -> Result<bool, CacheError> {
        self.fail()
    }

    async fn remove_by_pattern(&self, _pattern: &KeyPattern) -> Result<usize, CacheError> {
        self.fail()
    }

    async fn clear(&self) -> Result<(), CacheError> {
        self.fail()
    }
}

pub struct Directory {
    pub mediator: Mediator,
    pub cache: CacheManager,
    pub repo: PeopleRepository,
}

/// The sample directory behind a mediator using `cache`.
pub async fn directory_with(cache: CacheManager) -> Directory {
    let repo = PeopleRepository::with_sample_data()
        .await
        .expect("sample data");
    let mediator = people::register(Mediator::builder().cache(cache.clone()), repo.clone()).build();
    Directory {
        mediator,
        cache,
        repo,
    }
}

/// The sample directory behind an in-memory cache.
pub async fn directory() -> Directory {
    directory_with(CacheManager::in_memory()).await
}

pub fn failing_cache() -> (Arc<FailingCache>, CacheManager) {
    let backend = Arc::new(FailingCache::default());
    let cache = CacheManager::with_backend(backend.clone(), CacheConfig::default());
    (backend, cache)
}
