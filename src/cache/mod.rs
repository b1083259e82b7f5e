//! Cache module providing runtime-configurable caching with multiple backends.
//!
//! This module provides a unified caching interface that supports:
//! - Memory cache (in-process, fastest, per-entry TTL and priority eviction)
//! - Disk cache (persistent, file-based, key index for pattern removal)
//! - Redis cache (distributed, network-based, native `SCAN` for patterns)
//!
//! # Configuration
//!
//! Configure caching in your TOML config file:
//!
//! ```toml
//! [cache]
//! enabled = true
//! backend = "memory"  # or "disk" or "redis"
//! default_duration_seconds = 60
//!
//! [cache.memory]
//! max_size = 1000
//! ttl_seconds = 300
//!
//! [cache.disk]
//! directory = "cache"
//! ttl_seconds = 300
//!
//! [cache.redis]
//! url = "redis://127.0.0.1:6379"
//! ttl_seconds = 300
//! pool_size = 4
//! connection_timeout = 5
//! key_prefix = "query-cache"
//! ```
//!
//! # Usage
//!
//! ```ignore
//! let cache = CacheManager::new(settings.cache, "queries").await?;
//! let people: Vec<Person> = cache
//!     .get_or_set("people:all", || repo.list(), &cache.default_options())
//!     .await?;
//! cache.remove_by_pattern("people:*").await?;
//! ```

mod disk;
mod entry;
mod error;
mod index;
mod manager;
mod memory;
mod noop;
mod pattern;
mod redis;
mod traits;

pub use disk::DiskCache;
pub use entry::{CachePriority, EntryOptions, Expiration};
pub use error::CacheError;
pub use manager::CacheManager;
pub use memory::MemoryCache;
pub use noop::NoOpCache;
pub use pattern::KeyPattern;
pub use redis::RedisCache;
pub use traits::AppCache;

// Re-export config types
pub use crate::config::settings::{
    CacheBackend, CacheConfig, DiskCacheConfig, MemoryCacheConfig, RedisCacheConfig,
};
