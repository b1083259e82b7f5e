//! Redis cache implementation using bb8 connection pool.

use async_trait::async_trait;
use bb8::{Pool, PooledConnection};
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client, RedisError};

use crate::cache::entry::StoredEntry;
use crate::cache::{AppCache, CacheError, EntryOptions, Expiration, KeyPattern};
use crate::config::settings::RedisCacheConfig;

type RedisPool = Pool<Client>;

/// Keys fetched per `SCAN` round-trip.
const SCAN_BATCH: usize = 500;

/// Redis-based cache with bb8 connection pool.
///
/// Values are stored as a JSON [`StoredEntry`] so sliding entries can carry
/// their window; expiry itself is enforced by redis.
pub struct RedisCache {
    pool: RedisPool,
    key_prefix: String,
}

impl RedisCache {
    pub async fn new(config: &RedisCacheConfig, cache_name: &str) -> Result<Self, CacheError> {
        let client =
            Client::open(config.url.as_str()).map_err(|e| CacheError::Connection(e.to_string()))?;

        let pool = Pool::builder()
            .max_size(config.pool_size)
            .connection_timeout(std::time::Duration::from_secs(config.connection_timeout))
            .build(client)
            .await
            .map_err(|e| CacheError::Connection(e.to_string()))?;

        let key_prefix = format!("{}:{}", config.key_prefix, cache_name);

        Ok(Self { pool, key_prefix })
    }

    fn prefixed_key(&self, key: &str) -> String {
        format!("{}:{}", self.key_prefix, key)
    }

    async fn get_conn(&self) -> Result<PooledConnection<'_, Client>, CacheError> {
        self.pool
            .get()
            .await
            .map_err(|e| CacheError::Connection(e.to_string()))
    }

    /// Collect every namespaced key matching `glob` with cursor-based SCAN.
    async fn scan_keys(
        &self,
        conn: &mut MultiplexedConnection,
        glob: &str,
    ) -> Result<Vec<String>, CacheError> {
        let mut cursor: u64 = 0;
        let mut keys = Vec::new();
        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(glob)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(conn)
                .await
                .map_err(|e: RedisError| CacheError::Operation(e.to_string()))?;
            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }
        // SCAN may return a key more than once.
        keys.sort_unstable();
        keys.dedup();
        Ok(keys)
    }

    async fn delete_keys(
        &self,
        conn: &mut MultiplexedConnection,
        keys: &[String],
    ) -> Result<usize, CacheError> {
        let mut removed = 0;
        for chunk in keys.chunks(SCAN_BATCH) {
            let count: usize = conn
                .del(chunk)
                .await
                .map_err(|e: RedisError| CacheError::Operation(e.to_string()))?;
            removed += count;
        }
        Ok(removed)
    }
}

#[async_trait]
impl AppCache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let mut conn: PooledConnection<'_, Client> = self.get_conn().await?;
        let prefixed = self.prefixed_key(key);

        let conn_ref: &mut MultiplexedConnection = &mut conn;
        let bytes: Option<Vec<u8>> = conn_ref
            .get(&prefixed)
            .await
            .map_err(|e: RedisError| CacheError::Operation(e.to_string()))?;

        let Some(bytes) = bytes else {
            return Ok(None);
        };
        let entry: StoredEntry = serde_json::from_slice(&bytes)?;

        if let Some(window) = entry.sliding_seconds {
            let window = i64::try_from(window).unwrap_or(i64::MAX);
            conn_ref
                .expire::<_, ()>(&prefixed, window)
                .await
                .map_err(|e| CacheError::Operation(e.to_string()))?;
        }

        Ok(Some(entry.value))
    }

    async fn set(
        &self,
        key: &str,
        value: Vec<u8>,
        options: &EntryOptions,
    ) -> Result<(), CacheError> {
        let mut conn: PooledConnection<'_, Client> = self.get_conn().await?;
        let prefixed = self.prefixed_key(key);
        let bytes = serde_json::to_vec(&StoredEntry::new(value, options))?;

        let conn_ref: &mut MultiplexedConnection = &mut conn;
        match options.expiration {
            Expiration::Absolute(ttl) | Expiration::Sliding(ttl) => conn_ref
                .set_ex::<_, _, ()>(&prefixed, bytes, ttl.as_secs().max(1))
                .await
                .map_err(|e| CacheError::Operation(e.to_string())),
            Expiration::Never => conn_ref
                .set::<_, _, ()>(&prefixed, bytes)
                .await
                .map_err(|e| CacheError::Operation(e.to_string())),
        }
    }

    async fn remove(&self, key: &str) -> Result<(), CacheError> {
        let mut conn: PooledConnection<'_, Client> = self.get_conn().await?;
        let prefixed = self.prefixed_key(key);

        let conn_ref: &mut MultiplexedConnection = &mut conn;
        conn_ref
            .del::<_, ()>(&prefixed)
            .await
            .map_err(|e| CacheError::Operation(e.to_string()))
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        let mut conn: PooledConnection<'_, Client> = self.get_conn().await?;
        let prefixed = self.prefixed_key(key);

        let conn_ref: &mut MultiplexedConnection = &mut conn;
        conn_ref
            .exists(&prefixed)
            .await
            .map_err(|e: RedisError| CacheError::Operation(e.to_string()))
    }

    async fn remove_by_pattern(&self, pattern: &KeyPattern) -> Result<usize, CacheError> {
        let mut conn: PooledConnection<'_, Client> = self.get_conn().await?;
        let glob = format!("{}:{}", self.key_prefix, pattern.to_redis_glob());

        let conn_ref: &mut MultiplexedConnection = &mut conn;
        let keys = self.scan_keys(conn_ref, &glob).await?;
        if keys.is_empty() {
            return Ok(0);
        }
        self.delete_keys(conn_ref, &keys).await
    }

    async fn clear(&self) -> Result<(), CacheError> {
        self.remove_by_pattern(&KeyPattern::all()).await.map(|_| ())
    }
}
