//! Serves cacheable queries from the cache, populating it on a miss.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::cache::CacheManager;
use crate::error::AppResult;
use crate::mediator::request::Response;
use crate::mediator::{CacheKeyGenerator, Next, PipelineBehavior, PolicyRegistry, RequestEnvelope};

/// Pipeline behavior for requests carrying a [`CachePolicy`](crate::mediator::CachePolicy).
///
/// Requests without a policy pass straight through. Cache faults never fail
/// the request: an unreadable entry is a miss and a failed write is dropped.
/// Concurrent misses for one key each run the handler; the last write wins.
pub struct CachingBehavior {
    cache: CacheManager,
    registry: Arc<PolicyRegistry>,
    default_duration: Duration,
}

impl CachingBehavior {
    pub fn new(cache: CacheManager, registry: Arc<PolicyRegistry>) -> Self {
        let default_duration = Duration::from_secs(cache.config().default_duration_seconds);
        Self {
            cache,
            registry,
            default_duration,
        }
    }
}

#[async_trait]
impl PipelineBehavior for CachingBehavior {
    async fn handle(&self, request: &RequestEnvelope<'_>, next: Next<'_>) -> AppResult<Response> {
        let Some(policy) = self.registry.policy(request.name()) else {
            return next.run(request).await;
        };

        let key = match CacheKeyGenerator::generate(request, policy) {
            Ok(key) => key,
            Err(e) => {
                warn!(request = request.name(), error = %e, "cache key unavailable, bypassing cache");
                return next.run(request).await;
            }
        };

        if let Some(bytes) = self.cache.get_raw(&key).await {
            match request.decode_response(&bytes) {
                Ok(response) => {
                    debug!(request = request.name(), key = %key, "cache hit");
                    return Ok(response);
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "cached response unreadable, treating as miss");
                }
            }
        }
        debug!(request = request.name(), key = %key, "cache miss");

        let response = next.run(request).await?;

        let bytes = match response.to_json() {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(key = %key, error = %e, "response not serializable, not cached");
                return Ok(response);
            }
        };
        // An absent result is never cached.
        if bytes == b"null" {
            debug!(key = %key, "empty response, not cached");
            return Ok(response);
        }

        let options = policy.entry_options(self.default_duration);
        let cancellation = request.context().cancellation();
        tokio::select! {
            biased;
            _ = cancellation.cancelled() => {
                debug!(key = %key, "request cancelled, cache write abandoned");
            }
            _ = self.cache.set_raw(&key, bytes, &options) => {}
        }

        Ok(response)
    }
}
