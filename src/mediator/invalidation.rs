//! Evicts cached query results after a command succeeds.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::cache::CacheManager;
use crate::error::AppResult;
use crate::mediator::request::Response;
use crate::mediator::{Invalidation, Next, PipelineBehavior, PolicyRegistry, RequestEnvelope};

/// Pipeline behavior applying a request's [`Invalidation`] declarations.
///
/// Invalidation only runs once the handler has succeeded; a failed command
/// leaves the cache untouched. Each target is removed independently, so one
/// failing pattern does not stop the rest, and removal failures never change
/// the command's result.
pub struct InvalidationBehavior {
    cache: CacheManager,
    registry: Arc<PolicyRegistry>,
}

impl InvalidationBehavior {
    pub fn new(cache: CacheManager, registry: Arc<PolicyRegistry>) -> Self {
        Self { cache, registry }
    }

    /// Glob patterns covering every entry a declaration names.
    fn patterns(&self, invalidation: &Invalidation) -> Vec<String> {
        match invalidation {
            Invalidation::Queries(names) => names
                .iter()
                .map(|name| format!("{}:*", self.registry.namespace_for(name)))
                .collect(),
            Invalidation::Pattern(pattern) => vec![pattern.clone()],
            Invalidation::All => vec!["*".to_string()],
        }
    }
}

#[async_trait]
impl PipelineBehavior for InvalidationBehavior {
    async fn handle(&self, request: &RequestEnvelope<'_>, next: Next<'_>) -> AppResult<Response> {
        let response = next.run(request).await?;

        for invalidation in self.registry.invalidations(request.name()) {
            for pattern in self.patterns(invalidation) {
                match self.cache.remove_by_pattern(&pattern).await {
                    Ok(removed) => {
                        debug!(request = request.name(), pattern = %pattern, removed, "cache invalidated");
                    }
                    Err(e) => {
                        warn!(request = request.name(), pattern = %pattern, error = %e, "cache invalidation failed");
                    }
                }
            }
        }

        Ok(response)
    }
}
