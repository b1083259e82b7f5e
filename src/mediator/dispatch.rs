//! Request dispatch: routes each request through the behavior chain to its
//! registered handler.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::cache::CacheManager;
use crate::config::settings::PipelineConfig;
use crate::error::{AppError, AppResult};
use crate::mediator::pipeline::Endpoint;
use crate::mediator::request::{Response, decode_as};
use crate::mediator::{
    CachePolicy, CachingBehavior, Invalidation, InvalidationBehavior, LoggingBehavior, Next,
    PipelineBehavior, PolicyRegistry, Request, RequestContext, RequestEnvelope, RequestHandler,
};

type HandlerMap = HashMap<TypeId, Box<dyn Any + Send + Sync>>;

/// Dispatches requests to their handlers through the configured pipeline.
///
/// Behaviors run outermost first: logging, any custom behaviors,
/// invalidation, then caching directly around the handler.
pub struct Mediator {
    handlers: HandlerMap,
    behaviors: Vec<Arc<dyn PipelineBehavior>>,
    registry: Arc<PolicyRegistry>,
}

impl Mediator {
    pub fn builder() -> MediatorBuilder {
        MediatorBuilder::new()
    }

    pub fn registry(&self) -> &PolicyRegistry {
        &self.registry
    }

    /// Dispatch `request` and return its handler's response, possibly served
    /// from the cache.
    ///
    /// A context already cancelled at dispatch yields [`AppError::Cancelled`]
    /// without invoking the pipeline.
    pub async fn send<R: Request>(
        &self,
        request: R,
        context: &RequestContext,
    ) -> AppResult<R::Response> {
        let handler = self
            .handlers
            .get(&TypeId::of::<R>())
            .and_then(|handler| handler.downcast_ref::<Arc<dyn RequestHandler<R>>>())
            .ok_or(AppError::HandlerNotRegistered { request: R::NAME })?;

        if context.is_cancelled() {
            return Err(AppError::Cancelled { request: R::NAME });
        }

        let endpoint = HandlerEndpoint {
            handler: handler.as_ref(),
            request: &request,
        };
        let envelope = RequestEnvelope::new(R::NAME, &request, context, decode_as::<R::Response>);
        let response = Next::new(&self.behaviors, &endpoint)
            .run(&envelope)
            .await?;

        response.downcast::<R::Response>().ok_or_else(|| {
            anyhow::anyhow!("response for '{}' has an unexpected type", R::NAME).into()
        })
    }
}

struct HandlerEndpoint<'a, R: Request> {
    handler: &'a dyn RequestHandler<R>,
    request: &'a R,
}

#[async_trait]
impl<'a, R: Request> Endpoint for HandlerEndpoint<'a, R> {
    async fn call(&self, envelope: &RequestEnvelope<'_>) -> AppResult<Response> {
        let response = self.handler.handle(self.request, envelope.context()).await?;
        Ok(Response::new(response))
    }
}

/// Builder for [`Mediator`].
pub struct MediatorBuilder {
    handlers: HandlerMap,
    registry: PolicyRegistry,
    behaviors: Vec<Arc<dyn PipelineBehavior>>,
    cache: Option<CacheManager>,
    slow_request_threshold: Duration,
}

impl Default for MediatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MediatorBuilder {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            registry: PolicyRegistry::new(),
            behaviors: Vec::new(),
            cache: None,
            slow_request_threshold: Duration::from_millis(
                PipelineConfig::default().slow_request_threshold_ms,
            ),
        }
    }

    /// Enable the caching and invalidation behaviors over `cache`.
    pub fn cache(mut self, cache: CacheManager) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn pipeline(mut self, config: &PipelineConfig) -> Self {
        self.slow_request_threshold = Duration::from_millis(config.slow_request_threshold_ms);
        self
    }

    /// Register the handler for `R`, picking up `R`'s declarations.
    ///
    /// # Panics
    ///
    /// Panics if another request type already uses `R::NAME`, since both
    /// would share cache keys and declarations.
    pub fn register<R, H>(mut self, handler: H) -> Self
    where
        R: Request,
        H: RequestHandler<R> + 'static,
    {
        if let Err(e) = self.registry.declare::<R>() {
            panic!("cannot register {}: {e}", std::any::type_name::<R>());
        }
        let handler: Arc<dyn RequestHandler<R>> = Arc::new(handler);
        self.handlers.insert(TypeId::of::<R>(), Box::new(handler));
        self
    }

    /// Attach or replace `R`'s cacheable policy.
    ///
    /// # Panics
    ///
    /// Panics if another request type already uses `R::NAME`.
    pub fn cache_policy<R: Request>(mut self, policy: CachePolicy) -> Self {
        self.claim::<R>();
        self.registry.set_policy(R::NAME, policy);
        self
    }

    /// Add an invalidation run after `R` succeeds.
    ///
    /// # Panics
    ///
    /// Panics if another request type already uses `R::NAME`.
    pub fn invalidate_on<R: Request>(mut self, invalidation: Invalidation) -> Self {
        self.claim::<R>();
        self.registry.add_invalidation(R::NAME, invalidation);
        self
    }

    fn claim<R: Request>(&mut self) {
        if let Err(e) = self.registry.claim::<R>() {
            panic!("cannot configure {}: {e}", std::any::type_name::<R>());
        }
    }

    /// Add a custom behavior. Custom behaviors run inside logging and outside
    /// the cache behaviors, in registration order.
    pub fn behavior(mut self, behavior: impl PipelineBehavior + 'static) -> Self {
        self.behaviors.push(Arc::new(behavior));
        self
    }

    pub fn build(self) -> Mediator {
        let registry = Arc::new(self.registry);

        let mut behaviors: Vec<Arc<dyn PipelineBehavior>> =
            vec![Arc::new(LoggingBehavior::new(self.slow_request_threshold))];
        behaviors.extend(self.behaviors);
        if let Some(cache) = self.cache {
            behaviors.push(Arc::new(InvalidationBehavior::new(
                cache.clone(),
                registry.clone(),
            )));
            behaviors.push(Arc::new(CachingBehavior::new(cache, registry.clone())));
        }

        Mediator {
            handlers: self.handlers,
            behaviors,
            registry,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Serialize)]
    struct Ping {
        n: u32,
    }

    impl Request for Ping {
        type Response = u32;
        const NAME: &'static str = "Ping";
    }

    #[derive(Serialize)]
    struct Unhandled;

    impl Request for Unhandled {
        type Response = ();
        const NAME: &'static str = "Unhandled";
    }

    #[derive(Default)]
    struct PingHandler {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl RequestHandler<Ping> for Arc<PingHandler> {
        async fn handle(&self, request: &Ping, _context: &RequestContext) -> AppResult<u32> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(request.n * 2)
        }
    }

    struct Recording {
        seen: Arc<std::sync::Mutex<Vec<&'static str>>>,
    }

    #[async_trait]
    impl PipelineBehavior for Recording {
        async fn handle(
            &self,
            request: &RequestEnvelope<'_>,
            next: Next<'_>,
        ) -> AppResult<Response> {
            self.seen.lock().unwrap().push(request.name());
            next.run(request).await
        }
    }

    #[tokio::test]
    async fn test_send_reaches_handler() {
        let handler = Arc::new(PingHandler::default());
        let mediator = Mediator::builder().register::<Ping, _>(handler.clone()).build();

        let doubled = mediator
            .send(Ping { n: 21 }, &RequestContext::anonymous())
            .await
            .unwrap();
        assert_eq!(doubled, 42);
        assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unregistered_request_fails() {
        let mediator = Mediator::builder().build();
        let err = mediator
            .send(Unhandled, &RequestContext::anonymous())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::HandlerNotRegistered { request: "Unhandled" }
        ));
    }

    #[tokio::test]
    async fn test_cancelled_context_skips_handler() {
        let handler = Arc::new(PingHandler::default());
        let mediator = Mediator::builder().register::<Ping, _>(handler.clone()).build();

        let context = RequestContext::anonymous();
        context.cancellation().cancel();
        let err = mediator.send(Ping { n: 1 }, &context).await.unwrap_err();

        assert!(matches!(err, AppError::Cancelled { request: "Ping" }));
        assert_eq!(handler.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_custom_behaviors_run_in_order() {
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mediator = Mediator::builder()
            .register::<Ping, _>(Arc::new(PingHandler::default()))
            .behavior(Recording { seen: seen.clone() })
            .behavior(Recording { seen: seen.clone() })
            .build();

        mediator
            .send(Ping { n: 1 }, &RequestContext::anonymous())
            .await
            .unwrap();
        assert_eq!(*seen.lock().unwrap(), vec!["Ping", "Ping"]);
    }

    #[tokio::test]
    async fn test_cached_request_served_without_handler() {
        let handler = Arc::new(PingHandler::default());
        let cache = CacheManager::in_memory();
        let mediator = Mediator::builder()
            .cache(cache.clone())
            .register::<Ping, _>(handler.clone())
            .cache_policy::<Ping>(CachePolicy::new(60))
            .build();

        let ctx = RequestContext::anonymous();
        assert_eq!(mediator.send(Ping { n: 2 }, &ctx).await.unwrap(), 4);
        assert_eq!(mediator.send(Ping { n: 2 }, &ctx).await.unwrap(), 4);
        assert_eq!(mediator.send(Ping { n: 3 }, &ctx).await.unwrap(), 6);

        assert_eq!(handler.calls.load(Ordering::SeqCst), 2);
        assert!(cache.exists("Ping:n=2").await);
    }

    mod shadow {
        use super::*;

        #[derive(Serialize)]
        pub struct Ping;

        impl Request for Ping {
            type Response = u32;
            const NAME: &'static str = "Ping";
        }

        pub struct Zero;

        #[async_trait]
        impl RequestHandler<Ping> for Zero {
            async fn handle(&self, _: &Ping, _: &RequestContext) -> AppResult<u32> {
                Ok(0)
            }
        }
    }

    #[test]
    #[should_panic(expected = "request name 'Ping' is already used")]
    fn test_register_rejects_name_clash() {
        let _ = Mediator::builder()
            .register::<Ping, _>(Arc::new(PingHandler::default()))
            .register::<shadow::Ping, _>(shadow::Zero);
    }

    #[test]
    #[should_panic(expected = "request name 'Ping' is already used")]
    fn test_policy_override_rejects_name_clash() {
        let _ = Mediator::builder()
            .register::<Ping, _>(Arc::new(PingHandler::default()))
            .cache_policy::<shadow::Ping>(CachePolicy::new(60));
    }
}
