//! Request types flowing through the mediator.

use std::any::Any;
use std::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use crate::mediator::{CachePolicy, Invalidation};

/// A query or command dispatched through the [`Mediator`](crate::mediator::Mediator).
///
/// Usually derived with `#[derive(Request)]`, which also attaches the
/// `#[cacheable(...)]` and `#[invalidates(...)]` declarations:
///
/// ```ignore
/// #[derive(Debug, Serialize, Request)]
/// #[request(response = Vec<Person>)]
/// #[cacheable(duration = 300)]
/// pub struct ListPeopleQuery;
/// ```
///
/// The request's serialized fields are what the cache key is built from, so
/// every field that affects the response must be serialized.
pub trait Request: Serialize + Send + Sync + 'static {
    type Response: Serialize + DeserializeOwned + Send + 'static;

    /// Stable identity of the request type and its cache namespace. Must be
    /// unique among registered requests.
    const NAME: &'static str;

    /// Cacheable policy declared on the type, if any.
    fn cache_policy() -> Option<CachePolicy> {
        None
    }

    /// Invalidation declarations, applied after the request succeeds.
    fn invalidations() -> Vec<Invalidation> {
        Vec::new()
    }
}

/// Ambient data for one dispatch: the acting principal and a cancellation
/// signal from the caller.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    principal: Option<String>,
    cancellation: CancellationToken,
}

impl RequestContext {
    /// A context with no principal and a fresh cancellation token.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn for_principal(principal: impl Into<String>) -> Self {
        Self {
            principal: Some(principal.into()),
            cancellation: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn principal(&self) -> Option<&str> {
        self.principal.as_deref()
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}

/// Object-safe view of a request's fields.
pub trait ErasedRequest: Send + Sync {
    fn to_json(&self) -> serde_json::Result<serde_json::Value>;
}

impl<T: Serialize + Send + Sync> ErasedRequest for T {
    fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

trait ErasedResponse: Send {
    fn to_json(&self) -> serde_json::Result<Vec<u8>>;
    fn into_any(self: Box<Self>) -> Box<dyn Any + Send>;
}

impl<T: Serialize + Send + 'static> ErasedResponse for T {
    fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send> {
        self
    }
}

/// A type-erased handler response travelling back through the pipeline.
pub struct Response {
    inner: Box<dyn ErasedResponse>,
}

impl Response {
    pub fn new<T: Serialize + Send + 'static>(value: T) -> Self {
        Self {
            inner: Box::new(value),
        }
    }

    /// JSON encoding of the response, as stored in the cache.
    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        self.inner.to_json()
    }

    /// Recover the concrete response. `None` if `T` is not the stored type.
    pub fn downcast<T: 'static>(self) -> Option<T> {
        self.inner.into_any().downcast::<T>().ok().map(|boxed| *boxed)
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response").finish_non_exhaustive()
    }
}

pub(crate) fn decode_as<T>(bytes: &[u8]) -> serde_json::Result<Response>
where
    T: Serialize + DeserializeOwned + Send + 'static,
{
    serde_json::from_slice::<T>(bytes).map(Response::new)
}
