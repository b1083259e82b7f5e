//! The behavior chain wrapped around every handler invocation.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AppResult;
use crate::mediator::request::{ErasedRequest, Response};
use crate::mediator::RequestContext;

/// A request as seen by pipeline behaviors: its name, fields, context, and
/// a way to rebuild its typed response from cached JSON.
pub struct RequestEnvelope<'a> {
    name: &'static str,
    request: &'a dyn ErasedRequest,
    context: &'a RequestContext,
    decode: fn(&[u8]) -> serde_json::Result<Response>,
}

impl<'a> RequestEnvelope<'a> {
    pub(crate) fn new(
        name: &'static str,
        request: &'a dyn ErasedRequest,
        context: &'a RequestContext,
        decode: fn(&[u8]) -> serde_json::Result<Response>,
    ) -> Self {
        Self {
            name,
            request,
            context,
            decode,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn request(&self) -> &dyn ErasedRequest {
        self.request
    }

    pub fn context(&self) -> &RequestContext {
        self.context
    }

    /// Decode a cached payload into this request's response type.
    pub fn decode_response(&self, bytes: &[u8]) -> serde_json::Result<Response> {
        (self.decode)(bytes)
    }
}

/// Cross-cutting step around request handling.
///
/// A behavior either answers the request itself or calls [`Next::run`] to
/// continue down the chain.
#[async_trait]
pub trait PipelineBehavior: Send + Sync {
    async fn handle(&self, request: &RequestEnvelope<'_>, next: Next<'_>) -> AppResult<Response>;
}

/// Innermost step of the chain.
#[async_trait]
pub(crate) trait Endpoint: Send + Sync {
    async fn call(&self, request: &RequestEnvelope<'_>) -> AppResult<Response>;
}

/// The remainder of the chain after the current behavior.
pub struct Next<'a> {
    behaviors: &'a [Arc<dyn PipelineBehavior>],
    endpoint: &'a dyn Endpoint,
}

impl<'a> Next<'a> {
    pub(crate) fn new(
        behaviors: &'a [Arc<dyn PipelineBehavior>],
        endpoint: &'a dyn Endpoint,
    ) -> Self {
        Self {
            behaviors,
            endpoint,
        }
    }

    pub async fn run(self, request: &RequestEnvelope<'_>) -> AppResult<Response> {
        match self.behaviors.split_first() {
            Some((behavior, rest)) => {
                behavior
                    .handle(request, Next::new(rest, self.endpoint))
                    .await
            }
            None => self.endpoint.call(request).await,
        }
    }
}
