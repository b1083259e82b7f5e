use async_trait::async_trait;

use crate::error::AppResult;
use crate::mediator::{Request, RequestContext};

/// Handles one request type. Registered with
/// [`MediatorBuilder::register`](crate::mediator::MediatorBuilder::register).
#[async_trait]
pub trait RequestHandler<R: Request>: Send + Sync {
    async fn handle(&self, request: &R, context: &RequestContext) -> AppResult<R::Response>;
}
