//! In-process request mediator with a behavior pipeline.
//!
//! Queries and commands are plain serializable structs implementing
//! [`Request`], normally via `#[derive(Request)]`. Each is routed to one
//! [`RequestHandler`] through a chain of [`PipelineBehavior`]s:
//!
//! - [`LoggingBehavior`] traces every dispatch.
//! - [`InvalidationBehavior`] evicts cached results after a command succeeds.
//! - [`CachingBehavior`] answers `#[cacheable]` queries from the cache.
//!
//! ```ignore
//! #[derive(Debug, Serialize, Request)]
//! #[request(response = Option<Person>)]
//! #[cacheable(duration = 120)]
//! pub struct GetPersonQuery { pub id: u64 }
//!
//! #[derive(Debug, Serialize, Request)]
//! #[request(response = Person)]
//! #[invalidates(queries(ListPeopleQuery, GetPersonQuery))]
//! pub struct UpdatePersonCommand { pub id: u64, pub name: String }
//!
//! let mediator = Mediator::builder()
//!     .cache(cache)
//!     .register::<GetPersonQuery, _>(GetPersonHandler::new(repo.clone()))
//!     .register::<UpdatePersonCommand, _>(UpdatePersonHandler::new(repo))
//!     .build();
//! let person = mediator.send(GetPersonQuery { id: 1 }, &ctx).await?;
//! ```

mod caching;
mod dispatch;
mod handler;
mod invalidation;
mod key;
mod logging;
mod pipeline;
mod policy;
mod request;

pub use caching::CachingBehavior;
pub use dispatch::{Mediator, MediatorBuilder};
pub use handler::RequestHandler;
pub use invalidation::InvalidationBehavior;
pub use key::{CacheKeyGenerator, KeyError};
pub use logging::LoggingBehavior;
pub use pipeline::{Next, PipelineBehavior, RequestEnvelope};
pub use policy::{CachePolicy, DuplicateRequestName, Invalidation, PolicyRegistry};
pub use request::{ErasedRequest, Request, RequestContext, Response};

pub use query_cache_macros::Request;
