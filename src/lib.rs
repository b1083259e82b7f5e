//! Query-Cache Library
//!
//! A read-through caching pipeline for a CQRS-style request mediator:
//! cacheable queries are served from a pluggable cache store and mutating
//! commands purge the entries they make stale.

extern crate self as query_cache;

pub mod cache;
pub mod config;
pub mod error;
pub mod logger;
pub mod mediator;
pub mod people;

pub use cache::CacheManager;
pub use error::{AppError, AppResult};
pub use mediator::{Mediator, MediatorBuilder, Request, RequestContext};

pub fn pkg_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
