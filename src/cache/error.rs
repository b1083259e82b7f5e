//! Cache error types.

use thiserror::Error;

/// Errors that can occur during cache operations.
///
/// These never cross the [`CacheManager`](crate::cache::CacheManager)
/// boundary on the read and write paths; they are logged and absorbed there.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache operation failed: {0}")]
    Operation(String),

    #[error("Cache connection failed: {0}")]
    Connection(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid key pattern '{pattern}': {message}")]
    Pattern { pattern: String, message: String },
}

impl From<serde_json::Error> for CacheError {
    fn from(error: serde_json::Error) -> Self {
        CacheError::Serialization(error.to_string())
    }
}
