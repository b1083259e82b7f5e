use thiserror::Error;

/// Application-wide error type returned by the mediator and request handlers.
///
/// Cache-layer faults never appear here: they are absorbed by the cache
/// store and the pipeline behaviors. Callers only observe handler failures
/// and dispatcher failures (missing handler, cancellation).
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found error with entity, field, and value information
    #[error("Resource not found: {entity} with {field}={value}")]
    NotFound {
        entity: String,
        field: String,
        value: String,
    },

    /// Duplicate entry or conflicting state
    #[error("Conflict: {entity}.{field} = '{value}' already exists")]
    Conflict {
        entity: String,
        field: String,
        value: String,
    },

    /// Validation error with field-specific details
    #[error("Validation failed for {field}: {reason}")]
    Validation { field: String, reason: String },

    /// No handler was registered for the dispatched request type
    #[error("No handler registered for request '{request}'")]
    HandlerNotRegistered { request: &'static str },

    /// The caller cancelled the request before it completed
    #[error("Request '{request}' was cancelled")]
    Cancelled { request: &'static str },

    /// Internal error for unexpected failures
    #[error("Internal error")]
    Internal {
        #[source]
        source: anyhow::Error,
    },
}

impl AppError {
    /// Build a `NotFound` error.
    pub fn not_found(
        entity: impl Into<String>,
        field: impl Into<String>,
        value: impl ToString,
    ) -> Self {
        AppError::NotFound {
            entity: entity.into(),
            field: field.into(),
            value: value.to_string(),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        AppError::Internal { source: error }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let (field, reason) = errors
            .field_errors()
            .into_iter()
            .next()
            .map(|(field, errs)| {
                let reason = errs
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                (field.to_string(), reason)
            })
            .unwrap_or_else(|| ("request".to_string(), errors.to_string()));
        AppError::Validation { field, reason }
    }
}

/// Type alias for Result with AppError to simplify function signatures
pub type AppResult<T> = Result<T, AppError>;
