//! Logging behavior for request tracing.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{Instrument, Level, debug, span, warn};

use crate::error::AppResult;
use crate::mediator::request::Response;
use crate::mediator::{Next, PipelineBehavior, RequestEnvelope};

/// Outermost behavior: wraps each dispatch in a span and logs its outcome
/// and duration. Requests slower than the threshold are logged at `warn`.
pub struct LoggingBehavior {
    slow_threshold: Duration,
}

impl LoggingBehavior {
    pub fn new(slow_threshold: Duration) -> Self {
        Self { slow_threshold }
    }
}

#[async_trait]
impl PipelineBehavior for LoggingBehavior {
    async fn handle(&self, request: &RequestEnvelope<'_>, next: Next<'_>) -> AppResult<Response> {
        let name = request.name();
        let principal = request.context().principal().unwrap_or("anonymous");
        let span = span!(Level::DEBUG, "request", request = name, principal = %principal);

        let start = Instant::now();
        let result = next.run(request).instrument(span).await;
        let duration = start.elapsed();

        match &result {
            Ok(_) if duration >= self.slow_threshold => {
                warn!(request = name, duration_ms = %duration.as_millis(), "slow request");
            }
            Ok(_) => {
                debug!(request = name, duration_ms = %duration.as_millis(), "request handled");
            }
            Err(e) => {
                warn!(request = name, duration_ms = %duration.as_millis(), error = %e, "request failed");
            }
        }

        result
    }
}
