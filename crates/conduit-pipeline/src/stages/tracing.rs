//! Tracing behavior.
//!
//! Opens a `dispatch` span around the rest of the chain and logs the outcome
//! of every request.
//!
//! ## Span Fields
//!
//! - `dispatch_id` - unique per dispatch (UUID v7, time ordered)
//! - `request` - the request type name
//! - `family` - `command` or `query`
//!
//! Failures are logged at `warn`, cancellations at `debug`. A dispatch
//! dropped before it completes is logged as cancelled.

use crate::behavior::{AnyResponse, Behavior, Next, RequestEnvelope};
use conduit_core::{BoxFuture, CancellationToken, DispatchResult};
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

/// Behavior that wraps each dispatch in a tracing span.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingBehavior;

impl TracingBehavior {
    /// Creates a new tracing behavior.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Generates a new dispatch ID.
    fn generate_dispatch_id() -> String {
        Uuid::now_v7().simple().to_string()
    }
}

/// Logs a cancellation if the dispatch is dropped before it completes.
struct Unfinished {
    start: Instant,
    armed: bool,
}

impl Unfinished {
    fn start() -> Self {
        Self {
            start: Instant::now(),
            armed: true,
        }
    }

    fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    /// Marks the dispatch as completed and returns its duration in milliseconds.
    fn complete(mut self) -> f64 {
        self.armed = false;
        self.elapsed_ms()
    }
}

impl Drop for Unfinished {
    fn drop(&mut self) {
        if self.armed {
            tracing::debug!(duration_ms = self.elapsed_ms(), "request cancelled");
        }
    }
}

impl Behavior for TracingBehavior {
    fn name(&self) -> &'static str {
        "tracing"
    }

    fn handle<'a>(
        &'a self,
        request: RequestEnvelope<'a>,
        next: Next<'a>,
        _cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, DispatchResult<AnyResponse>> {
        let span = tracing::info_span!(
            "dispatch",
            dispatch_id = %Self::generate_dispatch_id(),
            request = request.short_type_name(),
            family = %request.family(),
        );

        Box::pin(
            async move {
                let unfinished = Unfinished::start();
                tracing::debug!(request_type = request.request_type(), "dispatching request");

                let result = next.run().await;
                let duration_ms = unfinished.complete();

                match &result {
                    Ok(_) => tracing::debug!(duration_ms, "request handled"),
                    Err(error) if error.is_cancelled() => {
                        tracing::debug!(duration_ms, "request cancelled");
                    }
                    Err(error) => tracing::warn!(duration_ms, error = %error, "request failed"),
                }

                result
            }
            .instrument(span),
        )
    }
}
