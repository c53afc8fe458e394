//! Metrics behavior.
//!
//! Records request counts and latency through the `metrics` facade. Nothing
//! is exported unless a recorder is installed, see
//! `conduit_telemetry::metrics::init_metrics`.
//!
//! # Metrics Emitted
//!
//! - `conduit_requests_total` - counter by `request`, `family` and `outcome`
//! - `conduit_request_duration_seconds` - histogram by `request`
//! - `conduit_in_flight_requests` - gauge of dispatches inside the chain
//!
//! A dispatch dropped before it completes counts as `outcome="cancelled"`.

use crate::behavior::{AnyResponse, Behavior, Next, RequestEnvelope};
use conduit_core::{BoxFuture, CancellationToken, DispatchError, DispatchResult};
use metrics::{counter, gauge, histogram};
use std::time::Instant;

/// Counter of dispatched requests.
pub const REQUESTS_TOTAL: &str = "conduit_requests_total";

/// Histogram of dispatch latency in seconds.
pub const REQUEST_DURATION_SECONDS: &str = "conduit_request_duration_seconds";

/// Gauge of dispatches currently in the chain.
pub const IN_FLIGHT_REQUESTS: &str = "conduit_in_flight_requests";

/// Behavior that emits request metrics.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsBehavior;

impl MetricsBehavior {
    /// Creates a new metrics behavior.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

/// Maps a dispatch result to its `outcome` label.
fn outcome(result: &DispatchResult<AnyResponse>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(DispatchError::Cancelled) => "cancelled",
        Err(DispatchError::Timeout(_)) => "timeout",
        Err(_) => "error",
    }
}

/// Holds one in-flight slot for the life of a dispatch.
///
/// Dropping the guard releases the slot. A guard dropped before
/// [`finish`](Self::finish) means the chain was abandoned mid-flight, either
/// by the executor reacting to cancellation or by the caller dropping the
/// `send` future, and is recorded as `outcome="cancelled"`.
struct InFlight {
    request: &'static str,
    family: &'static str,
    start: Instant,
    finished: bool,
}

impl InFlight {
    fn enter(request: &'static str, family: &'static str) -> Self {
        gauge!(IN_FLIGHT_REQUESTS).increment(1.0);
        Self {
            request,
            family,
            start: Instant::now(),
            finished: false,
        }
    }

    fn record(&self, outcome: &'static str) {
        histogram!(REQUEST_DURATION_SECONDS, "request" => self.request)
            .record(self.start.elapsed().as_secs_f64());
        counter!(
            REQUESTS_TOTAL,
            "request" => self.request,
            "family" => self.family,
            "outcome" => outcome
        )
        .increment(1);
    }

    fn finish(mut self, result: &DispatchResult<AnyResponse>) {
        self.record(outcome(result));
        self.finished = true;
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if !self.finished {
            self.record("cancelled");
        }
        gauge!(IN_FLIGHT_REQUESTS).decrement(1.0);
    }
}

impl Behavior for MetricsBehavior {
    fn name(&self) -> &'static str {
        "metrics"
    }

    fn handle<'a>(
        &'a self,
        request: RequestEnvelope<'a>,
        next: Next<'a>,
        _cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, DispatchResult<AnyResponse>> {
        Box::pin(async move {
            let in_flight =
                InFlight::enter(request.short_type_name(), request.family().as_str());

            let result = next.run().await;
            in_flight.finish(&result);

            result
        })
    }
}
