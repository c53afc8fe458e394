//! Timeout behavior.
//!
//! Bounds everything inside it, including the handler, with a deadline.

use crate::behavior::{AnyResponse, Behavior, Next, RequestEnvelope};
use conduit_core::{BoxFuture, CancellationToken, DispatchError, DispatchResult};
use std::time::Duration;

/// Behavior that fails a dispatch with [`DispatchError::Timeout`] once its
/// deadline passes.
#[derive(Debug, Clone, Copy)]
pub struct TimeoutBehavior {
    duration: Duration,
}

impl TimeoutBehavior {
    /// Creates a timeout behavior with the given deadline.
    #[must_use]
    pub const fn new(duration: Duration) -> Self {
        Self { duration }
    }

    /// Returns the configured deadline.
    #[must_use]
    pub const fn duration(&self) -> Duration {
        self.duration
    }
}

impl Behavior for TimeoutBehavior {
    fn name(&self) -> &'static str {
        "timeout"
    }

    fn handle<'a>(
        &'a self,
        request: RequestEnvelope<'a>,
        next: Next<'a>,
        _cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, DispatchResult<AnyResponse>> {
        Box::pin(async move {
            match tokio::time::timeout(self.duration, next.run()).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::debug!(
                        request = request.request_type(),
                        timeout_ms = self.duration.as_millis(),
                        "dispatch deadline exceeded"
                    );
                    Err(DispatchError::Timeout(self.duration))
                }
            }
        })
    }
}
