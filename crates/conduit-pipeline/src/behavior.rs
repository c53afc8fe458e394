//! Core behavior trait and types.
//!
//! This module defines the [`Behavior`] trait that every pipeline stage
//! implements. A behavior sees each request before its handler runs and the
//! response (or error) after it completes.
//!
//! # Example
//!
//! ```
//! use conduit_core::{BoxFuture, CancellationToken, DispatchResult};
//! use conduit_pipeline::{AnyResponse, Behavior, Next, RequestEnvelope};
//!
//! struct AuditBehavior;
//!
//! impl Behavior for AuditBehavior {
//!     fn name(&self) -> &'static str {
//!         "audit"
//!     }
//!
//!     fn handle<'a>(
//!         &'a self,
//!         request: RequestEnvelope<'a>,
//!         next: Next<'a>,
//!         _cancel: &'a CancellationToken,
//!     ) -> BoxFuture<'a, DispatchResult<AnyResponse>> {
//!         Box::pin(async move {
//!             tracing::info!(request = request.request_type(), "audit: before");
//!             let response = next.run().await;
//!             tracing::info!(request = request.request_type(), ok = response.is_ok(), "audit: after");
//!             response
//!         })
//!     }
//! }
//! ```

use conduit_core::{
    BoxFuture, CancellationToken, DispatchError, DispatchResult, HandlerFamily, Request,
    RequestKind,
};
use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

/// A type-erased response travelling through the pipeline.
///
/// The mediator restores it to the request's response type once the chain
/// completes.
pub type AnyResponse = Box<dyn Any + Send>;

/// The innermost link of a chain: the actual handler call.
pub type Terminal<'a> = dyn Fn() -> BoxFuture<'a, DispatchResult<AnyResponse>> + Send + Sync + 'a;

/// A shareable behavior.
pub type BoxedBehavior = Arc<dyn Behavior>;

/// A read-only, type-erased view of the request being dispatched.
#[derive(Clone, Copy)]
pub struct RequestEnvelope<'a> {
    request: &'a (dyn Any + Send + Sync),
    request_type: &'static str,
    family: HandlerFamily,
}

impl<'a> RequestEnvelope<'a> {
    /// Wraps a request.
    pub fn new<R: Request>(request: &'a R) -> Self {
        Self {
            request,
            request_type: type_name::<R>(),
            family: <R::Kind as RequestKind>::FAMILY,
        }
    }

    /// Returns the request as `T` if that is its concrete type.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&'a T> {
        self.request.downcast_ref::<T>()
    }

    /// Returns `true` if the request is a `T`.
    #[must_use]
    pub fn is<T: Any>(&self) -> bool {
        self.request.is::<T>()
    }

    /// Returns the erased request.
    #[must_use]
    pub fn request(&self) -> &'a (dyn Any + Send + Sync) {
        self.request
    }

    /// Returns the fully qualified request type name.
    #[must_use]
    pub const fn request_type(&self) -> &'static str {
        self.request_type
    }

    /// Returns the request type name without its module path.
    #[must_use]
    pub fn short_type_name(&self) -> &'static str {
        let base = self
            .request_type
            .split('<')
            .next()
            .unwrap_or(self.request_type);
        base.rsplit("::").next().unwrap_or(base)
    }

    /// Returns the handler family of the request.
    #[must_use]
    pub const fn family(&self) -> HandlerFamily {
        self.family
    }
}

impl fmt::Debug for RequestEnvelope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestEnvelope")
            .field("request_type", &self.request_type)
            .field("family", &self.family)
            .finish_non_exhaustive()
    }
}

/// The core behavior trait.
///
/// A behavior receives the request envelope, a [`Next`] continuation for the
/// rest of the chain, and the cancellation token. It may:
///
/// - call `next.run()` once and return its result (pass-through)
/// - call it and return a different value (transformation)
/// - never call it and return its own value (short-circuit)
/// - call it several times (retry)
///
/// Behaviors are shared across all dispatches and must not keep per-request
/// state; anything request-scoped comes from the envelope.
pub trait Behavior: Send + Sync + 'static {
    /// Returns the unique name of this behavior, used in logs and diagnostics.
    fn name(&self) -> &'static str;

    /// Processes the request through this behavior.
    fn handle<'a>(
        &'a self,
        request: RequestEnvelope<'a>,
        next: Next<'a>,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, DispatchResult<AnyResponse>>;
}

/// Continuation invoking the rest of the chain.
///
/// `Next` is `Copy`: a behavior may run it zero, one or several times.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    stages: &'a [BoxedBehavior],
    terminal: &'a Terminal<'a>,
    request: RequestEnvelope<'a>,
    cancel: &'a CancellationToken,
}

impl<'a> Next<'a> {
    /// Creates the continuation for `stages` followed by `terminal`.
    pub(crate) fn new(
        stages: &'a [BoxedBehavior],
        terminal: &'a Terminal<'a>,
        request: RequestEnvelope<'a>,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            stages,
            terminal,
            request,
            cancel,
        }
    }

    /// Invokes the next behavior, or the handler when no behaviors remain.
    ///
    /// Returns [`DispatchError::Cancelled`] without entering the next stage
    /// once the token is cancelled.
    pub fn run(self) -> BoxFuture<'a, DispatchResult<AnyResponse>> {
        if self.cancel.is_cancelled() {
            return Box::pin(async { Err(DispatchError::Cancelled) });
        }

        match self.stages.split_first() {
            Some((behavior, rest)) => behavior.handle(
                self.request,
                Self {
                    stages: rest,
                    ..self
                },
                self.cancel,
            ),
            None => (self.terminal)(),
        }
    }

    /// Returns the number of behaviors between this point and the handler.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.stages.len()
    }
}

impl fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("remaining", &self.stages.len())
            .field("request", &self.request)
            .finish_non_exhaustive()
    }
}

/// A behavior created from a function.
///
/// # Example
///
/// ```
/// use conduit_pipeline::{AnyResponse, FnBehavior};
///
/// let shout = FnBehavior::new("shout", |_request, next, _cancel| {
///     Box::pin(async move {
///         next.run().await.map(|response| match response.downcast::<String>() {
///             Ok(text) => Box::new(text.to_uppercase()) as AnyResponse,
///             Err(other) => other,
///         })
///     })
/// });
/// ```
pub struct FnBehavior<F> {
    name: &'static str,
    func: F,
}

impl<F> FnBehavior<F> {
    /// Creates a new function-based behavior.
    pub fn new(name: &'static str, func: F) -> Self
    where
        F: for<'a> Fn(
                RequestEnvelope<'a>,
                Next<'a>,
                &'a CancellationToken,
            ) -> BoxFuture<'a, DispatchResult<AnyResponse>>
            + Send
            + Sync
            + 'static,
    {
        Self { name, func }
    }
}

impl<F> Behavior for FnBehavior<F>
where
    F: for<'a> Fn(
            RequestEnvelope<'a>,
            Next<'a>,
            &'a CancellationToken,
        ) -> BoxFuture<'a, DispatchResult<AnyResponse>>
        + Send
        + Sync
        + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn handle<'a>(
        &'a self,
        request: RequestEnvelope<'a>,
        next: Next<'a>,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, DispatchResult<AnyResponse>> {
        (self.func)(request, next, cancel)
    }
}

impl<F> fmt::Debug for FnBehavior<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnBehavior").field("name", &self.name).finish()
    }
}
