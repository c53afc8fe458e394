//! Dispatch orchestrator.
//!
//! [`Mediator`] is the entry point callers use: `send` routes a request to its
//! single handler through the behavior pipeline, `publish` fans a
//! notification out to every handler registered for it.

use std::any::type_name;
use std::fmt;
use std::sync::Arc;

use conduit_core::di::ServiceProvider;
use conduit_core::{CancellationToken, DispatchError, DispatchResult, Notification, Request};
use conduit_pipeline::{PipelineExecutor, RequestEnvelope};

use crate::builder::MediatorBuilder;
use crate::publisher::NotificationPublisher;
use crate::registry::HandlerRegistry;

/// Routes requests and notifications to their handlers.
///
/// A mediator holds no per-call state. It is `Send + Sync` and is usually
/// shared behind an `Arc`; clones share the provider, cache and pipeline.
///
/// # Example
///
/// ```
/// use conduit_core::fixtures::{AddCommand, AddCommandHandler};
/// use conduit_mediator::Mediator;
///
/// # tokio_test::block_on(async {
/// let mediator = Mediator::builder()
///     .command_handler::<AddCommand, _>(AddCommandHandler)
///     .build();
///
/// let response = mediator.send(AddCommand::new("OK")).await.unwrap();
/// assert_eq!(response, "OK");
/// # });
/// ```
#[derive(Clone)]
pub struct Mediator {
    provider: Arc<dyn ServiceProvider>,
    registry: Arc<HandlerRegistry>,
    pipeline: PipelineExecutor,
    publisher: NotificationPublisher,
}

impl Mediator {
    /// Creates a mediator from its parts.
    pub fn new(
        provider: Arc<dyn ServiceProvider>,
        registry: Arc<HandlerRegistry>,
        pipeline: PipelineExecutor,
        publisher: NotificationPublisher,
    ) -> Self {
        Self {
            provider,
            registry,
            pipeline,
            publisher,
        }
    }

    /// Creates a builder with an empty handler container.
    #[must_use]
    pub fn builder() -> MediatorBuilder {
        MediatorBuilder::new()
    }

    /// Sends a request to its handler.
    ///
    /// # Errors
    ///
    /// See [`send_with`](Self::send_with).
    pub async fn send<R: Request>(&self, request: R) -> DispatchResult<R::Response> {
        self.send_with(request, &CancellationToken::new()).await
    }

    /// Sends a request to its handler, observing `cancel`.
    ///
    /// The request runs through every behavior in the pipeline before the
    /// handler, which is resolved from the provider for this call only.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::HandlerNotFound`] if no handler is registered for `R`
    /// - [`DispatchError::Cancelled`] if `cancel` fires first
    /// - any error raised by a behavior or the handler, unchanged
    pub async fn send_with<R: Request>(
        &self,
        request: R,
        cancel: &CancellationToken,
    ) -> DispatchResult<R::Response> {
        cancel.check()?;

        let cached = self.registry.get_or_add::<R>(self.provider.as_ref())?;
        let invoker = cached.as_ref();
        let provider = self.provider.as_ref();
        let envelope = RequestEnvelope::new(&request);

        let terminal = move || invoker.invoke(envelope.request(), provider, cancel);
        let response = self.pipeline.execute(envelope, &terminal, cancel).await?;

        response
            .downcast::<R::Response>()
            .map(|response| *response)
            .map_err(|_| DispatchError::ResponseTypeMismatch {
                request_type: type_name::<R>(),
                expected: type_name::<R::Response>(),
            })
    }

    /// Publishes a notification to every registered handler.
    ///
    /// # Errors
    ///
    /// See [`publish_with`](Self::publish_with).
    pub async fn publish<N: Notification>(&self, notification: N) -> DispatchResult<()> {
        self.publish_with(notification, &CancellationToken::new()).await
    }

    /// Publishes a notification to every registered handler, observing `cancel`.
    ///
    /// Handlers run one after another in registration order. Notifications
    /// do not pass through the behavior pipeline.
    ///
    /// # Errors
    ///
    /// Returns the first handler error or [`DispatchError::Cancelled`];
    /// handlers after a failure are not invoked.
    pub async fn publish_with<N: Notification>(
        &self,
        notification: N,
        cancel: &CancellationToken,
    ) -> DispatchResult<()> {
        cancel.check()?;
        self.publisher
            .publish(&notification, self.provider.as_ref(), cancel)
            .await
    }

    /// Returns the behavior pipeline.
    #[must_use]
    pub const fn pipeline(&self) -> &PipelineExecutor {
        &self.pipeline
    }

    /// Returns the handler resolution cache.
    #[must_use]
    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }
}

impl fmt::Debug for Mediator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mediator")
            .field("registry", &self.registry)
            .field("pipeline", &self.pipeline)
            .finish_non_exhaustive()
    }
}
