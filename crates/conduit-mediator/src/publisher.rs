//! Notification fan-out.
//!
//! Publishing resolves every handler registered for the notification type
//! and awaits them one at a time, in registration order. The first failure
//! stops the fan-out; handlers after it are not invoked.

use std::any::type_name;
use std::sync::Arc;

use conduit_core::di::ServiceProvider;
use conduit_core::{
    CancellationToken, Contract, DispatchError, DispatchResult, Notification, NotificationHandler,
};
use tracing::{debug, warn};

/// Delivers notifications to all of their handlers.
///
/// The publisher is stateless and holds no handler instances; handlers are
/// resolved from the provider on every publish.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotificationPublisher;

impl NotificationPublisher {
    /// Creates a new publisher.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Delivers `notification` to every handler registered for `N`.
    ///
    /// Zero handlers is a successful no-op. Before each handler starts the
    /// token is checked, and a running handler is abandoned as soon as the
    /// token fires.
    ///
    /// # Errors
    ///
    /// Returns the first handler error, [`DispatchError::Cancelled`], or the
    /// provider's resolution error.
    pub async fn publish<N: Notification>(
        &self,
        notification: &N,
        provider: &dyn ServiceProvider,
        cancel: &CancellationToken,
    ) -> DispatchResult<()> {
        let contract = Contract::notification::<N>();
        let services = provider.resolve_many(&contract)?;

        if services.is_empty() {
            debug!(notification = type_name::<N>(), "no notification handlers registered");
            return Ok(());
        }

        debug!(
            notification = type_name::<N>(),
            handlers = services.len(),
            "publishing notification"
        );

        for (index, service) in services.into_iter().enumerate() {
            cancel.check()?;

            let handler = service
                .downcast::<Arc<dyn NotificationHandler<N>>>()
                .map_err(|_| {
                    DispatchError::resolution(
                        &contract,
                        format!("service {index} does not implement the contract"),
                    )
                })?;

            let result = tokio::select! {
                biased;
                () = cancel.cancelled() => Err(DispatchError::Cancelled),
                result = handler.handle(notification, cancel) => result,
            };

            if let Err(error) = result {
                if !error.is_cancelled() {
                    warn!(
                        notification = type_name::<N>(),
                        handler = index,
                        error = %error,
                        "notification handler failed"
                    );
                }
                return Err(error);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conduit_core::di::Container;
    use conduit_core::fixtures::{FailingHandler, RecordingHandler, UserCreated};
    use conduit_core::BoxFuture;

    #[tokio::test]
    async fn test_publish_in_registration_order() {
        let log = RecordingHandler::log();
        let mut container = Container::new();
        container
            .add_notification_handler::<UserCreated, _>(RecordingHandler::new("a", &log))
            .add_notification_handler::<UserCreated, _>(RecordingHandler::new("b", &log))
            .add_notification_handler::<UserCreated, _>(RecordingHandler::new("c", &log));

        let cancel = CancellationToken::new();
        NotificationPublisher::new()
            .publish(&UserCreated::new("ada"), &container, &cancel)
            .await
            .unwrap();

        assert_eq!(*log.lock(), vec!["a:ada", "b:ada", "c:ada"]);
    }

    #[tokio::test]
    async fn test_publish_without_handlers() {
        let container = Container::new();
        let cancel = CancellationToken::new();

        let result = NotificationPublisher::new()
            .publish(&UserCreated::new("ada"), &container, &cancel)
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_failure_stops_fan_out() {
        let log = RecordingHandler::log();
        let mut container = Container::new();
        container
            .add_notification_handler::<UserCreated, _>(RecordingHandler::new("a", &log))
            .add_notification_handler::<UserCreated, _>(FailingHandler::new("b", &log))
            .add_notification_handler::<UserCreated, _>(RecordingHandler::new("c", &log));

        let cancel = CancellationToken::new();
        let err = NotificationPublisher::new()
            .publish(&UserCreated::new("ada"), &container, &cancel)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "b failed");
        assert_eq!(*log.lock(), vec!["a:ada", "b:failed"]);
    }

    #[tokio::test]
    async fn test_cancelled_before_publish() {
        let log = RecordingHandler::log();
        let mut container = Container::new();
        container.add_notification_handler::<UserCreated, _>(RecordingHandler::new("a", &log));

        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = NotificationPublisher::new()
            .publish(&UserCreated::new("ada"), &container, &cancel)
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        assert!(log.lock().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_between_handlers() {
        struct CancellingHandler;

        impl NotificationHandler<UserCreated> for CancellingHandler {
            fn handle<'a>(
                &'a self,
                _notification: &'a UserCreated,
                cancel: &'a CancellationToken,
            ) -> BoxFuture<'a, DispatchResult<()>> {
                Box::pin(async move {
                    cancel.cancel();
                    Ok(())
                })
            }
        }

        let log = RecordingHandler::log();
        let mut container = Container::new();
        container
            .add_notification_handler::<UserCreated, _>(CancellingHandler)
            .add_notification_handler::<UserCreated, _>(RecordingHandler::new("after", &log));

        let cancel = CancellationToken::new();
        let err = NotificationPublisher::new()
            .publish(&UserCreated::new("ada"), &container, &cancel)
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        assert!(log.lock().is_empty());
    }
}
