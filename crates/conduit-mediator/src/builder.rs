//! Mediator construction.
//!
//! [`MediatorBuilder`] registers handlers into a [`Container`] and behaviors
//! into a [`PipelineBuilder`], then freezes both into a [`Mediator`]. Hosts
//! with their own container skip the builder and call [`Mediator::new`].

use std::sync::Arc;

use conduit_config::PipelineConfig;
use conduit_core::di::Container;
use conduit_core::{
    Command, CommandHandler, Notification, NotificationHandler, Query, QueryHandler,
};
use conduit_pipeline::{Behavior, BoxedBehavior, PipelineBuilder};

use crate::mediator::Mediator;
use crate::publisher::NotificationPublisher;
use crate::registry::HandlerRegistry;

/// Builder for [`Mediator`].
///
/// # Example
///
/// ```
/// use conduit_core::fixtures::{EchoQuery, EchoQueryHandler};
/// use conduit_mediator::MediatorBuilder;
/// use std::time::Duration;
///
/// let mediator = MediatorBuilder::new()
///     .query_handler::<EchoQuery, _>(EchoQueryHandler::default())
///     .tracing()
///     .timeout(Duration::from_secs(5))
///     .build();
///
/// assert_eq!(mediator.pipeline().behavior_names(), vec!["tracing", "timeout"]);
/// ```
#[derive(Debug, Default)]
pub struct MediatorBuilder {
    container: Container,
    pipeline: PipelineBuilder,
}

impl MediatorBuilder {
    /// Creates a builder with no handlers and no behaviors.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the single handler for command `C`.
    ///
    /// Registering a second handler for the same command makes every send
    /// of `C` fail with a resolution error.
    #[must_use]
    pub fn command_handler<C, H>(mut self, handler: H) -> Self
    where
        C: Command,
        H: CommandHandler<C>,
    {
        self.container.add_command_handler::<C, H>(handler);
        self
    }

    /// Registers a factory producing the handler for command `C` on every send.
    #[must_use]
    pub fn command_handler_factory<C, H, F>(mut self, factory: F) -> Self
    where
        C: Command,
        H: CommandHandler<C>,
        F: Fn() -> H + Send + Sync + 'static,
    {
        self.container.add_command_handler_factory::<C, H, F>(factory);
        self
    }

    /// Registers the single handler for query `Q`.
    #[must_use]
    pub fn query_handler<Q, H>(mut self, handler: H) -> Self
    where
        Q: Query,
        H: QueryHandler<Q>,
    {
        self.container.add_query_handler::<Q, H>(handler);
        self
    }

    /// Registers a factory producing the handler for query `Q` on every send.
    #[must_use]
    pub fn query_handler_factory<Q, H, F>(mut self, factory: F) -> Self
    where
        Q: Query,
        H: QueryHandler<Q>,
        F: Fn() -> H + Send + Sync + 'static,
    {
        self.container.add_query_handler_factory::<Q, H, F>(factory);
        self
    }

    /// Appends a handler for notification `N`.
    ///
    /// Handlers are invoked in the order they are added.
    #[must_use]
    pub fn notification_handler<N, H>(mut self, handler: H) -> Self
    where
        N: Notification,
        H: NotificationHandler<N>,
    {
        self.container.add_notification_handler::<N, H>(handler);
        self
    }

    /// Appends a factory producing a handler for notification `N` on every publish.
    #[must_use]
    pub fn notification_handler_factory<N, H, F>(mut self, factory: F) -> Self
    where
        N: Notification,
        H: NotificationHandler<N>,
        F: Fn() -> H + Send + Sync + 'static,
    {
        self.container
            .add_notification_handler_factory::<N, H, F>(factory);
        self
    }

    /// Appends a user behavior. The first behavior added is the outermost.
    #[must_use]
    pub fn behavior<B: Behavior>(mut self, behavior: B) -> Self {
        self.pipeline = self.pipeline.behavior(behavior);
        self
    }

    /// Appends an already shared behavior.
    #[must_use]
    pub fn shared_behavior(mut self, behavior: BoxedBehavior) -> Self {
        self.pipeline = self.pipeline.shared(behavior);
        self
    }

    /// Installs the built-in tracing behavior.
    #[must_use]
    pub fn tracing(mut self) -> Self {
        self.pipeline = self.pipeline.tracing();
        self
    }

    /// Installs the built-in metrics behavior.
    #[must_use]
    pub fn metrics(mut self) -> Self {
        self.pipeline = self.pipeline.metrics();
        self
    }

    /// Installs the built-in timeout behavior.
    #[must_use]
    pub fn timeout(mut self, duration: std::time::Duration) -> Self {
        self.pipeline = self.pipeline.timeout(duration);
        self
    }

    /// Installs the built-in behaviors enabled in `config`.
    #[must_use]
    pub fn with_config(mut self, config: &PipelineConfig) -> Self {
        if config.tracing {
            self = self.tracing();
        }
        if config.metrics {
            self = self.metrics();
        }
        if let Some(timeout) = config.timeout() {
            self = self.timeout(timeout);
        }
        self
    }

    /// Returns the handler container assembled so far.
    #[must_use]
    pub const fn container(&self) -> &Container {
        &self.container
    }

    /// Builds the mediator.
    #[must_use]
    pub fn build(self) -> Mediator {
        let pipeline = self.pipeline.build();

        tracing::debug!(
            services = self.container.len(),
            behaviors = ?pipeline.behavior_names(),
            "mediator built"
        );

        Mediator::new(
            Arc::new(self.container),
            Arc::new(HandlerRegistry::new()),
            pipeline,
            NotificationPublisher::new(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conduit_core::fixtures::{
        AddCommand, AddCommandHandler, EchoQuery, EchoQueryHandler, RecordingHandler,
        UserCreated,
    };
    use conduit_core::Contract;
    use conduit_pipeline::FnBehavior;
    use std::time::Duration;

    #[test]
    fn test_builder_registers_handlers() {
        let log = RecordingHandler::log();
        let builder = MediatorBuilder::new()
            .command_handler::<AddCommand, _>(AddCommandHandler)
            .query_handler::<EchoQuery, _>(EchoQueryHandler::default())
            .notification_handler::<UserCreated, _>(RecordingHandler::new("a", &log))
            .notification_handler::<UserCreated, _>(RecordingHandler::new("b", &log));

        let container = builder.container();
        assert!(container.contains(&Contract::request::<AddCommand>()));
        assert!(container.contains(&Contract::request::<EchoQuery>()));
        assert_eq!(container.registrations(&Contract::notification::<UserCreated>()), 2);
    }

    #[test]
    fn test_with_config_defaults() {
        let mediator = MediatorBuilder::new()
            .with_config(&PipelineConfig::default())
            .build();

        assert_eq!(mediator.pipeline().behavior_names(), vec!["tracing"]);
    }

    #[test]
    fn test_with_config_all_builtins() {
        let config = PipelineConfig {
            tracing: true,
            metrics: true,
            timeout_ms: Some(100),
        };

        let mediator = MediatorBuilder::new()
            .behavior(FnBehavior::new("audit", |_request, next, _cancel| next.run()))
            .with_config(&config)
            .build();

        assert_eq!(
            mediator.pipeline().behavior_names(),
            vec!["tracing", "metrics", "timeout", "audit"]
        );
    }

    #[test]
    fn test_with_config_nothing_enabled() {
        let config = PipelineConfig {
            tracing: false,
            metrics: false,
            timeout_ms: None,
        };

        let mediator = MediatorBuilder::new().with_config(&config).build();
        assert!(mediator.pipeline().is_empty());
    }

    #[test]
    fn test_timeout_overrides_config() {
        let config = PipelineConfig {
            timeout_ms: Some(100),
            ..Default::default()
        };

        let mediator = MediatorBuilder::new()
            .with_config(&config)
            .timeout(Duration::from_secs(1))
            .build();

        assert_eq!(mediator.pipeline().len(), 2);
    }
}
