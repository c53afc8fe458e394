//! Behavior chain executor.
//!
//! A [`PipelineExecutor`] holds the ordered, immutable list of behaviors shared
//! by every request dispatch. Executing it composes the behaviors around a
//! terminal handler call: the first registered behavior is the outermost
//! wrapper, the last one sits directly around the handler.
//!
//! ## Built-in Stages
//!
//! [`PipelineBuilder`] can install the built-in stages ahead of any user
//! behaviors. They always appear in this order:
//!
//! 1. **Tracing** - dispatch span and outcome logs
//! 2. **Metrics** - request counters and latency histogram
//! 3. **Timeout** - per-dispatch deadline
//!
//! Once built, the pipeline cannot be modified.

use crate::behavior::{AnyResponse, Behavior, BoxedBehavior, Next, RequestEnvelope, Terminal};
use crate::stages::{MetricsBehavior, TimeoutBehavior, TracingBehavior};
use conduit_core::{CancellationToken, DispatchError, DispatchResult};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// The ordered behavior chain.
///
/// Cloning is cheap; clones share the behavior list.
///
/// # Example
///
/// ```
/// use conduit_pipeline::{FnBehavior, PipelineExecutor};
///
/// let pipeline = PipelineExecutor::builder()
///     .tracing()
///     .behavior(FnBehavior::new("passthrough", |_request, next, _cancel| next.run()))
///     .build();
///
/// assert_eq!(pipeline.behavior_names(), vec!["tracing", "passthrough"]);
/// ```
#[derive(Clone)]
pub struct PipelineExecutor {
    behaviors: Arc<[BoxedBehavior]>,
}

impl PipelineExecutor {
    /// Creates a pipeline from behaviors in registration order.
    pub fn new(behaviors: impl IntoIterator<Item = BoxedBehavior>) -> Self {
        Self {
            behaviors: behaviors.into_iter().collect(),
        }
    }

    /// Creates a pipeline with no behaviors.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Creates a new pipeline builder.
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Runs `request` through every behavior and finally `terminal`.
    ///
    /// With no behaviors this is exactly one call to `terminal`. The chain is
    /// raced against `cancel`: once the token fires, the pending chain is
    /// dropped and [`DispatchError::Cancelled`] is returned.
    ///
    /// # Errors
    ///
    /// Returns whatever error a behavior or the terminal produces, or
    /// [`DispatchError::Cancelled`].
    pub async fn execute<'a>(
        &'a self,
        request: RequestEnvelope<'a>,
        terminal: &'a Terminal<'a>,
        cancel: &'a CancellationToken,
    ) -> DispatchResult<AnyResponse> {
        let chain = Next::new(&self.behaviors, terminal, request, cancel).run();

        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(DispatchError::Cancelled),
            result = chain => result,
        }
    }

    /// Returns the names of all behaviors in order.
    #[must_use]
    pub fn behavior_names(&self) -> Vec<&'static str> {
        self.behaviors.iter().map(|behavior| behavior.name()).collect()
    }

    /// Returns the number of behaviors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.behaviors.len()
    }

    /// Returns `true` if the pipeline has no behaviors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.behaviors.is_empty()
    }
}

impl Default for PipelineExecutor {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for PipelineExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineExecutor")
            .field("behaviors", &self.behavior_names())
            .finish()
    }
}

/// Builder for constructing a [`PipelineExecutor`].
///
/// Built-in stages are always placed ahead of user behaviors, in [`Stage`]
/// order, regardless of the order the builder methods are called in.
#[derive(Default)]
pub struct PipelineBuilder {
    builtins: Vec<(Stage, BoxedBehavior)>,
    behaviors: Vec<BoxedBehavior>,
}

impl PipelineBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a user behavior.
    #[must_use]
    pub fn behavior<B: Behavior>(self, behavior: B) -> Self {
        self.shared(Arc::new(behavior))
    }

    /// Appends an already shared behavior.
    #[must_use]
    pub fn shared(mut self, behavior: BoxedBehavior) -> Self {
        self.behaviors.push(behavior);
        self
    }

    /// Installs the built-in tracing stage.
    #[must_use]
    pub fn tracing(self) -> Self {
        self.builtin(Stage::Tracing, Arc::new(TracingBehavior::new()))
    }

    /// Installs the built-in metrics stage.
    #[must_use]
    pub fn metrics(self) -> Self {
        self.builtin(Stage::Metrics, Arc::new(MetricsBehavior::new()))
    }

    /// Installs the built-in timeout stage.
    #[must_use]
    pub fn timeout(self, duration: Duration) -> Self {
        self.builtin(Stage::Timeout, Arc::new(TimeoutBehavior::new(duration)))
    }

    fn builtin(mut self, stage: Stage, behavior: BoxedBehavior) -> Self {
        self.builtins.retain(|(existing, _)| *existing != stage);
        self.builtins.push((stage, behavior));
        self
    }

    /// Builds the pipeline.
    #[must_use]
    pub fn build(mut self) -> PipelineExecutor {
        self.builtins.sort_by_key(|(stage, _)| *stage);
        PipelineExecutor::new(
            self.builtins
                .into_iter()
                .map(|(_, behavior)| behavior)
                .chain(self.behaviors),
        )
    }
}

impl fmt::Debug for PipelineBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let builtins: Vec<_> = self.builtins.iter().map(|(stage, _)| stage.name()).collect();
        let behaviors: Vec<_> = self.behaviors.iter().map(|b| b.name()).collect();
        f.debug_struct("PipelineBuilder")
            .field("builtins", &builtins)
            .field("behaviors", &behaviors)
            .finish()
    }
}

/// Built-in stage marker for ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Stage {
    /// Dispatch span and outcome logging
    Tracing = 1,
    /// Request counters and latency
    Metrics = 2,
    /// Per-dispatch deadline
    Timeout = 3,
}

impl Stage {
    /// Returns the stage name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Tracing => "tracing",
            Self::Metrics => "metrics",
            Self::Timeout => "timeout",
        }
    }

    /// Returns all built-in stages in order.
    #[must_use]
    pub const fn all() -> [Self; 3] {
        [Self::Tracing, Self::Metrics, Self::Timeout]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conduit_core::fixtures::AddCommand;
    use conduit_core::BoxFuture;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// A test behavior that records its invocation order.
    struct OrderTrackingBehavior {
        name: &'static str,
        counter: Arc<AtomicUsize>,
        order: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Behavior for OrderTrackingBehavior {
        fn name(&self) -> &'static str {
            self.name
        }

        fn handle<'a>(
            &'a self,
            _request: RequestEnvelope<'a>,
            next: Next<'a>,
            _cancel: &'a CancellationToken,
        ) -> BoxFuture<'a, DispatchResult<AnyResponse>> {
            Box::pin(async move {
                self.counter.fetch_add(1, Ordering::SeqCst);
                self.order.lock().push(self.name);
                next.run().await
            })
        }
    }

    fn tracker(
        name: &'static str,
        counter: &Arc<AtomicUsize>,
        order: &Arc<Mutex<Vec<&'static str>>>,
    ) -> OrderTrackingBehavior {
        OrderTrackingBehavior {
            name,
            counter: Arc::clone(counter),
            order: Arc::clone(order),
        }
    }

    #[tokio::test]
    async fn test_pipeline_executes_in_order() {
        let counter = Arc::new(AtomicUsize::new(0));
        let order = Arc::new(Mutex::new(Vec::new()));

        let pipeline = PipelineExecutor::builder()
            .behavior(tracker("first", &counter, &order))
            .behavior(tracker("second", &counter, &order))
            .behavior(tracker("third", &counter, &order))
            .build();

        let command = AddCommand::new("OK");
        let cancel = CancellationToken::new();
        let terminal = || {
            Box::pin(async { Ok(Box::new("handled".to_string()) as AnyResponse) })
                as BoxFuture<'_, DispatchResult<AnyResponse>>
        };

        let response = pipeline
            .execute(RequestEnvelope::new(&command), &terminal, &cancel)
            .await
            .unwrap();

        assert_eq!(*response.downcast::<String>().unwrap(), "handled");
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert_eq!(*order.lock(), vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_empty_pipeline_calls_terminal_once() {
        let pipeline = PipelineExecutor::empty();
        let calls = AtomicUsize::new(0);

        let command = AddCommand::new("OK");
        let cancel = CancellationToken::new();
        let terminal = || {
            calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async { Ok(Box::new(1_u32) as AnyResponse) })
                as BoxFuture<'_, DispatchResult<AnyResponse>>
        };

        let response = pipeline
            .execute(RequestEnvelope::new(&command), &terminal, &cancel)
            .await
            .unwrap();

        assert_eq!(*response.downcast::<u32>().unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancelled_before_execute() {
        let pipeline = PipelineExecutor::empty();
        let calls = AtomicUsize::new(0);

        let command = AddCommand::new("OK");
        let cancel = CancellationToken::new();
        cancel.cancel();
        let terminal = || {
            calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async { Ok(Box::new(()) as AnyResponse) })
                as BoxFuture<'_, DispatchResult<AnyResponse>>
        };

        let err = pipeline
            .execute(RequestEnvelope::new(&command), &terminal, &cancel)
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_builtins_ordered_ahead_of_user_behaviors() {
        let counter = Arc::new(AtomicUsize::new(0));
        let order = Arc::new(Mutex::new(Vec::new()));

        let pipeline = PipelineExecutor::builder()
            .behavior(tracker("user", &counter, &order))
            .timeout(Duration::from_secs(1))
            .metrics()
            .tracing()
            .build();

        assert_eq!(
            pipeline.behavior_names(),
            vec!["tracing", "metrics", "timeout", "user"]
        );
        assert_eq!(pipeline.len(), 4);
    }

    #[test]
    fn test_builtin_installed_once() {
        let pipeline = PipelineExecutor::builder()
            .timeout(Duration::from_secs(1))
            .timeout(Duration::from_secs(2))
            .build();

        assert_eq!(pipeline.behavior_names(), vec!["timeout"]);
    }

    #[test]
    fn test_stage_ordering() {
        assert!(Stage::Tracing < Stage::Metrics);
        assert!(Stage::Metrics < Stage::Timeout);
        assert_eq!(
            Stage::all().map(Stage::name),
            ["tracing", "metrics", "timeout"]
        );
    }

    #[test]
    fn test_empty() {
        let pipeline = PipelineExecutor::default();
        assert!(pipeline.is_empty());
        assert_eq!(pipeline.len(), 0);
    }
}
