//! Built-in behaviors.
//!
//! These stages are installed through [`PipelineBuilder`](crate::PipelineBuilder)
//! and always run ahead of user behaviors, in this order:
//!
//! 1. [`tracing`] - dispatch span and outcome logs
//! 2. [`metrics`] - request counters and latency
//! 3. [`timeout`] - per-dispatch deadline

pub mod metrics;
pub mod timeout;
pub mod tracing;

// Re-export main types
pub use metrics::MetricsBehavior;
pub use timeout::TimeoutBehavior;
pub use tracing::TracingBehavior;
