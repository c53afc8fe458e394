//! # Conduit Pipeline
//!
//! Behavior chain executor for the Conduit mediator.
//!
//! Every request dispatched through the mediator flows through an ordered
//! list of [`Behavior`]s before reaching its handler. The first registered
//! behavior is the outermost wrapper:
//!
//! ```text
//! send → Behavior 1 → Behavior 2 → … → Handler
//!                                        ↓
//! resp ← Behavior 1 ← Behavior 2 ← … ←───┘
//! ```
//!
//! Each behavior may pass the request through, transform the response,
//! short-circuit without calling the handler, or run the rest of the chain
//! more than once.
//!
//! ## Key Features
//!
//! - **Immutable**: the behavior list is fixed once the pipeline is built
//! - **Shared**: one pipeline serves all concurrent dispatches
//! - **Cancellable**: the chain stops at the next stage once the token fires
//! - **Built-ins**: optional tracing, metrics and timeout stages
//!
//! ## Example
//!
//! ```
//! use conduit_pipeline::{PipelineExecutor, Stage};
//!
//! let pipeline = PipelineExecutor::builder().metrics().tracing().build();
//! assert_eq!(pipeline.behavior_names(), vec!["tracing", "metrics"]);
//! assert_eq!(Stage::all()[0].name(), "tracing");
//! ```

#![doc(html_root_url = "https://docs.rs/conduit-pipeline/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod behavior;
pub mod pipeline;
pub mod stages;

// Re-export main types at crate root
pub use behavior::{AnyResponse, Behavior, BoxedBehavior, FnBehavior, Next, RequestEnvelope, Terminal};
pub use pipeline::{PipelineBuilder, PipelineExecutor, Stage};
pub use stages::{MetricsBehavior, TimeoutBehavior, TracingBehavior};
