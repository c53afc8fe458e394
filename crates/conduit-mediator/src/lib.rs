//! # Conduit Mediator
//!
//! In-process request dispatch for Conduit.
//!
//! A [`Mediator`] decouples the code that issues a request from the code that
//! handles it. Callers hand it a command, query or notification; the mediator
//! finds the handler, runs the behavior pipeline around it and returns the
//! typed response.
//!
//! ```text
//!                 ┌──────────────────────────────────────────────┐
//! send(request) → │ HandlerRegistry → PipelineExecutor → handler │ → response
//!                 └──────────────────────────────────────────────┘
//!                 ┌──────────────────────────────────────────────┐
//! publish(event) →│ NotificationPublisher → handler 1, 2, …, n   │ → ()
//!                 └──────────────────────────────────────────────┘
//! ```
//!
//! ## Parts
//!
//! - [`HandlerRegistry`]: caches one type-erased invoker per request type
//! - [`NotificationPublisher`]: sequential fan-out to every notification handler
//! - [`Mediator`]: `send` and `publish`
//! - [`MediatorBuilder`]: handler and behavior registration
//!
//! ## Example
//!
//! ```
//! use conduit_core::fixtures::{AddCommand, AddCommandHandler};
//! use conduit_mediator::MediatorBuilder;
//!
//! # tokio_test::block_on(async {
//! let mediator = MediatorBuilder::new()
//!     .command_handler::<AddCommand, _>(AddCommandHandler)
//!     .tracing()
//!     .build();
//!
//! assert_eq!(mediator.send(AddCommand::new("OK")).await.unwrap(), "OK");
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/conduit-mediator/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod builder;
mod mediator;
mod publisher;
pub mod registry;

pub use builder::MediatorBuilder;
pub use mediator::Mediator;
pub use publisher::NotificationPublisher;
pub use registry::{ErasedInvoker, HandlerRegistry, Invoker};
