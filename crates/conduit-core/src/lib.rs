//! # Conduit Core
//!
//! Core types and traits for the Conduit mediator.
//!
//! This crate provides the foundational types used throughout Conduit:
//!
//! - [`Request`], [`Command`], [`Query`], [`Notification`] - Message traits
//! - [`CommandHandler`], [`QueryHandler`], [`NotificationHandler`] - Handler contracts
//! - [`Contract`] - Descriptor of a handler contract, the lookup key
//! - [`di::ServiceProvider`] - The handler-lookup capability, and [`di::Container`]
//! - [`CancellationToken`] - Cooperative cancellation
//! - [`DispatchError`] - Standard error type

#![doc(html_root_url = "https://docs.rs/conduit-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod cancel;
mod contract;
pub mod di;
mod error;
pub mod fixtures;
mod handler;
mod message;

use std::future::Future;
use std::pin::Pin;

pub use cancel::CancellationToken;
pub use contract::{Contract, HandlerFamily};
pub use error::{DispatchError, DispatchResult};
pub use handler::{CommandHandler, NotificationHandler, QueryHandler};
pub use message::{Command, CommandKind, Notification, Query, QueryKind, Request, RequestKind};

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
