//! Message traits: requests, commands, queries and notifications.
//!
//! A request names its response type and its kind. The kind decides which
//! handler-contract family resolves it:
//!
//! ```
//! use conduit_core::{CommandKind, QueryKind, Request};
//!
//! struct CreateUser { name: String }
//! impl Request for CreateUser {
//!     type Response = u64;
//!     type Kind = CommandKind;
//! }
//!
//! struct GetUserName { id: u64 }
//! impl Request for GetUserName {
//!     type Response = Option<String>;
//!     type Kind = QueryKind;
//! }
//! ```
//!
//! [`Command`] and [`Query`] are implemented automatically from the kind, so
//! handler traits can bound on them directly.

use crate::cancel::CancellationToken;
use crate::contract::HandlerFamily;
use crate::di::Service;
use crate::error::DispatchResult;
use crate::handler::{CommandHandler, QueryHandler};
use crate::BoxFuture;
use std::sync::Arc;

/// A request answered by exactly one handler.
///
/// Requests are shared by reference with every behavior in the pipeline and
/// with the handler, hence the `Sync` bound.
pub trait Request: Send + Sync + 'static {
    /// The response produced by the handler.
    type Response: Send + 'static;

    /// [`CommandKind`] or [`QueryKind`].
    type Kind: RequestKind;
}

/// Marker for state-mutating requests.
#[derive(Debug)]
pub enum CommandKind {}

/// Marker for read-only requests.
#[derive(Debug)]
pub enum QueryKind {}

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::CommandKind {}
    impl Sealed for super::QueryKind {}
}

/// The kind of a request. Sealed: only [`CommandKind`] and [`QueryKind`].
pub trait RequestKind: sealed::Sealed + Send + Sync + 'static {
    /// The handler family requests of this kind resolve through.
    const FAMILY: HandlerFamily;

    /// Calls the resolved handler service for `request`.
    ///
    /// Returns `None` when `service` is not a handler of this family for `R`.
    #[doc(hidden)]
    fn handle<'a, R>(
        service: Service,
        request: &'a R,
        cancel: &'a CancellationToken,
    ) -> Option<BoxFuture<'a, DispatchResult<R::Response>>>
    where
        R: Request<Kind = Self>;
}

impl RequestKind for CommandKind {
    const FAMILY: HandlerFamily = HandlerFamily::Command;

    fn handle<'a, R>(
        service: Service,
        request: &'a R,
        cancel: &'a CancellationToken,
    ) -> Option<BoxFuture<'a, DispatchResult<R::Response>>>
    where
        R: Request<Kind = Self>,
    {
        let handler = service.downcast::<Arc<dyn CommandHandler<R>>>().ok()?;
        Some(Box::pin(async move { handler.handle(request, cancel).await }))
    }
}

impl RequestKind for QueryKind {
    const FAMILY: HandlerFamily = HandlerFamily::Query;

    fn handle<'a, R>(
        service: Service,
        request: &'a R,
        cancel: &'a CancellationToken,
    ) -> Option<BoxFuture<'a, DispatchResult<R::Response>>>
    where
        R: Request<Kind = Self>,
    {
        let handler = service.downcast::<Arc<dyn QueryHandler<R>>>().ok()?;
        Some(Box::pin(async move { handler.handle(request, cancel).await }))
    }
}

/// A request that mutates state.
pub trait Command: Request<Kind = CommandKind> {}

impl<T> Command for T where T: Request<Kind = CommandKind> {}

/// A request that reads state.
pub trait Query: Request<Kind = QueryKind> {}

impl<T> Query for T where T: Request<Kind = QueryKind> {}

/// A broadcast event with zero or more handlers and no response.
pub trait Notification: Send + Sync + 'static {}
