//! Handler contracts.
//!
//! Each message family has its own handler trait. Handlers receive the message
//! by reference together with the caller's [`CancellationToken`] and return a
//! boxed future, which keeps them object safe so the lookup capability can
//! hand them out as `Arc<dyn CommandHandler<C>>`.
//!
//! # Example
//!
//! ```
//! use conduit_core::{BoxFuture, CancellationToken, CommandHandler, CommandKind, DispatchResult, Request};
//!
//! struct Rename { name: String }
//! impl Request for Rename {
//!     type Response = String;
//!     type Kind = CommandKind;
//! }
//!
//! struct RenameHandler;
//!
//! impl CommandHandler<Rename> for RenameHandler {
//!     fn handle<'a>(
//!         &'a self,
//!         command: &'a Rename,
//!         _cancel: &'a CancellationToken,
//!     ) -> BoxFuture<'a, DispatchResult<String>> {
//!         Box::pin(async move { Ok(command.name.to_uppercase()) })
//!     }
//! }
//! ```

use crate::cancel::CancellationToken;
use crate::error::DispatchResult;
use crate::message::{Command, Notification, Query};
use crate::BoxFuture;

/// Handles a single command type.
pub trait CommandHandler<C: Command>: Send + Sync + 'static {
    /// Executes the command.
    ///
    /// # Errors
    ///
    /// Any error is propagated to the caller of `send` unchanged.
    fn handle<'a>(
        &'a self,
        command: &'a C,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, DispatchResult<C::Response>>;
}

/// Handles a single query type.
pub trait QueryHandler<Q: Query>: Send + Sync + 'static {
    /// Answers the query.
    ///
    /// # Errors
    ///
    /// Any error is propagated to the caller of `send` unchanged.
    fn handle<'a>(
        &'a self,
        query: &'a Q,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, DispatchResult<Q::Response>>;
}

/// Reacts to a notification.
///
/// Several handlers may be registered for one notification type; they run
/// one after another in registration order.
pub trait NotificationHandler<N: Notification>: Send + Sync + 'static {
    /// Handles the notification.
    ///
    /// # Errors
    ///
    /// An error stops the fan-out: later handlers are not invoked.
    fn handle<'a>(
        &'a self,
        notification: &'a N,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, DispatchResult<()>>;
}
