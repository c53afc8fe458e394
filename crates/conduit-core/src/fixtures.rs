//! Test fixtures for Conduit development and testing.
//!
//! Ready-made messages and handlers shared by the unit and integration tests
//! of every Conduit crate.
//!
//! # Example
//!
//! ```
//! use conduit_core::fixtures::{AddCommand, EchoQuery};
//!
//! let command = AddCommand::new("OK");
//! assert_eq!(command.message, "OK");
//!
//! let query = EchoQuery::new("hola");
//! assert_eq!(query.message, "hola");
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::cancel::CancellationToken;
use crate::error::{DispatchError, DispatchResult};
use crate::handler::{CommandHandler, NotificationHandler, QueryHandler};
use crate::message::{CommandKind, Notification, QueryKind, Request};
use crate::BoxFuture;

/// A command whose handler returns the message unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddCommand {
    /// The message to echo back.
    pub message: String,
}

impl AddCommand {
    /// Creates the command.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Request for AddCommand {
    type Response = String;
    type Kind = CommandKind;
}

/// Handler for [`AddCommand`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AddCommandHandler;

impl CommandHandler<AddCommand> for AddCommandHandler {
    fn handle<'a>(
        &'a self,
        command: &'a AddCommand,
        _cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, DispatchResult<String>> {
        Box::pin(async move { Ok(command.message.clone()) })
    }
}

/// A query whose handler returns the message unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EchoQuery {
    /// The message to echo back.
    pub message: String,
}

impl EchoQuery {
    /// Creates the query.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Request for EchoQuery {
    type Response = String;
    type Kind = QueryKind;
}

/// Handler for [`EchoQuery`] that counts its invocations.
#[derive(Debug, Clone, Default)]
pub struct EchoQueryHandler {
    calls: Arc<AtomicUsize>,
}

impl EchoQueryHandler {
    /// Creates a handler sharing `calls` as its invocation counter.
    pub fn with_counter(calls: Arc<AtomicUsize>) -> Self {
        Self { calls }
    }

    /// Returns how many times the handler ran.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl QueryHandler<EchoQuery> for EchoQueryHandler {
    fn handle<'a>(
        &'a self,
        query: &'a EchoQuery,
        _cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, DispatchResult<String>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(query.message.clone())
        })
    }
}

/// A command with no response value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TouchCommand;

impl Request for TouchCommand {
    type Response = ();
    type Kind = CommandKind;
}

/// Handler for [`TouchCommand`] that counts its invocations.
#[derive(Debug, Clone, Default)]
pub struct TouchCommandHandler {
    calls: Arc<AtomicUsize>,
}

impl TouchCommandHandler {
    /// Returns how many times the handler ran.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CommandHandler<TouchCommand> for TouchCommandHandler {
    fn handle<'a>(
        &'a self,
        _command: &'a TouchCommand,
        _cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, DispatchResult<()>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }
}

/// A notification carrying a user name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserCreated {
    /// Name of the created user.
    pub name: String,
}

impl UserCreated {
    /// Creates the notification.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Notification for UserCreated {}

/// Shared, ordered log of handler invocations.
pub type InvocationLog = Arc<Mutex<Vec<String>>>;

/// Notification handler that appends `"{label}:{name}"` to a shared log.
#[derive(Debug, Clone)]
pub struct RecordingHandler {
    label: &'static str,
    log: InvocationLog,
}

impl RecordingHandler {
    /// Creates an empty log.
    pub fn log() -> InvocationLog {
        Arc::new(Mutex::new(Vec::new()))
    }

    /// Creates a handler writing to `log`.
    pub fn new(label: &'static str, log: &InvocationLog) -> Self {
        Self {
            label,
            log: Arc::clone(log),
        }
    }
}

impl NotificationHandler<UserCreated> for RecordingHandler {
    fn handle<'a>(
        &'a self,
        notification: &'a UserCreated,
        _cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, DispatchResult<()>> {
        Box::pin(async move {
            tokio::task::yield_now().await;
            self.log
                .lock()
                .push(format!("{}:{}", self.label, notification.name));
            Ok(())
        })
    }
}

/// Notification handler that records its label and then fails.
#[derive(Debug, Clone)]
pub struct FailingHandler {
    label: &'static str,
    log: InvocationLog,
}

impl FailingHandler {
    /// Creates a failing handler writing to `log`.
    pub fn new(label: &'static str, log: &InvocationLog) -> Self {
        Self {
            label,
            log: Arc::clone(log),
        }
    }
}

impl NotificationHandler<UserCreated> for FailingHandler {
    fn handle<'a>(
        &'a self,
        _notification: &'a UserCreated,
        _cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, DispatchResult<()>> {
        Box::pin(async move {
            self.log.lock().push(format!("{}:failed", self.label));
            Err(DispatchError::handler_msg(format!("{} failed", self.label)))
        })
    }
}
