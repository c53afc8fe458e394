//! Error types for Conduit.
//!
//! This module provides the [`DispatchError`] type, the single error type that
//! flows out of `send` and `publish`.
//!
//! # Taxonomy
//!
//! | Variant | Meaning | Retried |
//! |---|---|---|
//! | `HandlerNotFound` | No handler registered for a request type (configuration error) | never |
//! | `Resolution` | The lookup capability itself failed | never |
//! | `Handler` | A handler or behavior failed | never |
//! | `Cancelled` | The cancellation token fired mid-flight | never |
//! | `Timeout` | A timeout behavior expired | never |
//! | `ResponseTypeMismatch` | A behavior replaced the response with a value of the wrong type | never |
//!
//! The dispatch core never retries, wraps, or logs any of these as application
//! errors. Callers own all recovery policy.

use crate::contract::HandlerFamily;
use std::time::Duration;
use thiserror::Error;

/// Result type alias using [`DispatchError`].
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Errors surfaced by request dispatch and notification publishing.
///
/// Handler failures are carried as [`anyhow::Error`] so that the original
/// error value can be recovered by the caller with
/// [`downcast_ref`](anyhow::Error::downcast_ref).
///
/// # Example
///
/// ```
/// use conduit_core::DispatchError;
///
/// #[derive(Debug, thiserror::Error)]
/// #[error("stock exhausted")]
/// struct OutOfStock;
///
/// let err = DispatchError::handler(OutOfStock);
/// assert!(err.handler_error::<OutOfStock>().is_some());
/// assert_eq!(err.to_string(), "stock exhausted");
/// ```
#[derive(Error, Debug)]
pub enum DispatchError {
    /// No handler is registered for the request type.
    #[error("no {family} handler registered for {request_type}")]
    HandlerNotFound {
        /// Fully qualified name of the request type.
        request_type: &'static str,
        /// Handler family the request was routed to.
        family: HandlerFamily,
    },

    /// The handler-lookup capability failed to resolve a contract.
    #[error("failed to resolve {contract}: {reason}")]
    Resolution {
        /// Display form of the contract being resolved.
        contract: String,
        /// Why resolution failed.
        reason: String,
    },

    /// A handler or behavior returned an error.
    #[error(transparent)]
    Handler(#[from] anyhow::Error),

    /// The dispatch was cancelled.
    #[error("dispatch cancelled")]
    Cancelled,

    /// The dispatch exceeded its time budget.
    #[error("dispatch timed out after {0:?}")]
    Timeout(Duration),

    /// The pipeline produced a response that is not of the expected type.
    #[error("response for {request_type} is not a {expected}")]
    ResponseTypeMismatch {
        /// Fully qualified name of the request type.
        request_type: &'static str,
        /// Fully qualified name of the expected response type.
        expected: &'static str,
    },
}

impl DispatchError {
    /// Creates a handler error from any error value.
    pub fn handler<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Handler(anyhow::Error::new(error))
    }

    /// Creates a handler error from a message.
    pub fn handler_msg(message: impl std::fmt::Display + std::fmt::Debug + Send + Sync + 'static) -> Self {
        Self::Handler(anyhow::Error::msg(message))
    }

    /// Creates a resolution error.
    pub fn resolution(contract: impl ToString, reason: impl Into<String>) -> Self {
        Self::Resolution {
            contract: contract.to_string(),
            reason: reason.into(),
        }
    }

    /// Returns `true` if this error represents cancellation.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns `true` if this is a configuration error (no handler registered).
    #[must_use]
    pub const fn is_handler_not_found(&self) -> bool {
        matches!(self, Self::HandlerNotFound { .. })
    }

    /// Returns the original handler error if it is of type `E`.
    #[must_use]
    pub fn handler_error<E>(&self) -> Option<&E>
    where
        E: std::fmt::Display + std::fmt::Debug + Send + Sync + 'static,
    {
        match self {
            Self::Handler(inner) => inner.downcast_ref::<E>(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("boom")]
    struct Boom;

    #[test]
    fn test_handler_not_found_names_type() {
        let err = DispatchError::HandlerNotFound {
            request_type: "app::CreateUser",
            family: HandlerFamily::Command,
        };
        assert_eq!(
            err.to_string(),
            "no command handler registered for app::CreateUser"
        );
        assert!(err.is_handler_not_found());
        assert!(!err.is_cancelled());
    }

    #[test]
    fn test_handler_error_is_transparent() {
        let err = DispatchError::handler(Boom);
        assert_eq!(err.to_string(), "boom");
        assert!(err.handler_error::<Boom>().is_some());
    }

    #[test]
    fn test_handler_error_from_anyhow() {
        fn fails() -> DispatchResult<()> {
            Err(anyhow::anyhow!("disk full"))?;
            Ok(())
        }

        let err = fails().unwrap_err();
        assert!(matches!(err, DispatchError::Handler(_)));
        assert_eq!(err.to_string(), "disk full");
    }

    #[test]
    fn test_resolution_error() {
        let err = DispatchError::resolution("command handler for Foo", "2 handlers registered");
        assert_eq!(
            err.to_string(),
            "failed to resolve command handler for Foo: 2 handlers registered"
        );
        assert!(err.handler_error::<Boom>().is_none());
    }

    #[test]
    fn test_cancelled_and_timeout() {
        assert!(DispatchError::Cancelled.is_cancelled());
        let err = DispatchError::Timeout(Duration::from_millis(250));
        assert_eq!(err.to_string(), "dispatch timed out after 250ms");
    }
}
