//! Cooperative cancellation.
//!
//! A [`CancellationToken`] threads through every dispatch stage. Cancelling it
//! makes in-flight chains and fan-outs stop at the next stage boundary and
//! surface [`DispatchError::Cancelled`](crate::DispatchError::Cancelled).
//!
//! # Example
//!
//! ```rust
//! use conduit_core::CancellationToken;
//!
//! let token = CancellationToken::new();
//! let clone = token.clone();
//!
//! clone.cancel();
//! assert!(token.is_cancelled());
//! ```

use std::sync::Arc;

use tokio::sync::watch;

use crate::error::{DispatchError, DispatchResult};

/// A cloneable cancellation signal.
///
/// All clones observe the same state. Cancelling is idempotent.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    sender: Arc<watch::Sender<bool>>,
}

impl CancellationToken {
    /// Creates a token that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Cancels the token and wakes every waiter.
    pub fn cancel(&self) {
        self.sender.send_if_modified(|cancelled| {
            if *cancelled {
                false
            } else {
                *cancelled = true;
                true
            }
        });
    }

    /// Returns `true` once [`cancel`](Self::cancel) has been called on any clone.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }

    /// Returns `Err(DispatchError::Cancelled)` if the token is cancelled.
    ///
    /// Handlers doing long work can call this between steps.
    pub fn check(&self) -> DispatchResult<()> {
        if self.is_cancelled() {
            Err(DispatchError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Completes when the token is cancelled.
    ///
    /// Completes immediately if the token is already cancelled.
    pub async fn cancelled(&self) {
        let mut receiver = self.sender.subscribe();
        // The sender lives as long as `self`, so this only returns once cancelled
        let _ = receiver.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}
