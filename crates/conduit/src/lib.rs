//! # Conduit
//!
//! **In-process mediator for commands, queries and notifications**
//!
//! Conduit decouples the code that issues a request from the code that
//! handles it:
//!
//! - **Commands and queries** go to exactly one handler through `send`
//! - **Notifications** fan out to every registered handler through `publish`
//! - **Behaviors** wrap every `send` in an ordered pipeline (logging,
//!   metrics, deadlines, retries, caching, …)
//! - **Cancellation** is cooperative and observed at every stage boundary
//!
//! ## Quick Start
//!
//! ```
//! use conduit::prelude::*;
//!
//! struct Greet(String);
//!
//! impl Request for Greet {
//!     type Response = String;
//!     type Kind = QueryKind;
//! }
//!
//! struct GreetHandler;
//!
//! impl QueryHandler<Greet> for GreetHandler {
//!     fn handle<'a>(
//!         &'a self,
//!         query: &'a Greet,
//!         _cancel: &'a CancellationToken,
//!     ) -> BoxFuture<'a, DispatchResult<String>> {
//!         Box::pin(async move { Ok(format!("hello, {}", query.0)) })
//!     }
//! }
//!
//! # tokio_test::block_on(async {
//! let mediator = Mediator::builder()
//!     .query_handler::<Greet, _>(GreetHandler)
//!     .tracing()
//!     .build();
//!
//! let greeting = mediator.send(Greet("ada".into())).await.unwrap();
//! assert_eq!(greeting, "hello, ada");
//! # });
//! ```
//!
//! ## Architecture
//!
//! ```text
//! send → Tracing → Metrics → Timeout → user behaviors → Handler
//!                                                          ↓
//! resp ← Tracing ← Metrics ← Timeout ← user behaviors ←────┘
//! ```
//!
//! Built-in behaviors are optional and always run ahead of user behaviors.

#![doc(html_root_url = "https://docs.rs/conduit/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use conduit_core as core;

// Re-export pipeline types
pub use conduit_pipeline as pipeline;

// Re-export mediator types
pub use conduit_mediator as mediator;

// Re-export configuration types
pub use conduit_config as config;

// Re-export telemetry setup
pub use conduit_telemetry as telemetry;

use conduit_config::ConduitConfig;
use conduit_mediator::MediatorBuilder;
use conduit_telemetry::{init_telemetry, TelemetryConfig};

/// Errors raised while bootstrapping from configuration.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration failed to load or validate.
    #[error(transparent)]
    Config(#[from] conduit_config::ConfigError),

    /// Logging or metrics could not be installed.
    #[error(transparent)]
    Telemetry(#[from] conduit_telemetry::TelemetryError),
}

/// Validates `config`, installs telemetry and returns a builder with the
/// configured built-in behaviors.
///
/// Call once per process; logging and metrics are global.
///
/// # Errors
///
/// Returns [`Error::Config`] for an invalid configuration and
/// [`Error::Telemetry`] if logging or metrics cannot be installed.
///
/// # Example
///
/// ```no_run
/// use conduit::config::ConfigLoader;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ConfigLoader::new()
///     .with_optional_file("conduit.toml")?
///     .with_env_prefix("CONDUIT")
///     .load()?;
///
/// let mediator = conduit::bootstrap(&config)?.build();
/// # Ok(())
/// # }
/// ```
pub fn bootstrap(config: &ConduitConfig) -> Result<MediatorBuilder, Error> {
    config.validate()?;
    init_telemetry(&TelemetryConfig::from(&config.telemetry))?;
    Ok(MediatorBuilder::new().with_config(&config.pipeline))
}

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use conduit::prelude::*;
/// ```
pub mod prelude {
    pub use conduit_core::{
        BoxFuture, CancellationToken, Command, CommandHandler, CommandKind, DispatchError,
        DispatchResult, Notification, NotificationHandler, Query, QueryHandler, QueryKind,
        Request,
    };

    // Re-export DI types
    pub use conduit_core::di::{Container, ServiceProvider};

    // Re-export pipeline types
    pub use conduit_pipeline::{AnyResponse, Behavior, FnBehavior, Next, RequestEnvelope};

    // Re-export mediator types
    pub use conduit_mediator::{Mediator, MediatorBuilder};

    // Re-export configuration types
    pub use conduit_config::{ConduitConfig, ConfigLoader, PipelineConfig};
}
