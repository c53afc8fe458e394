//! Typed configuration for the Conduit mediator.
//!
//! This crate provides a strongly-typed configuration system with support for:
//! - TOML and JSON configuration files
//! - Environment variable overrides
//! - Strict validation (fails on unknown fields)
//! - Layered configuration (defaults → file → env)
//!
//! # Overview
//!
//! [`ConduitConfig`] has two sections:
//!
//! - [`PipelineConfig`] - which built-in behaviors wrap every dispatch
//! - [`TelemetrySection`] - logging and metrics exporter settings
//!
//! # Example
//!
//! ```no_run
//! use conduit_config::ConfigLoader;
//!
//! # fn main() -> Result<(), conduit_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_defaults()
//!     .with_optional_file("conduit.toml")?
//!     .with_env_prefix("CONDUIT")
//!     .load()?;
//!
//! println!("dispatch deadline: {:?}", config.pipeline.timeout());
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [pipeline]
//! tracing = true
//! metrics = true
//! timeout_ms = 5000
//!
//! [telemetry]
//! service_name = "orders"
//! environment = "production"
//!
//! [telemetry.logging]
//! level = "info"
//! format = "json"
//!
//! [telemetry.metrics]
//! enabled = true
//! listen_addr = "0.0.0.0:9090"
//! ```
//!
//! # Environment Variable Overrides
//!
//! Values can be overridden via environment variables using the format
//! `PREFIX__SECTION__KEY`. For example:
//!
//! - `CONDUIT__PIPELINE__TIMEOUT_MS=250`
//! - `CONDUIT__TELEMETRY__LOGGING__LEVEL=debug`
//! - `CONDUIT__TELEMETRY__METRICS__ENABLED=false`

#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::*;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::*;
