//! Main configuration types.
//!
//! This module provides the top-level [`ConduitConfig`] struct and its builder.

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, LogFormat, PipelineConfig, TelemetrySection};

/// Complete mediator configuration.
///
/// This is the root configuration type that contains all configuration sections.
/// Use [`ConfigLoader`](crate::ConfigLoader) to load configuration from files
/// and environment variables.
///
/// # Example
///
/// ```
/// use conduit_config::ConduitConfig;
///
/// let config = ConduitConfig::default();
/// assert!(config.pipeline.tracing);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct ConduitConfig {
    /// Built-in pipeline behaviors.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Telemetry configuration (logging, metrics).
    #[serde(default)]
    pub telemetry: TelemetrySection,
}

impl ConduitConfig {
    /// Create a new configuration builder.
    ///
    /// # Example
    ///
    /// ```
    /// use conduit_config::{ConduitConfig, PipelineConfig};
    ///
    /// let config = ConduitConfig::builder()
    ///     .pipeline(PipelineConfig {
    ///         timeout_ms: Some(500),
    ///         ..Default::default()
    ///     })
    ///     .build();
    ///
    /// assert_eq!(config.pipeline.timeout_ms, Some(500));
    /// ```
    #[must_use]
    pub fn builder() -> ConduitConfigBuilder {
        ConduitConfigBuilder::new()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if:
    /// - `pipeline.timeout_ms` is zero
    /// - the service name or log level is empty
    /// - the metrics listen address is not a socket address
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pipeline.timeout_ms == Some(0) {
            return Err(ConfigError::invalid_value(
                "pipeline.timeout_ms",
                "must be greater than zero",
            ));
        }

        if self.telemetry.service_name.trim().is_empty() {
            return Err(ConfigError::missing_field("telemetry.service_name"));
        }

        if self.telemetry.logging.enabled && self.telemetry.logging.level.trim().is_empty() {
            return Err(ConfigError::missing_field("telemetry.logging.level"));
        }

        if let Some(addr) = &self.telemetry.metrics.listen_addr {
            if addr.parse::<SocketAddr>().is_err() {
                return Err(ConfigError::invalid_value(
                    "telemetry.metrics.listen_addr",
                    format!("invalid socket address: {addr}"),
                ));
            }
        }

        Ok(())
    }

    /// Create a development configuration preset.
    ///
    /// Pretty debug logs with span events; metrics off; no deadline.
    ///
    /// # Example
    ///
    /// ```
    /// use conduit_config::ConduitConfig;
    ///
    /// let config = ConduitConfig::development();
    /// assert_eq!(config.telemetry.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();

        config.telemetry.logging.level = "debug".to_string();
        config.telemetry.logging.format = LogFormat::Pretty;
        config.telemetry.logging.span_events = true;
        config.telemetry.logging.include_location = true;
        config.telemetry.environment = "development".to_string();

        config.pipeline.tracing = true;
        config.pipeline.metrics = false;
        config.pipeline.timeout_ms = None;

        config
    }

    /// Create a production configuration preset.
    ///
    /// JSON info logs, metrics recorded, and a 30 second dispatch deadline.
    ///
    /// # Example
    ///
    /// ```
    /// use conduit_config::{ConduitConfig, LogFormat};
    ///
    /// let config = ConduitConfig::production();
    /// assert_eq!(config.telemetry.logging.format, LogFormat::Json);
    /// assert!(config.pipeline.metrics);
    /// ```
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();

        config.telemetry.logging.level = "info".to_string();
        config.telemetry.logging.format = LogFormat::Json;
        config.telemetry.logging.span_events = false;
        config.telemetry.environment = "production".to_string();
        config.telemetry.metrics.enabled = true;

        config.pipeline.tracing = true;
        config.pipeline.metrics = true;
        config.pipeline.timeout_ms = Some(30_000);

        config
    }
}

/// Builder for [`ConduitConfig`].
#[derive(Debug, Default)]
pub struct ConduitConfigBuilder {
    pipeline: Option<PipelineConfig>,
    telemetry: Option<TelemetrySection>,
}

impl ConduitConfigBuilder {
    /// Create a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the pipeline configuration.
    #[must_use]
    pub fn pipeline(mut self, pipeline: PipelineConfig) -> Self {
        self.pipeline = Some(pipeline);
        self
    }

    /// Set the telemetry configuration.
    #[must_use]
    pub fn telemetry(mut self, telemetry: TelemetrySection) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Build the configuration.
    ///
    /// Any unset sections will use their default values.
    #[must_use]
    pub fn build(self) -> ConduitConfig {
        ConduitConfig {
            pipeline: self.pipeline.unwrap_or_default(),
            telemetry: self.telemetry.unwrap_or_default(),
        }
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if validation fails.
    pub fn build_validated(self) -> Result<ConduitConfig, ConfigError> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }
}
