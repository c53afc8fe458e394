//! Configuration schema types.
//!
//! This module defines the structure of all configuration sections.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Pipeline configuration section.
///
/// Selects which built-in behaviors wrap every `send`. User behaviors are
/// registered in code and are not configurable here.
///
/// # Example
///
/// ```
/// use conduit_config::PipelineConfig;
///
/// let config = PipelineConfig {
///     tracing: true,
///     metrics: true,
///     timeout_ms: Some(250),
/// };
/// assert_eq!(config.timeout().unwrap().as_millis(), 250);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Open a tracing span around every dispatch.
    #[serde(default = "default_true")]
    pub tracing: bool,

    /// Record request counters and latency histograms.
    #[serde(default)]
    pub metrics: bool,

    /// Per-dispatch deadline in milliseconds. None disables the deadline.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl PipelineConfig {
    /// Returns the dispatch deadline, if one is configured.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            tracing: true,
            metrics: false,
            timeout_ms: None,
        }
    }
}

/// Log format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON formatted logs (production).
    #[default]
    Json,
    /// Human-readable pretty format (development).
    Pretty,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log level or filter directive (e.g. "info", "conduit_mediator=debug").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Emit span open and close events.
    #[serde(default)]
    pub span_events: bool,

    /// Include source file and line in logs.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            span_events: false,
            include_location: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Metrics exporter configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    /// Install the Prometheus recorder.
    #[serde(default)]
    pub enabled: bool,

    /// Address of the scrape endpoint. None installs the recorder without
    /// an HTTP listener.
    #[serde(default)]
    pub listen_addr: Option<String>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: None,
        }
    }
}

/// Telemetry configuration section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TelemetrySection {
    /// Service name attached to log records.
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Deployment environment (e.g., "development", "production").
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Metrics configuration.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl Default for TelemetrySection {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            environment: default_environment(),
            logging: LoggingConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

fn default_service_name() -> String {
    "conduit".to_string()
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_config_default() {
        let config = PipelineConfig::default();
        assert!(config.tracing);
        assert!(!config.metrics);
        assert!(config.timeout().is_none());
    }

    #[test]
    fn test_pipeline_config_deserialize() {
        let toml = r"
            metrics = true
            timeout_ms = 1500
        ";
        let config: PipelineConfig = toml::from_str(toml).unwrap();
        assert!(config.metrics);
        assert_eq!(config.timeout(), Some(Duration::from_millis(1500)));
        // Defaults applied
        assert!(config.tracing);
    }

    #[test]
    fn test_pipeline_config_unknown_field_rejected() {
        let toml = r"
            tracing = true
            retries = 3
        ";
        let result: Result<PipelineConfig, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_logging_config_default() {
        let config = LoggingConfig::default();
        assert!(config.enabled);
        assert_eq!(config.level, "info");
        assert_eq!(config.format, LogFormat::Json);
    }

    #[test]
    fn test_log_format_deserialize() {
        let format: LogFormat = serde_json::from_str(r#""json""#).unwrap();
        assert_eq!(format, LogFormat::Json);

        let format: LogFormat = serde_json::from_str(r#""pretty""#).unwrap();
        assert_eq!(format, LogFormat::Pretty);
    }

    #[test]
    fn test_metrics_config_default() {
        let config = MetricsConfig::default();
        assert!(!config.enabled);
        assert!(config.listen_addr.is_none());
    }

    #[test]
    fn test_telemetry_section_default() {
        let config = TelemetrySection::default();
        assert_eq!(config.service_name, "conduit");
        assert_eq!(config.environment, "development");
    }
}
