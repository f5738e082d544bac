//! Configuration schema definitions.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use figment::value::Value;
use serde::{Deserialize, Serialize};

/// Root configuration structure.
///
/// ```yaml
/// logging:
///   level: debug
///   filters:
///     bronze_transport: info
/// adapters:
///   discord:
///     token: "..."
///   telegram:
///     token: "..."
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BronzeConfig {
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Per-adapter settings, keyed by adapter name.
    ///
    /// Each section is deserialized by the runtime into the adapter's own
    /// config type when the adapter is registered.
    #[serde(default)]
    pub adapters: HashMap<String, Value>,
}

// =============================================================================
// Logging
// =============================================================================

/// Log verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Returns the level as a filter directive.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Converts to a `tracing` level.
    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    #[cfg(feature = "json-log")]
    Json,
}

/// Log destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    File,
}

/// Which span lifecycle events are logged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpanEventConfig {
    pub new: bool,
    pub enter: bool,
    pub exit: bool,
    pub close: bool,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Base level; `RUST_LOG` takes precedence when set.
    pub level: LogLevel,

    /// Line format.
    pub format: LogFormat,

    /// Destination.
    pub output: LogOutput,

    /// Span lifecycle events.
    pub span_events: SpanEventConfig,

    /// Include thread ids.
    pub thread_ids: bool,

    /// Include source file and line.
    pub file_location: bool,

    /// Log file, for `output: file`.
    pub file_path: Option<PathBuf>,

    /// Per-module levels, e.g. `bronze_transport: debug`.
    pub filters: HashMap<String, LogLevel>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Compact,
            output: LogOutput::Stdout,
            span_events: SpanEventConfig::default(),
            thread_ids: false,
            file_location: false,
            file_path: None,
            filters: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Figment;
    use figment::providers::Serialized;

    #[test]
    fn test_logging_defaults() {
        let config = BronzeConfig::default();
        assert_eq!(config.logging.level, LogLevel::Info);
        assert_eq!(config.logging.output, LogOutput::Stdout);
        assert!(config.adapters.is_empty());
    }

    #[test]
    fn test_extract_adapter_sections() {
        let config: BronzeConfig = Figment::new()
            .merge(Serialized::default("logging.level", "debug"))
            .merge(Serialized::default("logging.filters.bronze_transport", "warn"))
            .merge(Serialized::default("adapters.telegram.token", "123:abc"))
            .extract()
            .unwrap();

        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(
            config.logging.filters.get("bronze_transport"),
            Some(&LogLevel::Warn)
        );

        let telegram = config.adapters.get("telegram").unwrap();
        let token: String = telegram.find_ref("token").unwrap().deserialize().unwrap();
        assert_eq!(token, "123:abc");
    }
}
