//! Configuration module for the Bronze runtime.
//!
//! Configuration is layered with figment: built-in defaults, then a
//! `bronze.toml` / `bronze.yaml` file, then `BRONZE_*` environment variables.
//! Each adapter reads its own section under `adapters.<name>`.

pub mod error;
pub mod loader;
pub mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile};
pub use schema::{BronzeConfig, LogFormat, LogLevel, LogOutput, LoggingConfig, SpanEventConfig};
