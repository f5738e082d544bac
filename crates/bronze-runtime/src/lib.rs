//! Bronze Runtime - orchestration layer for the Bronze chat-protocol bridge.
//!
//! This crate provides:
//! - Runtime orchestration ([`BronzeRuntime`])
//! - Layered configuration loading ([`ConfigLoader`])
//! - Logging configuration ([`LoggingBuilder`])
//! - Automatic transport capability initialization
//!
//! # Automatic Transport Initialization
//!
//! The runtime initializes every transport capability enabled through cargo
//! features:
//!
//! - `ws-client`: WebSocket client capability
//! - `http-client`: HTTP client capability
//!
//! ```rust,ignore
//! use bronze_runtime::BronzeRuntime;
//! use bronze_adapter_telegram::TelegramAdapter;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let runtime = BronzeRuntime::new();
//!     runtime.register_adapter::<TelegramAdapter>().await?;
//!     runtime.run().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;

pub use config::{BronzeConfig, ConfigError, ConfigLoader, ConfigResult, LoggingConfig};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use runtime::{BronzeRuntime, RuntimeBuilder};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Logging macros.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
