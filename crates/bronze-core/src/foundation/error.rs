//! Unified error types for the Bronze core.
//!
//! Adapter-specific failures (gateway protocol errors, encoder errors) are
//! defined in the adapter crates and convert into these where they cross
//! crate boundaries.

use thiserror::Error;

// =============================================================================
// Transport Errors
// =============================================================================

/// Errors that can occur in transport operations.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Connection failed.
    #[error("connection failed: {url} - {reason}")]
    ConnectionFailed {
        /// The URL that failed to connect.
        url: String,
        /// Reason for failure.
        reason: String,
    },

    /// Connection closed.
    #[error("connection closed: {reason}")]
    ConnectionClosed {
        /// Reason for closure.
        reason: String,
    },

    /// The connect endpoint could not be resolved.
    #[error("endpoint resolution failed: {0}")]
    Resolve(String),

    /// Message send failed.
    #[error("failed to send message: {0}")]
    SendFailed(String),

    /// HTTP request returned a non-success status.
    #[error("HTTP {status}: {body}")]
    Http {
        /// Status code.
        status: u16,
        /// Response body, as text.
        body: String,
    },

    /// Transport not available.
    #[error("transport '{transport}' not available")]
    NotAvailable {
        /// The transport type that's not available.
        transport: &'static str,
    },

    /// Invalid configuration.
    #[error("invalid transport configuration: {0}")]
    InvalidConfig(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

// =============================================================================
// Adapter Errors
// =============================================================================

/// Errors that can occur in adapter operations.
#[derive(Debug, Clone, Error)]
pub enum AdapterError {
    /// Event parsing failed.
    #[error("failed to parse event: {reason}")]
    ParseError {
        /// Reason for failure.
        reason: String,
    },

    /// Adapter configuration is unusable.
    #[error("invalid adapter configuration: {0}")]
    Config(String),

    /// Internal adapter error.
    #[error("adapter error: {0}")]
    Internal(String),

    /// Transport error.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// API error.
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl AdapterError {
    /// Creates an internal adapter error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Creates a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError { reason: msg.into() }
    }

    /// Creates a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

// =============================================================================
// API Errors
// =============================================================================

/// Error type for platform API calls.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The bot is not connected.
    #[error("bot is not connected")]
    NotConnected,
    /// The platform rejected the call.
    #[error("API error ({code}): {message}")]
    Rejected {
        /// Platform error code.
        code: i64,
        /// Platform error description.
        message: String,
    },
    /// Failed to serialize/deserialize.
    #[error("serialization error: {0}")]
    SerializationError(String),
    /// Transport error.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// Other error.
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Result type for adapter operations.
pub type AdapterResult<T> = Result<T, AdapterError>;

/// Result type for API calls.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_converts_into_api_error() {
        let err: ApiError = TransportError::SendFailed("closed".into()).into();
        assert_eq!(err.to_string(), "failed to send message: closed");
    }

    #[test]
    fn test_serde_error_converts_into_api_error() {
        let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: ApiError = parse.into();
        assert!(matches!(err, ApiError::SerializationError(_)));
    }
}
