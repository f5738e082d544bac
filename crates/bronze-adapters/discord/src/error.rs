//! Gateway error types.
//!
//! None of these are fatal to the adapter. Each one resolves to a dropped
//! frame or a closed socket, after which the transport's reconnect policy
//! takes over.

use bronze_core::{AdapterError, TransportError};
use thiserror::Error;

/// Errors raised by the gateway session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// An inbound frame could not be decoded.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    /// The gateway invalidated the session and it cannot be resumed.
    #[error("session invalidated")]
    SessionInvalidated,

    /// The gateway asked the client to reconnect.
    #[error("gateway requested reconnect")]
    RemoteReconnectRequested,

    /// The underlying transport failed.
    #[error("transport failure: {0}")]
    TransportFailure(String),

    /// A connect was attempted while a socket is still open.
    #[error("transport still open")]
    TransportStillOpen,

    /// The gateway endpoint could not be discovered.
    #[error("gateway discovery failed: {0}")]
    Discovery(String),
}

impl From<TransportError> for GatewayError {
    fn from(err: TransportError) -> Self {
        Self::TransportFailure(err.to_string())
    }
}

impl From<GatewayError> for AdapterError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::MalformedFrame(reason) => AdapterError::ParseError { reason },
            other => AdapterError::Internal(other.to_string()),
        }
    }
}

impl From<GatewayError> for TransportError {
    fn from(err: GatewayError) -> Self {
        TransportError::Resolve(err.to_string())
    }
}
