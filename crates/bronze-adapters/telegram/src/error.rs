//! Encoder error types.

use bronze_core::{AdapterError, ApiError, MediaKind};
use thiserror::Error;

/// Errors raised while sending a document.
///
/// A failed call aborts the traversal. Results already reported stay valid.
#[derive(Debug, Clone, Error)]
pub enum EncodeError {
    /// The Bot API rejected or failed a call.
    #[error("API call failed: {0}")]
    Api(#[from] ApiError),

    /// A media reference could not be fetched.
    #[error("failed to fetch asset {url}: {reason}")]
    Asset {
        /// Media URL.
        url: String,
        /// Failure reason.
        reason: String,
    },

    /// No endpoint accepts this media.
    #[error("unsupported media: {kind} ({mime})")]
    UnsupportedMedia {
        /// Media kind.
        kind: MediaKind,
        /// Resolved content type.
        mime: String,
    },
}

impl From<EncodeError> for AdapterError {
    fn from(err: EncodeError) -> Self {
        match err {
            EncodeError::Api(e) => AdapterError::Api(e),
            other => AdapterError::Internal(other.to_string()),
        }
    }
}
