//! Foundation layer - Core abstractions and type system.
//!
//! This module contains the fundamental building blocks of Bronze:
//! - Error types shared by transports and adapters
//! - The outbound document model
//! - The normalized session record produced by adapters

pub mod error;
pub mod message;
pub mod session;

pub use error::{
    AdapterError, AdapterResult, ApiError, ApiResult, TransportError, TransportResult,
};
pub use message::{Element, Media, MediaKind, Style};
pub use session::{Session, SessionKind};
