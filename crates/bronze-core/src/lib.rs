//! # Bronze Core
//!
//! Shared building blocks for the Bronze chat-protocol bridge.
//!
//! Bronze translates platform-native protocol exchanges (a push-based gateway,
//! a request/response bot API) to and from one normalized model. This crate
//! holds everything the adapters and the runtime agree on.
//!
//! ## Architecture Layers
//!
//! ### Foundation Layer
//!
//! - **Errors**: [`TransportError`], [`AdapterError`], [`ApiError`]
//! - **Documents**: the outbound element tree ([`Element`], [`Media`])
//! - **Sessions**: the normalized message record ([`Session`])
//!
//! ### Integration Layer
//!
//! - **Adapter System**: protocol implementations ([`Adapter`], [`AdapterContext`])
//! - **Capabilities**: transport features discovered at runtime ([`TransportContext`])
//! - **Host**: where adapters deliver lifecycle signals and events ([`Host`], [`HostBus`])
//!
//! ```text
//! ┌─────────────┐  frames   ┌────────────┐  sessions  ┌──────────┐
//! │  Transport  │──────────▶│  Adapter   │───────────▶│   Host   │
//! │ (ws / http) │◀──────────│ (Discord…) │◀───────────│ (runtime)│
//! └─────────────┘   calls   └────────────┘ documents  └──────────┘
//! ```

pub mod foundation;
pub mod integration;

pub use foundation::{
    AdapterError, AdapterResult, ApiError, ApiResult, Element, Media, MediaKind, Session,
    SessionKind, Style, TransportError, TransportResult,
};

pub use integration::{
    Adapter, AdapterContext, BoxedAdapter, BoxedConnectionHandler, BoxedHost, ClientConfig,
    ConfigurableAdapter, ConnectionHandle, ConnectionHandler, ConnectionInfo, Download,
    EndpointResolver, FormPart, FormValue, Host, HostBus, HostEvent, HttpBody,
    HttpClientCapability, HttpMethod, HttpRequest, TransportContext, WsClientCapability,
};

/// Prelude for common imports.
pub mod prelude {
    pub use super::foundation::*;
    pub use super::integration::{Adapter, AdapterContext, Host};
}
