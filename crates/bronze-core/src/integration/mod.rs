//! Integration layer - External system interfaces.
//!
//! This module contains interfaces for integrating with external systems:
//! - Adapter system for protocol implementations
//! - Capability-based transport system
//! - The host that receives lifecycle signals, events and sessions

pub mod adapter;
pub mod capability;
pub mod host;

pub use adapter::{Adapter, AdapterContext, BoxedAdapter, ConfigurableAdapter};

pub use capability::{
    // Connection handling
    BoxedConnectionHandler,
    ClientConfig,
    ConnectionHandle,
    ConnectionHandler,
    ConnectionInfo,
    // HTTP request model
    Download,
    EndpointResolver,
    FormPart,
    FormValue,
    HttpBody,
    // Transport capabilities
    HttpClientCapability,
    HttpMethod,
    HttpRequest,
    TransportContext,
    WsClientCapability,
};

pub use host::{BoxedHost, Host, HostBus, HostEvent};
