//! Adapter trait and context.
//!
//! This module defines the adapter interface that bridges protocol
//! implementations with the host.
//!
//! # Capability-Based Initialization
//!
//! Adapters use a capability discovery pattern to find and use available transports:
//!
//! ```rust,ignore
//! #[async_trait]
//! impl Adapter for MyAdapter {
//!     fn name() -> &'static str { "my-platform" }
//!
//!     async fn on_start(&self, ctx: &mut AdapterContext) -> AdapterResult<()> {
//!         let ws_client = ctx.transport().ws_client().cloned().ok_or(
//!             TransportError::NotAvailable { transport: "ws-client" },
//!         )?;
//!         let handle = ws_client
//!             .connect(Arc::new("wss://example.com".to_string()), handler, ClientConfig::default())
//!             .await?;
//!         ctx.add_connection(handle);
//!         Ok(())
//!     }
//! }
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::foundation::error::AdapterResult;
use crate::integration::capability::{ConnectionHandle, TransportContext};
use crate::integration::host::BoxedHost;

/// Context provided to adapters during initialization and runtime.
///
/// Provides access to:
/// - Transport capabilities for setting up connections
/// - The host that receives signals, events and sessions
/// - Bookkeeping for the connections an adapter opened
pub struct AdapterContext {
    /// Available transport capabilities.
    transport: TransportContext,
    /// Host receiving everything the adapter produces.
    host: BoxedHost,
    /// Active connection handles.
    connections: HashMap<String, ConnectionHandle>,
}

impl AdapterContext {
    /// Creates a new adapter context.
    pub fn new(transport: TransportContext, host: BoxedHost) -> Self {
        Self {
            transport,
            host,
            connections: HashMap::new(),
        }
    }

    /// Returns a reference to the transport context.
    pub fn transport(&self) -> &TransportContext {
        &self.transport
    }

    /// Returns the host.
    pub fn host(&self) -> &BoxedHost {
        &self.host
    }

    /// Registers a connection handle.
    pub fn add_connection(&mut self, handle: ConnectionHandle) {
        self.connections.insert(handle.id.clone(), handle);
    }

    /// Gets a connection handle by bot ID.
    pub fn get_connection(&self, bot_id: &str) -> Option<&ConnectionHandle> {
        self.connections.get(bot_id)
    }

    /// Shuts down and forgets every registered connection.
    pub fn shutdown_connections(&mut self) {
        for (_, handle) in self.connections.drain() {
            handle.shutdown();
        }
    }
}

/// The core adapter trait.
///
/// Adapters bridge a platform protocol with the host. They are responsible for:
///
/// - Discovering and using available transport capabilities
/// - Creating connection handlers for their connections
/// - Translating platform payloads to and from the normalized model
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Returns the adapter name (e.g., "discord").
    ///
    /// This name is used to:
    /// - Identify the adapter in logs
    /// - Locate the adapter's configuration under `adapters.<name>`
    fn name() -> &'static str
    where
        Self: Sized;

    /// Called when the adapter should start.
    async fn on_start(&self, ctx: &mut AdapterContext) -> AdapterResult<()>;

    /// Called when the adapter is shutting down.
    ///
    /// Connections registered in the context are shut down by the runtime
    /// after this returns.
    async fn on_shutdown(&self, _ctx: &mut AdapterContext) -> AdapterResult<()> {
        Ok(())
    }
}

/// A boxed adapter trait object.
pub type BoxedAdapter = Arc<dyn Adapter>;

/// Trait for adapters that can be created from configuration.
///
/// The runtime deserializes `adapters.<name>` into [`Self::Config`] and calls
/// [`from_config`](Self::from_config).
pub trait ConfigurableAdapter: Adapter {
    /// The configuration type for this adapter.
    type Config: serde::de::DeserializeOwned + Default;

    /// Creates an adapter from its configuration.
    fn from_config(config: Self::Config) -> AdapterResult<Arc<Self>>
    where
        Self: Sized;
}
