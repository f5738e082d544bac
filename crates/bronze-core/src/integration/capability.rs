//! Transport capability system.
//!
//! Adapters do not open sockets or issue HTTP requests themselves. They query
//! the [`TransportContext`] for the capabilities they need and hand them a
//! [`ConnectionHandler`] (for duplex connections) or an [`HttpRequest`]
//! (for request/response APIs).
//!
//! # Connection lifecycle
//!
//! For a client connection the transport calls the handler in this order:
//!
//! ```text
//! on_connect ─▶ on_ready ─▶ on_open ─▶ on_message* ─▶ on_close ─┐
//!                              ▲                                 │ reconnect
//!                              └─────────────────────────────────┘
//!                                            shutdown ─▶ on_close ─▶ on_disconnect
//! ```
//!
//! The connect endpoint is re-resolved through an [`EndpointResolver`] before
//! every attempt, so a protocol can steer reconnects (e.g. to a resume URL).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{Notify, mpsc, watch};

use crate::foundation::error::{TransportError, TransportResult};

// =============================================================================
// Connection Handler
// =============================================================================

/// A handler for connection lifecycle events.
#[async_trait]
pub trait ConnectionHandler: Send + Sync {
    /// Called once, when the first socket of a connection is established.
    ///
    /// Returns a unique bot ID for this connection.
    async fn on_connect(&self, conn_info: ConnectionInfo) -> TransportResult<String>;

    /// Called once, after [`on_connect`](Self::on_connect), with the handle.
    async fn on_ready(&self, _bot_id: &str, _connection: ConnectionHandle) {}

    /// Called every time a socket is opened, including after reconnects.
    async fn on_open(&self, _bot_id: &str) {}

    /// Called when a frame is received.
    async fn on_message(&self, bot_id: &str, data: &[u8]);

    /// Called every time a socket closes, whatever the cause.
    async fn on_close(&self, _bot_id: &str, _reason: &TransportError) {}

    /// Called once, when the connection is given up for good.
    async fn on_disconnect(&self, bot_id: &str);

    /// Called when a connection error occurs.
    async fn on_error(&self, bot_id: &str, error: &str);
}

/// Boxed connection handler.
pub type BoxedConnectionHandler = Arc<dyn ConnectionHandler>;

/// Resolves the URL to use for the next connect attempt.
#[async_trait]
pub trait EndpointResolver: Send + Sync {
    /// Returns the endpoint URL.
    async fn resolve(&self) -> TransportResult<String>;
}

#[async_trait]
impl EndpointResolver for String {
    async fn resolve(&self) -> TransportResult<String> {
        Ok(self.clone())
    }
}

/// Information about a connection.
#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    /// Remote address (if available).
    pub remote_addr: Option<String>,
    /// Connection protocol (ws, http, etc.).
    pub protocol: String,
    /// Additional metadata.
    pub metadata: HashMap<String, String>,
}

impl ConnectionInfo {
    /// Creates new connection info.
    pub fn new(protocol: impl Into<String>) -> Self {
        Self {
            remote_addr: None,
            protocol: protocol.into(),
            metadata: HashMap::new(),
        }
    }

    /// Sets the remote address.
    pub fn with_remote_addr(mut self, addr: impl Into<String>) -> Self {
        self.remote_addr = Some(addr.into());
        self
    }

    /// Adds metadata.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

// =============================================================================
// Transport Capabilities
// =============================================================================

/// WebSocket client capability.
#[async_trait]
pub trait WsClientCapability: Send + Sync {
    /// Connects to a WebSocket server.
    ///
    /// The endpoint is resolved before every attempt. The connection
    /// reconnects according to `config` until shut down.
    async fn connect(
        &self,
        endpoint: Arc<dyn EndpointResolver>,
        handler: BoxedConnectionHandler,
        config: ClientConfig,
    ) -> TransportResult<ConnectionHandle>;
}

/// HTTP client capability.
#[async_trait]
pub trait HttpClientCapability: Send + Sync {
    /// Sends a request and returns the JSON response body.
    ///
    /// Non-success statuses are reported as [`TransportError::Http`].
    async fn request(&self, request: HttpRequest) -> TransportResult<Value>;

    /// Downloads a resource.
    async fn download(&self, url: &str) -> TransportResult<Download>;
}

// =============================================================================
// HTTP Request Model
// =============================================================================

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// GET.
    Get,
    /// POST.
    Post,
}

/// A multipart form value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormValue {
    /// A text field.
    Text(String),
    /// A file field.
    File {
        /// File content.
        data: Vec<u8>,
        /// File name sent to the server.
        filename: String,
        /// Content type.
        mime: String,
    },
}

/// A named multipart form part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormPart {
    /// Field name.
    pub name: String,
    /// Field value.
    pub value: FormValue,
}

impl FormPart {
    /// Creates a text part.
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: FormValue::Text(value.into()),
        }
    }

    /// Creates a file part.
    pub fn file(
        name: impl Into<String>,
        data: Vec<u8>,
        filename: impl Into<String>,
        mime: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            value: FormValue::File {
                data,
                filename: filename.into(),
                mime: mime.into(),
            },
        }
    }
}

/// HTTP request body.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum HttpBody {
    /// No body.
    #[default]
    Empty,
    /// JSON body.
    Json(Value),
    /// Multipart form body.
    Multipart(Vec<FormPart>),
}

/// An HTTP request issued through [`HttpClientCapability`].
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    /// Method.
    pub method: HttpMethod,
    /// Absolute URL.
    pub url: String,
    /// Extra headers.
    pub headers: Vec<(String, String)>,
    /// Body.
    pub body: HttpBody,
}

impl HttpRequest {
    /// Creates a GET request.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            headers: Vec::new(),
            body: HttpBody::Empty,
        }
    }

    /// Creates a POST request with an empty body.
    pub fn post(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Post,
            ..Self::get(url)
        }
    }

    /// Adds a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets a JSON body.
    pub fn json(mut self, body: Value) -> Self {
        self.body = HttpBody::Json(body);
        self
    }

    /// Sets a multipart body.
    pub fn multipart(mut self, parts: Vec<FormPart>) -> Self {
        self.body = HttpBody::Multipart(parts);
        self
    }
}

/// A downloaded resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    /// Content.
    pub data: Vec<u8>,
    /// Content type reported by the server.
    pub mime: Option<String>,
    /// File name derived from the response or URL.
    pub filename: Option<String>,
}

// =============================================================================
// Handles
// =============================================================================

/// Handle to a client connection.
///
/// Cloning is cheap; all clones drive the same connection.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    /// Unique identifier for this connection (bot ID).
    pub id: String,
    /// Sender for outgoing messages.
    message_tx: mpsc::Sender<Vec<u8>>,
    /// Requests closing the current socket; the reconnect policy then applies.
    close_signal: Arc<Notify>,
    /// Shutdown signal sender.
    shutdown_tx: Arc<watch::Sender<bool>>,
}

impl ConnectionHandle {
    /// Creates a new connection handle.
    pub fn new(
        id: impl Into<String>,
        message_tx: mpsc::Sender<Vec<u8>>,
        close_signal: Arc<Notify>,
        shutdown_tx: watch::Sender<bool>,
    ) -> Self {
        Self {
            id: id.into(),
            message_tx,
            close_signal,
            shutdown_tx: Arc::new(shutdown_tx),
        }
    }

    /// Sends a message through this connection.
    pub async fn send(&self, data: Vec<u8>) -> TransportResult<()> {
        self.message_tx
            .send(data)
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))
    }

    /// Sends a JSON message.
    pub async fn send_json(&self, value: &Value) -> TransportResult<()> {
        let data = serde_json::to_vec(value)
            .map_err(|e| TransportError::SendFailed(format!("JSON serialization failed: {e}")))?;
        self.send(data).await
    }

    /// Force-closes the current socket. The connection reconnects if its
    /// config allows it.
    pub fn close(&self) {
        self.close_signal.notify_one();
    }

    /// Closes this connection for good.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Returns whether shutdown was requested.
    pub fn is_shutdown(&self) -> bool {
        *self.shutdown_tx.borrow()
    }
}

// =============================================================================
// Client Configuration
// =============================================================================

/// Configuration for client connections.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Whether to automatically reconnect on disconnect.
    pub auto_reconnect: bool,
    /// Maximum number of consecutive failed reconnection attempts (None = infinite).
    pub max_retries: Option<u32>,
    /// Initial delay between reconnection attempts.
    pub initial_delay: Duration,
    /// Maximum delay between reconnection attempts.
    pub max_delay: Duration,
    /// Backoff multiplier.
    pub backoff_multiplier: f64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            auto_reconnect: true,
            max_retries: None,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            backoff_multiplier: 2.0,
        }
    }
}

impl ClientConfig {
    /// Creates a new client config with auto-reconnect disabled.
    pub fn no_reconnect() -> Self {
        Self {
            auto_reconnect: false,
            ..Default::default()
        }
    }

    /// Sets the maximum retry count.
    pub fn with_max_retries(mut self, max: u32) -> Self {
        self.max_retries = Some(max);
        self
    }

    /// Returns the delay following `current`, capped at `max_delay`.
    pub fn next_delay(&self, current: Duration) -> Duration {
        std::cmp::min(
            Duration::from_secs_f64(current.as_secs_f64() * self.backoff_multiplier),
            self.max_delay,
        )
    }
}

// =============================================================================
// Transport Context
// =============================================================================

/// Context for adapter initialization.
///
/// Provides access to available transport capabilities.
#[derive(Clone, Default)]
pub struct TransportContext {
    ws_client: Option<Arc<dyn WsClientCapability>>,
    http_client: Option<Arc<dyn HttpClientCapability>>,
}

impl TransportContext {
    /// Creates a new empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the WebSocket client capability.
    pub fn with_ws_client(mut self, cap: Arc<dyn WsClientCapability>) -> Self {
        self.ws_client = Some(cap);
        self
    }

    /// Registers the HTTP client capability.
    pub fn with_http_client(mut self, cap: Arc<dyn HttpClientCapability>) -> Self {
        self.http_client = Some(cap);
        self
    }

    /// Gets the WebSocket client capability if available.
    pub fn ws_client(&self) -> Option<&Arc<dyn WsClientCapability>> {
        self.ws_client.as_ref()
    }

    /// Gets the HTTP client capability if available.
    pub fn http_client(&self) -> Option<&Arc<dyn HttpClientCapability>> {
        self.http_client.as_ref()
    }

    /// Checks if WebSocket client is available.
    pub fn has_ws_client(&self) -> bool {
        self.ws_client.is_some()
    }

    /// Checks if HTTP client is available.
    pub fn has_http_client(&self) -> bool {
        self.http_client.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_context() {
        let ctx = TransportContext::new();
        assert!(!ctx.has_ws_client());
        assert!(!ctx.has_http_client());
    }

    #[test]
    fn test_client_config() {
        let config = ClientConfig::default();
        assert!(config.auto_reconnect);
        assert!(config.max_retries.is_none());

        let config = ClientConfig::no_reconnect();
        assert!(!config.auto_reconnect);
    }

    #[test]
    fn test_backoff_is_capped() {
        let config = ClientConfig {
            max_delay: Duration::from_secs(5),
            ..Default::default()
        };
        assert_eq!(config.next_delay(Duration::from_secs(1)), Duration::from_secs(2));
        assert_eq!(config.next_delay(Duration::from_secs(4)), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_handle_send_and_shutdown() {
        let (tx, mut rx) = mpsc::channel(4);
        let (shutdown_tx, _shutdown_rx) = watch::channel(false);
        let handle = ConnectionHandle::new("bot", tx, Arc::new(Notify::new()), shutdown_tx);

        handle.send_json(&serde_json::json!({"op": 1})).await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), br#"{"op":1}"#.to_vec());

        assert!(!handle.is_shutdown());
        handle.shutdown();
        assert!(handle.is_shutdown());
    }

    #[test]
    fn test_request_builder() {
        let req = HttpRequest::post("https://api/x")
            .header("Authorization", "Bot t")
            .json(serde_json::json!({"a": 1}));
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.headers.len(), 1);
        assert!(matches!(req.body, HttpBody::Json(_)));
    }
}
