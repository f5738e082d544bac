//! WebSocket client capability implementation.

use std::sync::Arc;

use async_trait::async_trait;
use futures::{FutureExt, SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{Notify, mpsc, watch};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};
use tracing::{debug, error, info, trace, warn};

use bronze_core::{
    ClientConfig, ConnectionHandle, ConnectionHandler, ConnectionInfo, EndpointResolver,
    TransportError, TransportResult, WsClientCapability,
};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// WebSocket client capability implementation.
pub struct WsClientCapabilityImpl;

impl WsClientCapabilityImpl {
    /// Creates a new WebSocket client capability.
    pub fn new() -> Self {
        Self
    }
}

impl Default for WsClientCapabilityImpl {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WsClientCapability for WsClientCapabilityImpl {
    async fn connect(
        &self,
        endpoint: Arc<dyn EndpointResolver>,
        handler: Arc<dyn ConnectionHandler>,
        config: ClientConfig,
    ) -> TransportResult<ConnectionHandle> {
        let (message_tx, message_rx) = mpsc::channel::<Vec<u8>>(256);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let close_signal = Arc::new(Notify::new());

        let url = endpoint.resolve().await?;
        let ws = open(&url).await?;

        let conn_info = ConnectionInfo::new("websocket").with_metadata("url", &url);
        let bot_id = handler.on_connect(conn_info).await?;

        info!(bot_id = %bot_id, url = %url, "WebSocket client connected");

        let handle =
            ConnectionHandle::new(bot_id.clone(), message_tx, close_signal.clone(), shutdown_tx);

        handler.on_ready(&bot_id, handle.clone()).await;
        handler.on_open(&bot_id).await;

        tokio::spawn(run_client_loop(ClientLoop {
            ws,
            message_rx,
            shutdown_rx,
            close_signal,
            handler,
            endpoint,
            bot_id,
            config,
        }));

        Ok(handle)
    }
}

async fn open(url: &str) -> TransportResult<WsStream> {
    debug!(url = %url, "Opening WebSocket");
    let (ws_stream, _response) =
        connect_async(url)
            .await
            .map_err(|e| TransportError::ConnectionFailed {
                url: url.to_string(),
                reason: format!("WebSocket connection failed: {e}"),
            })?;
    Ok(ws_stream)
}

/// State owned by a client's connection manager task.
struct ClientLoop {
    ws: WsStream,
    message_rx: mpsc::Receiver<Vec<u8>>,
    shutdown_rx: watch::Receiver<bool>,
    close_signal: Arc<Notify>,
    handler: Arc<dyn ConnectionHandler>,
    endpoint: Arc<dyn EndpointResolver>,
    bot_id: String,
    config: ClientConfig,
}

/// Why a socket stopped being driven.
enum SocketExit {
    /// Shutdown was requested.
    Shutdown,
    /// The socket closed; the reconnect policy applies.
    Closed(TransportError),
}

/// Runs the WebSocket client loop with reconnection support.
async fn run_client_loop(mut state: ClientLoop) {
    loop {
        match drive_socket(&mut state).await {
            SocketExit::Shutdown => {
                info!(bot_id = %state.bot_id, "WebSocket client shutting down");
                let reason = TransportError::ConnectionClosed {
                    reason: "shutdown".into(),
                };
                state.handler.on_close(&state.bot_id, &reason).await;
                state.handler.on_disconnect(&state.bot_id).await;
                break;
            }
            SocketExit::Closed(reason) => {
                info!(bot_id = %state.bot_id, reason = %reason, "WebSocket closed");
                state.handler.on_close(&state.bot_id, &reason).await;

                if !state.config.auto_reconnect {
                    state.handler.on_disconnect(&state.bot_id).await;
                    break;
                }

                match try_reconnect(&mut state).await {
                    Some(ws) => {
                        state.ws = ws;
                        discard_stale(&mut state);
                        state.handler.on_open(&state.bot_id).await;
                    }
                    None => {
                        state.handler.on_disconnect(&state.bot_id).await;
                        break;
                    }
                }
            }
        }
    }
}

/// Pumps one socket until it closes or shutdown is requested.
async fn drive_socket(state: &mut ClientLoop) -> SocketExit {
    loop {
        tokio::select! {
            // Check for shutdown
            changed = state.shutdown_rx.changed() => {
                if changed.is_err() || *state.shutdown_rx.borrow() {
                    let _ = state.ws.close(None).await;
                    return SocketExit::Shutdown;
                }
            }

            // Local close request
            _ = state.close_signal.notified() => {
                debug!(bot_id = %state.bot_id, "Closing socket on request");
                let _ = state.ws.close(None).await;
                return SocketExit::Closed(TransportError::ConnectionClosed {
                    reason: "closed locally".into(),
                });
            }

            // Receive messages to send
            Some(data) = state.message_rx.recv() => {
                let msg = Message::Text(String::from_utf8_lossy(&data).to_string().into());
                if let Err(e) = state.ws.send(msg).await {
                    warn!(bot_id = %state.bot_id, error = %e, "Failed to send message");
                }
            }

            // Receive messages from server
            msg = state.ws.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        trace!(bot_id = %state.bot_id, len = text.len(), "Received text");
                        state.handler.on_message(&state.bot_id, text.as_bytes()).await;
                    }
                    Some(Ok(Message::Binary(data))) => {
                        trace!(bot_id = %state.bot_id, len = data.len(), "Received binary");
                        state.handler.on_message(&state.bot_id, &data).await;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        trace!(bot_id = %state.bot_id, "Received ping, sending pong");
                        let _ = state.ws.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Pong(_))) | Some(Ok(Message::Frame(_))) => {}
                    Some(Ok(Message::Close(frame))) => {
                        let reason = frame
                            .map(|f| format!("{} {}", u16::from(f.code), f.reason.as_str()))
                            .unwrap_or_else(|| "closed by server".into());
                        return SocketExit::Closed(TransportError::ConnectionClosed { reason });
                    }
                    Some(Err(e)) => {
                        state.handler.on_error(&state.bot_id, &e.to_string()).await;
                        return SocketExit::Closed(TransportError::ConnectionClosed {
                            reason: e.to_string(),
                        });
                    }
                    None => {
                        return SocketExit::Closed(TransportError::ConnectionClosed {
                            reason: "stream ended".into(),
                        });
                    }
                }
            }
        }
    }
}

/// Reconnects with exponential backoff, re-resolving the endpoint each attempt.
///
/// Returns `None` when retries are exhausted or shutdown was requested.
async fn try_reconnect(state: &mut ClientLoop) -> Option<WsStream> {
    let mut retry_count = 0u32;
    let mut current_delay = state.config.initial_delay;

    loop {
        if let Some(max) = state.config.max_retries
            && retry_count >= max
        {
            error!(bot_id = %state.bot_id, "Max retries reached, giving up");
            return None;
        }

        warn!(bot_id = %state.bot_id, delay = ?current_delay, "Reconnecting...");
        tokio::select! {
            _ = tokio::time::sleep(current_delay) => {}
            _ = state.shutdown_rx.changed() => {
                info!(bot_id = %state.bot_id, "Shutdown requested while reconnecting");
                return None;
            }
        }

        let attempt = match state.endpoint.resolve().await {
            Ok(url) => open(&url).await,
            Err(e) => Err(e),
        };

        match attempt {
            Ok(ws) => {
                info!(bot_id = %state.bot_id, "Reconnected successfully");
                return Some(ws);
            }
            Err(e) => {
                warn!(bot_id = %state.bot_id, error = %e, "Reconnection failed");
                retry_count += 1;
                current_delay = state.config.next_delay(current_delay);
            }
        }
    }
}

/// Drops frames queued for the previous socket and any close request that
/// arrived while no socket was open.
fn discard_stale(state: &mut ClientLoop) {
    let mut dropped = 0usize;
    while state.message_rx.try_recv().is_ok() {
        dropped += 1;
    }
    if dropped > 0 {
        debug!(bot_id = %state.bot_id, dropped, "Discarded frames queued for the closed socket");
    }
    let _ = state.close_signal.notified().now_or_never();
}
