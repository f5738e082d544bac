//! Discord adapter for the Bronze runtime.
//!
//! The adapter reads its configuration from `adapters.discord`:
//!
//! ```yaml
//! adapters:
//!   discord:
//!     token: ${DISCORD_TOKEN}
//! ```
//!
//! # Wiring
//!
//! ```text
//!  transport ──on_message──▶ inbox ──▶ GatewayWorker ──effects──▶ host / socket
//!      ▲                                   │
//!      └──resolve── GatewayResolver ◀── Arc<Mutex<GatewaySession>>
//! ```
//!
//! Inbound frames are handled by a single worker task per connection, in
//! arrival order. The transport re-resolves the endpoint before every
//! reconnect, which is where resume endpoints come into play.

use std::sync::Arc;

use async_trait::async_trait;
use bronze_core::{
    Adapter, AdapterContext, AdapterError, AdapterResult, BoxedHost, ConfigurableAdapter,
    ConnectionHandle, ConnectionHandler, ConnectionInfo, EndpointResolver, TransportError,
    TransportResult,
};
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::api::DiscordApi;
use crate::config::DiscordConfig;
use crate::error::GatewayError;
use crate::heartbeat::HeartbeatScheduler;
use crate::model::Frame;
use crate::session::{Effect, Endpoint, GatewaySession};

/// The Discord gateway adapter.
#[derive(Default)]
pub struct DiscordAdapter {
    /// Adapter configuration.
    config: DiscordConfig,
}

impl DiscordAdapter {
    /// Creates an adapter from a configuration.
    pub fn new(config: DiscordConfig) -> Self {
        Self { config }
    }

    /// Returns the adapter configuration.
    pub fn config(&self) -> &DiscordConfig {
        &self.config
    }
}

#[async_trait]
impl Adapter for DiscordAdapter {
    fn name() -> &'static str {
        "discord"
    }

    async fn on_start(&self, ctx: &mut AdapterContext) -> AdapterResult<()> {
        if self.config.token.is_empty() {
            return Err(AdapterError::config("adapters.discord.token is empty"));
        }

        let ws_client = ctx
            .transport()
            .ws_client()
            .cloned()
            .ok_or(TransportError::NotAvailable {
                transport: "ws-client",
            })?;
        let http_client = ctx
            .transport()
            .http_client()
            .cloned()
            .ok_or(TransportError::NotAvailable {
                transport: "http-client",
            })?;

        let session = Arc::new(Mutex::new(GatewaySession::new(
            self.config.token.clone(),
            self.config.intents,
            self.config.gateway_version,
        )));
        let resolver = Arc::new(GatewayResolver {
            session: session.clone(),
            api: DiscordApi::new(http_client, &self.config.api_base, &self.config.token),
        });
        let handler = Arc::new(DiscordConnectionHandler::new(
            self.config.name.clone(),
            session,
            ctx.host().clone(),
        ));

        info!(
            name = %self.config.name,
            intents = self.config.intents.bits(),
            "Connecting to Discord gateway"
        );
        let handle = ws_client
            .connect(resolver, handler, self.config.retry.to_client_config())
            .await?;
        ctx.add_connection(handle);

        Ok(())
    }

    async fn on_shutdown(&self, _ctx: &mut AdapterContext) -> AdapterResult<()> {
        info!("Discord adapter shutting down");
        Ok(())
    }
}

impl ConfigurableAdapter for DiscordAdapter {
    type Config = DiscordConfig;

    fn from_config(config: Self::Config) -> AdapterResult<Arc<Self>> {
        Ok(Arc::new(Self::new(config)))
    }
}

// =============================================================================
// Endpoint Resolution
// =============================================================================

/// Picks the resume endpoint when one is cached, else discovers one.
struct GatewayResolver {
    session: Arc<Mutex<GatewaySession>>,
    api: DiscordApi,
}

#[async_trait]
impl EndpointResolver for GatewayResolver {
    async fn resolve(&self) -> TransportResult<String> {
        let endpoint = self.session.lock().begin_connect()?;
        match endpoint {
            Endpoint::Url(url) => Ok(url),
            Endpoint::Discover => {
                let gateway = self.api.get_gateway_bot().await?;
                Ok(self.session.lock().connect_url(&gateway.url))
            }
        }
    }
}

// =============================================================================
// Connection Handler
// =============================================================================

/// Work items for the connection worker.
enum Inbound {
    /// A socket was opened.
    Open,
    /// A raw frame arrived.
    Frame(Vec<u8>),
    /// The socket closed; acknowledged once the close has been applied.
    Closed(TransportError, oneshot::Sender<()>),
    /// The connection is gone for good.
    Shutdown,
}

/// Connection handler for the gateway socket.
struct DiscordConnectionHandler {
    name: String,
    session: Arc<Mutex<GatewaySession>>,
    host: BoxedHost,
    inbox: Mutex<Option<mpsc::UnboundedSender<Inbound>>>,
}

impl DiscordConnectionHandler {
    fn new(name: String, session: Arc<Mutex<GatewaySession>>, host: BoxedHost) -> Self {
        Self {
            name,
            session,
            host,
            inbox: Mutex::new(None),
        }
    }

    fn post(&self, item: Inbound) -> bool {
        match self.inbox.lock().as_ref() {
            Some(tx) => tx.send(item).is_ok(),
            None => false,
        }
    }
}

#[async_trait]
impl ConnectionHandler for DiscordConnectionHandler {
    async fn on_connect(&self, conn_info: ConnectionInfo) -> TransportResult<String> {
        info!(
            bot_id = %self.name,
            url = ?conn_info.metadata.get("url"),
            "Discord gateway connection established"
        );
        Ok(self.name.clone())
    }

    async fn on_ready(&self, bot_id: &str, connection: ConnectionHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let sequence = self.session.lock().sequence_watch();
        let heartbeat = HeartbeatScheduler::new(connection.clone(), sequence);
        let worker = GatewayWorker {
            bot_id: bot_id.to_string(),
            session: self.session.clone(),
            host: self.host.clone(),
            connection,
            heartbeat,
            announced_online: false,
        };
        *self.inbox.lock() = Some(tx);
        tokio::spawn(worker.run(rx));
        debug!(bot_id = %bot_id, "Gateway worker started");
    }

    async fn on_open(&self, bot_id: &str) {
        if !self.post(Inbound::Open) {
            warn!(bot_id = %bot_id, "Socket opened without a worker");
        }
    }

    async fn on_message(&self, bot_id: &str, data: &[u8]) {
        if !self.post(Inbound::Frame(data.to_vec())) {
            warn!(bot_id = %bot_id, "Dropping frame, worker is gone");
        }
    }

    async fn on_close(&self, bot_id: &str, reason: &TransportError) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.post(Inbound::Closed(reason.clone(), ack_tx)) {
            // Everything queued before the close is applied before we return,
            // so the next endpoint resolution sees the final session state.
            let _ = ack_rx.await;
        } else {
            warn!(bot_id = %bot_id, "Socket closed without a worker");
        }
    }

    async fn on_disconnect(&self, bot_id: &str) {
        self.post(Inbound::Shutdown);
        self.inbox.lock().take();
        info!(bot_id = %bot_id, "Discord gateway disconnected");
    }

    async fn on_error(&self, bot_id: &str, error: &str) {
        error!(bot_id = %bot_id, error = %error, "Discord gateway error");
    }
}

// =============================================================================
// Worker
// =============================================================================

/// Single consumer of a connection's inbound work.
struct GatewayWorker {
    bot_id: String,
    session: Arc<Mutex<GatewaySession>>,
    host: BoxedHost,
    connection: ConnectionHandle,
    heartbeat: HeartbeatScheduler,
    announced_online: bool,
}

impl GatewayWorker {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Inbound>) {
        while let Some(item) = rx.recv().await {
            match item {
                Inbound::Open => self.session.lock().on_transport_open(),
                Inbound::Frame(data) => match Frame::decode(&data) {
                    Ok(frame) => {
                        let effects = self.session.lock().handle(frame);
                        self.apply(effects).await;
                    }
                    Err(e) => {
                        warn!(bot_id = %self.bot_id, error = %e, "Dropping frame");
                    }
                },
                Inbound::Closed(reason, ack) => {
                    debug!(bot_id = %self.bot_id, reason = %reason, "Socket closed");
                    let mut effects = self.session.lock().on_transport_close();
                    if self.announced_online {
                        effects.push(Effect::Offline);
                    }
                    self.apply(effects).await;
                    let _ = ack.send(());
                }
                Inbound::Shutdown => break,
            }
        }

        self.heartbeat.stop();
        if self.announced_online {
            let id = self.signal_id();
            self.host.offline(&id);
        }
        debug!(bot_id = %self.bot_id, "Gateway worker stopped");
    }

    /// The id lifecycle signals are reported under.
    fn signal_id(&self) -> String {
        self.session
            .lock()
            .self_id()
            .map(str::to_string)
            .unwrap_or_else(|| self.bot_id.clone())
    }

    async fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Send(payload) => {
                    if let Err(e) = self.connection.send_json(&payload).await {
                        let e = GatewayError::from(e);
                        warn!(bot_id = %self.bot_id, error = %e, "Failed to send frame");
                    }
                }
                Effect::StartHeartbeat(period) => self.heartbeat.start(period),
                Effect::StopHeartbeat => self.heartbeat.stop(),
                Effect::Emit { name, payload } => self.host.emit(&name, &payload),
                Effect::Dispatch(session) => self.host.dispatch(session),
                Effect::Online => {
                    self.announced_online = true;
                    let id = self.signal_id();
                    self.host.online(&id);
                }
                Effect::Offline => {
                    self.announced_online = false;
                    let id = self.signal_id();
                    self.host.offline(&id);
                }
                Effect::Close(reason) => {
                    warn!(bot_id = %self.bot_id, reason = %reason, "Closing gateway socket");
                    self.connection.close();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bronze_core::{Host, Session};
    use serde_json::{Value, json};
    use tokio::sync::{Notify, watch};

    #[derive(Default)]
    struct RecordingHost {
        signals: Mutex<Vec<String>>,
        sessions: Mutex<Vec<Session>>,
    }

    impl Host for RecordingHost {
        fn online(&self, bot_id: &str) {
            self.signals.lock().push(format!("online:{bot_id}"));
        }
        fn offline(&self, bot_id: &str) {
            self.signals.lock().push(format!("offline:{bot_id}"));
        }
        fn emit(&self, name: &str, _payload: &Value) {
            self.signals.lock().push(name.to_string());
        }
        fn dispatch(&self, session: Session) {
            self.sessions.lock().push(session);
        }
        fn sent(&self, _session: &Session) {}
    }

    struct Harness {
        handler: DiscordConnectionHandler,
        host: Arc<RecordingHost>,
        session: Arc<Mutex<GatewaySession>>,
        outbound: mpsc::Receiver<Vec<u8>>,
        close: Arc<Notify>,
    }

    async fn harness() -> Harness {
        let host = Arc::new(RecordingHost::default());
        let session = Arc::new(Mutex::new(GatewaySession::new(
            "tok",
            Default::default(),
            10,
        )));
        let handler =
            DiscordConnectionHandler::new("discord".into(), session.clone(), host.clone());

        let (tx, outbound) = mpsc::channel(16);
        let (shutdown_tx, _) = watch::channel(false);
        let close = Arc::new(Notify::new());
        let handle = ConnectionHandle::new("discord", tx, close.clone(), shutdown_tx);

        session.lock().begin_connect().unwrap();
        handler.on_ready("discord", handle).await;
        handler.on_open("discord").await;

        Harness {
            handler,
            host,
            session,
            outbound,
            close,
        }
    }

    async fn feed(h: &Harness, frame: Value) {
        h.handler
            .on_message("discord", frame.to_string().as_bytes())
            .await;
    }

    /// Closing waits for the worker, so everything fed before is applied.
    async fn settle(h: &Harness) {
        h.handler
            .on_close(
                "discord",
                &TransportError::ConnectionClosed {
                    reason: "test".into(),
                },
            )
            .await;
    }

    #[tokio::test]
    async fn test_handshake_and_dispatch_flow() {
        let mut h = harness().await;
        feed(&h, json!({"op": 10, "d": {"heartbeat_interval": 45000}})).await;
        feed(&h, json!({"op": 0, "s": 1, "t": "READY", "d": {
            "session_id": "s1",
            "resume_gateway_url": "wss://resume",
            "user": {"id": "42", "username": "bronze"},
        }}))
        .await;
        feed(&h, json!({"op": 0, "s": 2, "t": "MESSAGE_CREATE", "d": {
            "id": "m", "channel_id": "c", "author": {"id": "u"}, "content": "hi",
        }}))
        .await;
        h.handler.on_message("discord", b"garbage").await;
        settle(&h).await;

        let identify: Value = serde_json::from_slice(&h.outbound.recv().await.unwrap()).unwrap();
        assert_eq!(identify["op"], 2);

        assert_eq!(
            *h.host.signals.lock(),
            vec![
                "discord/ready".to_string(),
                "online:42".to_string(),
                "discord/message-create".to_string(),
                "offline:42".to_string(),
            ]
        );
        assert_eq!(h.host.sessions.lock()[0].content, "hi");
        assert_eq!(h.session.lock().sequence(), Some(2));
        assert!(!h.session.lock().is_transport_open());
    }

    #[tokio::test]
    async fn test_reconnect_request_closes_socket() {
        let h = harness().await;
        feed(&h, json!({"op": 7, "d": null})).await;
        settle(&h).await;

        // The close request is parked on the notify.
        tokio::time::timeout(std::time::Duration::from_secs(1), h.close.notified())
            .await
            .unwrap();
        assert_eq!(*h.host.signals.lock(), vec!["offline:discord".to_string()]);
    }

    #[tokio::test]
    async fn test_disconnect_reports_offline_once_online() {
        let h = harness().await;
        feed(&h, json!({"op": 0, "s": 1, "t": "RESUMED", "d": {}})).await;
        h.handler.on_disconnect("discord").await;
        for _ in 0..100 {
            if h.host.signals.lock().last().map(String::as_str) == Some("offline:discord") {
                break;
            }
            tokio::task::yield_now().await;
        }

        let signals = h.host.signals.lock().clone();
        assert_eq!(signals.first().map(String::as_str), Some("discord/resumed"));
        assert!(signals.contains(&"online:discord".to_string()));
        assert_eq!(signals.last().map(String::as_str), Some("offline:discord"));
    }

    #[tokio::test]
    async fn test_socket_drop_reports_offline_until_resumed() {
        let mut h = harness().await;
        feed(&h, json!({"op": 10, "d": {"heartbeat_interval": 45000}})).await;
        feed(&h, json!({"op": 0, "s": 1, "t": "READY", "d": {
            "session_id": "s1",
            "resume_gateway_url": "wss://resume",
            "user": {"id": "42", "username": "bronze"},
        }}))
        .await;
        settle(&h).await;

        assert_eq!(
            *h.host.signals.lock(),
            vec![
                "discord/ready".to_string(),
                "online:42".to_string(),
                "offline:42".to_string(),
            ]
        );

        assert_eq!(
            h.session.lock().begin_connect().unwrap(),
            Endpoint::Url("wss://resume/?v=10&encoding=json".into())
        );
        h.handler.on_open("discord").await;
        feed(&h, json!({"op": 10, "d": {"heartbeat_interval": 45000}})).await;
        feed(&h, json!({"op": 0, "s": 2, "t": "RESUMED", "d": {}})).await;
        settle(&h).await;

        let identify: Value = serde_json::from_slice(&h.outbound.recv().await.unwrap()).unwrap();
        let resume: Value = serde_json::from_slice(&h.outbound.recv().await.unwrap()).unwrap();
        assert_eq!(identify["op"], 2);
        assert_eq!(resume["op"], 6);
        assert_eq!(resume["d"]["seq"], 1);

        assert_eq!(
            h.host.signals.lock()[2..],
            [
                "offline:42".to_string(),
                "discord/resumed".to_string(),
                "online:42".to_string(),
                "offline:42".to_string(),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_hello_keeps_one_heartbeat() {
        let mut h = harness().await;
        feed(&h, json!({"op": 10, "d": {"heartbeat_interval": 100}})).await;
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        feed(&h, json!({"op": 10, "d": {"heartbeat_interval": 100}})).await;
        tokio::time::sleep(std::time::Duration::from_millis(320)).await;

        let mut ops = Vec::new();
        while let Ok(data) = h.outbound.try_recv() {
            let frame: Value = serde_json::from_slice(&data).unwrap();
            ops.push(frame["op"].as_u64().unwrap());
        }
        // The first timer is replaced before it fires.
        assert_eq!(ops, vec![2, 2, 1, 1, 1]);
    }
}
