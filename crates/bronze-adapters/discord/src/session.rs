//! Gateway session state machine.
//!
//! [`GatewaySession`] owns everything that must survive a socket: the last
//! seen sequence, the resumable session id, the resume endpoint and the
//! bot's own identity. Each inbound [`Frame`] is handled by a pure function
//! of `(&mut GatewaySession, Frame)` that returns the [`Effect`]s the
//! connection worker must apply, in order.
//!
//! # Rules
//!
//! - The sequence only increases. It is reset only when the gateway
//!   invalidates the session for good.
//! - Exactly one `IDENTIFY` or `RESUME` is sent per `HELLO`: resume iff a
//!   session id is cached.
//! - A socket close stops the heartbeat and never touches cached state.

use std::time::Duration;

use bronze_core::Session;
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, info, trace, warn};

use crate::dispatcher::EventDispatcher;
use crate::error::GatewayError;
use crate::model::event::EventKind;
use crate::model::frame::{self, Frame, Opcode};
use crate::model::intents::Intents;
use crate::model::user::SelfUser;

/// Connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No socket.
    #[default]
    Disconnected,
    /// An endpoint was chosen and a socket is being opened.
    Connecting,
    /// Socket open, waiting for `HELLO`.
    AwaitingHello,
    /// `IDENTIFY` sent.
    Identifying,
    /// `RESUME` sent.
    Resuming,
    /// `READY` or `RESUMED` received.
    Online,
}

/// Where the next socket should connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// A known URL, query suffix included.
    Url(String),
    /// No resume endpoint is cached; discover one over REST.
    Discover,
}

/// Something the connection worker must do.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Send a payload on the socket.
    Send(Value),
    /// Start heartbeating at the given period, replacing any running timer.
    StartHeartbeat(Duration),
    /// Stop heartbeating.
    StopHeartbeat,
    /// Emit a raw event on the host bus.
    Emit {
        /// Namespaced event name.
        name: String,
        /// Full frame.
        payload: Value,
    },
    /// Hand a normalized session to the host.
    Dispatch(Session),
    /// Signal the host that the bot is online.
    Online,
    /// Signal the host that the bot is offline.
    Offline,
    /// Force-close the socket.
    Close(GatewayError),
}

/// State of one bot's gateway connection.
#[derive(Debug)]
pub struct GatewaySession {
    token: String,
    intents: Intents,
    gateway_version: u8,
    sequence: watch::Sender<Option<u64>>,
    session_id: String,
    resume_endpoint: Option<String>,
    heartbeat_interval: Option<Duration>,
    state: ConnectionState,
    transport_open: bool,
    self_user: Option<SelfUser>,
    dispatcher: EventDispatcher,
}

impl GatewaySession {
    /// Creates a session with no cached state.
    pub fn new(token: impl Into<String>, intents: Intents, gateway_version: u8) -> Self {
        let (sequence, _) = watch::channel(None);
        Self {
            token: token.into(),
            intents,
            gateway_version,
            sequence,
            session_id: String::new(),
            resume_endpoint: None,
            heartbeat_interval: None,
            state: ConnectionState::Disconnected,
            transport_open: false,
            self_user: None,
            dispatcher: EventDispatcher,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Returns the current state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Returns the last seen sequence.
    pub fn sequence(&self) -> Option<u64> {
        *self.sequence.borrow()
    }

    /// Subscribes to sequence updates. The session is the only writer.
    pub fn sequence_watch(&self) -> watch::Receiver<Option<u64>> {
        self.sequence.subscribe()
    }

    /// Returns the cached session id (empty when none).
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Returns the cached resume endpoint.
    pub fn resume_endpoint(&self) -> Option<&str> {
        self.resume_endpoint.as_deref()
    }

    /// Returns the heartbeat period dictated by the last `HELLO`.
    pub fn heartbeat_interval(&self) -> Option<Duration> {
        self.heartbeat_interval
    }

    /// Returns the bot's own identity, known after `READY`.
    pub fn self_user(&self) -> Option<&SelfUser> {
        self.self_user.as_ref()
    }

    /// Returns the bot's own id, if known.
    pub fn self_id(&self) -> Option<&str> {
        self.self_user.as_ref().map(|user| user.id.as_str())
    }

    /// Returns whether a socket is currently open.
    pub fn is_transport_open(&self) -> bool {
        self.transport_open
    }

    /// Appends the gateway query suffix to a base URL.
    pub fn connect_url(&self, base: &str) -> String {
        format!(
            "{}/?v={}&encoding=json",
            base.trim_end_matches('/'),
            self.gateway_version
        )
    }

    // =========================================================================
    // Transport events
    // =========================================================================

    /// Enters `Connecting` and picks the endpoint for the next socket.
    ///
    /// Rejected while a socket is still open.
    pub fn begin_connect(&mut self) -> Result<Endpoint, GatewayError> {
        if self.transport_open {
            return Err(GatewayError::TransportStillOpen);
        }
        self.state = ConnectionState::Connecting;
        Ok(match &self.resume_endpoint {
            Some(url) => {
                debug!(url = %url, "Connecting to resume endpoint");
                Endpoint::Url(self.connect_url(url))
            }
            None => Endpoint::Discover,
        })
    }

    /// A socket was opened.
    pub fn on_transport_open(&mut self) {
        self.transport_open = true;
        self.state = ConnectionState::AwaitingHello;
    }

    /// The socket closed, for whatever reason.
    pub fn on_transport_close(&mut self) -> Vec<Effect> {
        self.transport_open = false;
        self.state = ConnectionState::Disconnected;
        vec![Effect::StopHeartbeat]
    }

    // =========================================================================
    // Frames
    // =========================================================================

    /// Handles one inbound frame.
    pub fn handle(&mut self, frame: Frame) -> Vec<Effect> {
        if let Some(s) = frame.s {
            self.observe_sequence(s);
        }

        match frame.op {
            Opcode::Hello => self.on_hello(&frame.d),
            Opcode::Dispatch => self.on_dispatch(&frame),
            Opcode::InvalidSession => self.on_invalid_session(frame.d.as_bool().unwrap_or(false)),
            Opcode::Reconnect => self.on_reconnect(),
            Opcode::Heartbeat => {
                trace!("Gateway requested a heartbeat");
                vec![Effect::Send(frame::heartbeat(self.sequence()))]
            }
            Opcode::HeartbeatAck => {
                trace!("Heartbeat acknowledged");
                Vec::new()
            }
            Opcode::Identify | Opcode::Resume | Opcode::Unknown(_) => {
                debug!(op = frame.op.code(), "Ignoring unexpected opcode");
                Vec::new()
            }
        }
    }

    fn observe_sequence(&mut self, s: u64) {
        self.sequence.send_if_modified(|current| match current {
            Some(seen) if *seen >= s => false,
            _ => {
                *current = Some(s);
                true
            }
        });
    }

    fn on_hello(&mut self, d: &Value) -> Vec<Effect> {
        let Some(interval) = d.get("heartbeat_interval").and_then(Value::as_u64) else {
            warn!("HELLO without heartbeat_interval, ignoring");
            return Vec::new();
        };
        let interval = Duration::from_millis(interval);
        self.heartbeat_interval = Some(interval);

        let handshake = if self.session_id.is_empty() {
            debug!("Identifying");
            self.state = ConnectionState::Identifying;
            frame::identify(&self.token, self.intents)
        } else {
            debug!(session_id = %self.session_id, "Resuming");
            self.state = ConnectionState::Resuming;
            frame::resume(&self.token, &self.session_id, self.sequence())
        };

        vec![Effect::StartHeartbeat(interval), Effect::Send(handshake)]
    }

    fn on_dispatch(&mut self, frame: &Frame) -> Vec<Effect> {
        let Some(event_type) = frame.t.as_deref() else {
            warn!("Dispatch without event type, ignoring");
            return Vec::new();
        };

        match EventKind::classify(event_type) {
            EventKind::Ready => {
                let mut effects: Vec<Effect> = self.dispatcher.emit(frame).into_iter().collect();
                self.on_ready(&frame.d);
                effects.push(Effect::Online);
                effects
            }
            EventKind::Resumed => {
                info!("Gateway session resumed");
                self.state = ConnectionState::Online;
                let mut effects: Vec<Effect> = self.dispatcher.emit(frame).into_iter().collect();
                effects.push(Effect::Online);
                effects
            }
            kind => {
                let self_id = self.self_id().unwrap_or_default().to_string();
                self.dispatcher.dispatch(&self_id, kind, frame)
            }
        }
    }

    fn on_ready(&mut self, d: &Value) {
        self.session_id = d
            .get("session_id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        self.resume_endpoint = d
            .get("resume_gateway_url")
            .and_then(Value::as_str)
            .filter(|url| !url.is_empty())
            .map(str::to_string);
        if let Some(user) = d.get("user").and_then(SelfUser::from_ready_user) {
            self.self_user = Some(user);
        }
        self.state = ConnectionState::Online;

        info!(
            session_id = %self.session_id,
            self_id = ?self.self_id(),
            "Gateway session established"
        );
    }

    fn on_invalid_session(&mut self, resumable: bool) -> Vec<Effect> {
        if resumable {
            debug!("Invalid session (resumable), keeping state");
            return Vec::new();
        }

        warn!("Offline: invalid session");
        self.session_id.clear();
        self.resume_endpoint = None;
        self.sequence.send_replace(None);
        vec![
            Effect::Offline,
            Effect::Close(GatewayError::SessionInvalidated),
        ]
    }

    fn on_reconnect(&mut self) -> Vec<Effect> {
        warn!("Offline: gateway requested reconnect");
        vec![
            Effect::Offline,
            Effect::Close(GatewayError::RemoteReconnectRequested),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn frame(raw: Value) -> Frame {
        Frame::decode(raw.to_string().as_bytes()).unwrap()
    }

    fn hello() -> Frame {
        frame(json!({"op": 10, "d": {"heartbeat_interval": 41250}}))
    }

    fn ready() -> Frame {
        frame(json!({
            "op": 0, "s": 1, "t": "READY",
            "d": {
                "session_id": "sess",
                "resume_gateway_url": "wss://resume.discord.gg",
                "user": {"id": "42", "username": "bronze", "bot": true},
            },
        }))
    }

    fn open_session() -> GatewaySession {
        let mut session = GatewaySession::new("tok", Intents::default(), 10);
        assert_eq!(session.begin_connect().unwrap(), Endpoint::Discover);
        session.on_transport_open();
        session
    }

    fn sends(effects: &[Effect]) -> Vec<&Value> {
        effects
            .iter()
            .filter_map(|e| match e {
                Effect::Send(v) => Some(v),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_sequence_is_max_seen() {
        let mut session = open_session();
        let watch = session.sequence_watch();

        session.handle(frame(json!({"op": 0, "s": 5, "t": "TYPING_START", "d": {}})));
        session.handle(frame(json!({"op": 0, "s": 3, "t": "TYPING_START", "d": {}})));
        assert_eq!(session.sequence(), Some(5));
        assert_eq!(*watch.borrow(), Some(5));

        session.handle(frame(json!({"op": 11, "s": 7})));
        assert_eq!(session.sequence(), Some(7));
    }

    #[test]
    fn test_hello_without_session_identifies_once() {
        let mut session = open_session();
        let effects = session.handle(hello());

        assert_eq!(effects[0], Effect::StartHeartbeat(Duration::from_millis(41250)));
        let sent = sends(&effects);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0]["op"], 2);
        assert_eq!(sent[0]["d"]["token"], "tok");
        assert_eq!(sent[0]["d"]["intents"], Intents::default().bits());
        assert_eq!(session.state(), ConnectionState::Identifying);
    }

    #[test]
    fn test_hello_with_session_resumes_once() {
        let mut session = open_session();
        session.handle(hello());
        session.handle(ready());
        session.on_transport_close();

        assert_eq!(
            session.begin_connect().unwrap(),
            Endpoint::Url("wss://resume.discord.gg/?v=10&encoding=json".into())
        );
        session.on_transport_open();
        let effects = session.handle(hello());

        let sent = sends(&effects);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0]["op"], 6);
        assert_eq!(sent[0]["d"]["session_id"], "sess");
        assert_eq!(sent[0]["d"]["seq"], 1);
        assert_eq!(session.state(), ConnectionState::Resuming);
    }

    #[test]
    fn test_ready_caches_session_and_signals_online_once() {
        let mut session = open_session();
        session.handle(hello());
        let effects = session.handle(ready());

        assert_eq!(session.session_id(), "sess");
        assert_eq!(session.resume_endpoint(), Some("wss://resume.discord.gg"));
        assert_eq!(session.self_id(), Some("42"));
        assert_eq!(session.state(), ConnectionState::Online);
        assert_eq!(effects.iter().filter(|e| **e == Effect::Online).count(), 1);
        assert!(matches!(&effects[0], Effect::Emit { name, .. } if name == "discord/ready"));
    }

    #[test]
    fn test_resumed_signals_online_and_keeps_identity() {
        let mut session = open_session();
        session.handle(hello());
        session.handle(ready());
        let before = session.self_user().cloned();

        let effects = session.handle(frame(json!({"op": 0, "s": 2, "t": "RESUMED", "d": {}})));

        assert_eq!(effects.iter().filter(|e| **e == Effect::Online).count(), 1);
        assert_eq!(session.self_user().cloned(), before);
        assert_eq!(session.session_id(), "sess");
    }

    #[test]
    fn test_invalid_session_not_resumable_clears_and_closes() {
        let mut session = open_session();
        session.handle(hello());
        session.handle(ready());

        let effects = session.handle(frame(json!({"op": 9, "d": false})));

        assert_eq!(
            effects,
            vec![
                Effect::Offline,
                Effect::Close(GatewayError::SessionInvalidated)
            ]
        );
        assert_eq!(session.session_id(), "");
        assert_eq!(session.resume_endpoint(), None);
        assert_eq!(session.sequence(), None);
    }

    #[test]
    fn test_invalid_session_resumable_is_noop() {
        let mut session = open_session();
        session.handle(hello());
        session.handle(ready());

        let effects = session.handle(frame(json!({"op": 9, "d": true})));

        assert!(effects.is_empty());
        assert_eq!(session.session_id(), "sess");
        assert_eq!(session.sequence(), Some(1));
    }

    #[test]
    fn test_reconnect_keeps_session() {
        let mut session = open_session();
        session.handle(hello());
        session.handle(ready());

        let effects = session.handle(frame(json!({"op": 7, "d": null})));

        assert_eq!(
            effects,
            vec![
                Effect::Offline,
                Effect::Close(GatewayError::RemoteReconnectRequested)
            ]
        );
        assert_eq!(session.session_id(), "sess");
    }

    #[test]
    fn test_connect_while_open_is_rejected() {
        let mut session = open_session();
        assert_eq!(
            session.begin_connect(),
            Err(GatewayError::TransportStillOpen)
        );
    }

    #[test]
    fn test_close_stops_heartbeat_and_keeps_state() {
        let mut session = open_session();
        session.handle(hello());
        session.handle(ready());

        assert_eq!(session.on_transport_close(), vec![Effect::StopHeartbeat]);
        assert_eq!(session.state(), ConnectionState::Disconnected);
        assert_eq!(session.session_id(), "sess");
        assert_eq!(session.sequence(), Some(1));
        assert!(!session.is_transport_open());
    }

    #[test]
    fn test_chat_dispatch_produces_session() {
        let mut session = open_session();
        session.handle(hello());
        session.handle(ready());

        let effects = session.handle(frame(json!({
            "op": 0, "s": 2, "t": "MESSAGE_CREATE",
            "d": {"id": "9", "channel_id": "8", "author": {"id": "7"}, "content": "hi"},
        })));

        assert_eq!(effects.len(), 2);
        let Effect::Dispatch(dispatched) = &effects[1] else {
            panic!("expected dispatch");
        };
        assert_eq!(dispatched.self_id, "42");
        assert_eq!(dispatched.event_name(), "discord/message-created");
    }

    #[test]
    fn test_server_heartbeat_request_is_answered() {
        let mut session = open_session();
        session.handle(frame(json!({"op": 0, "s": 4, "t": "TYPING_START", "d": {}})));
        let effects = session.handle(frame(json!({"op": 1, "d": null})));
        assert_eq!(effects, vec![Effect::Send(json!({"op": 1, "d": 4}))]);
    }

    #[test]
    fn test_unknown_opcode_is_ignored() {
        let mut session = open_session();
        assert!(session.handle(frame(json!({"op": 42, "d": {}}))).is_empty());
    }
}
