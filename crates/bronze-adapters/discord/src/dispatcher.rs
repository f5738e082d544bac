//! Event dispatcher.
//!
//! Every dispatch is emitted raw on the host bus under
//! `discord/<event-type>`. Chat-content dispatches are additionally adapted
//! into normalized [`Session`]s.

use bronze_core::{Session, SessionKind};
use serde_json::Value;
use tracing::trace;

use crate::model::event::{EventKind, bus_name};
use crate::model::frame::Frame;
use crate::session::Effect;

/// Platform name carried by every session this adapter produces.
pub const PLATFORM: &str = "discord";

/// Maps classified dispatches to host effects. Stateless.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventDispatcher;

impl EventDispatcher {
    /// Returns the raw bus emission for a dispatch frame.
    pub fn emit(&self, frame: &Frame) -> Option<Effect> {
        let event_type = frame.t.as_deref()?;
        Some(Effect::Emit {
            name: bus_name(event_type),
            payload: frame.to_value(),
        })
    }

    /// Produces the effects for a forwarded dispatch: the raw emission, then
    /// the adapted session if the event carries chat content.
    pub fn dispatch(&self, self_id: &str, kind: EventKind, frame: &Frame) -> Vec<Effect> {
        let mut effects: Vec<Effect> = self.emit(frame).into_iter().collect();
        if kind.is_chat_content() {
            match self.adapt(self_id, kind, &frame.d) {
                Some(session) => effects.push(Effect::Dispatch(session)),
                None => trace!(event = ?frame.t, "Dispatch carried no adaptable session"),
            }
        }
        effects
    }

    /// Adapts a chat-content payload into a session.
    ///
    /// Returns `None` for other kinds or when required ids are missing.
    pub fn adapt(&self, self_id: &str, kind: EventKind, d: &Value) -> Option<Session> {
        match kind {
            EventKind::MessageCreate => adapt_message(self_id, SessionKind::MessageCreated, d),
            EventKind::MessageUpdate => adapt_message(self_id, SessionKind::MessageUpdated, d),
            EventKind::MessageDelete => {
                let mut session = base(self_id, SessionKind::MessageDeleted, d, "id")?;
                session.guild_id = str_field(d, "guild_id");
                Some(session)
            }
            EventKind::ReactionAdd => adapt_reaction(self_id, SessionKind::ReactionAdded, d),
            EventKind::ReactionRemove => adapt_reaction(self_id, SessionKind::ReactionRemoved, d),
            _ => None,
        }
    }
}

fn str_field(d: &Value, key: &str) -> Option<String> {
    d.get(key).and_then(Value::as_str).map(str::to_string)
}

fn base(self_id: &str, kind: SessionKind, d: &Value, id_key: &str) -> Option<Session> {
    let message_id = d.get(id_key)?.as_str()?;
    let channel_id = d.get("channel_id")?.as_str()?;
    Some(Session::new(PLATFORM, self_id, kind, message_id, channel_id))
}

fn parse_timestamp(raw: Option<&Value>) -> Option<i64> {
    let raw = raw?.as_str()?;
    chrono::DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.timestamp_millis())
}

fn adapt_message(self_id: &str, kind: SessionKind, d: &Value) -> Option<Session> {
    let mut session = base(self_id, kind, d, "id")?;
    session.guild_id = str_field(d, "guild_id");
    session.user_id = d
        .get("author")
        .and_then(|author| author.get("id"))
        .and_then(Value::as_str)
        .map(str::to_string);
    session.content = str_field(d, "content").unwrap_or_default();
    session.timestamp = match kind {
        SessionKind::MessageUpdated => parse_timestamp(d.get("edited_timestamp"))
            .or_else(|| parse_timestamp(d.get("timestamp"))),
        _ => parse_timestamp(d.get("timestamp")),
    };
    Some(session)
}

fn adapt_reaction(self_id: &str, kind: SessionKind, d: &Value) -> Option<Session> {
    let mut session = base(self_id, kind, d, "message_id")?;
    session.guild_id = str_field(d, "guild_id");
    session.user_id = str_field(d, "user_id");
    // Custom emoji are `name:id`, unicode emoji only have a name.
    session.content = d
        .get("emoji")
        .map(|emoji| {
            let name = emoji.get("name").and_then(Value::as_str).unwrap_or_default();
            match emoji.get("id").and_then(Value::as_str) {
                Some(id) => format!("{name}:{id}"),
                None => name.to_string(),
            }
        })
        .unwrap_or_default();
    Some(session)
}
