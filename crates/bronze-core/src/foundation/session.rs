//! Normalized session record.
//!
//! A [`Session`] is what every adapter produces from platform-native payloads:
//! inbound chat events and the responses of outbound send calls alike.

use serde::{Deserialize, Serialize};

/// What happened in a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionKind {
    /// A message was posted.
    MessageCreated,
    /// A message was edited.
    MessageUpdated,
    /// A message was removed.
    MessageDeleted,
    /// A reaction was added to a message.
    ReactionAdded,
    /// A reaction was removed from a message.
    ReactionRemoved,
    /// A message was sent by this bot.
    MessageSent,
}

impl SessionKind {
    /// Returns the normalized event name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MessageCreated => "message-created",
            Self::MessageUpdated => "message-updated",
            Self::MessageDeleted => "message-deleted",
            Self::ReactionAdded => "reaction-added",
            Self::ReactionRemoved => "reaction-removed",
            Self::MessageSent => "send",
        }
    }
}

/// A normalized message record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Platform name (e.g. `"discord"`).
    pub platform: String,
    /// Id of the bot that observed or produced this session.
    pub self_id: String,
    /// What happened.
    pub kind: SessionKind,
    /// Platform message id.
    pub message_id: String,
    /// Channel (or chat) the message belongs to.
    pub channel_id: String,
    /// Guild (or group) the channel belongs to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<String>,
    /// Author or actor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Message content, in the platform's text form.
    #[serde(default)]
    pub content: String,
    /// Unix timestamp in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl Session {
    /// Creates a session with the required fields; the rest are empty.
    pub fn new(
        platform: impl Into<String>,
        self_id: impl Into<String>,
        kind: SessionKind,
        message_id: impl Into<String>,
        channel_id: impl Into<String>,
    ) -> Self {
        Self {
            platform: platform.into(),
            self_id: self_id.into(),
            kind,
            message_id: message_id.into(),
            channel_id: channel_id.into(),
            guild_id: None,
            user_id: None,
            content: String::new(),
            timestamp: None,
        }
    }

    /// Returns the namespaced event name, e.g. `discord/message-created`.
    pub fn event_name(&self) -> String {
        format!("{}/{}", self.platform, self.kind.as_str())
    }
}
