//! Bot handle and result adaptation.

use std::sync::Arc;

use bronze_core::{BoxedHost, Element, Session, SessionKind};
use tracing::info;

use crate::api::TelegramApi;
use crate::asset::AssetResolver;
use crate::encoder::MessageEncoder;
use crate::error::EncodeError;
use crate::model::TgMessage;

/// Platform name used in sessions.
pub const PLATFORM: &str = "telegram";

/// Per-send options.
#[derive(Debug, Clone, Copy, Default)]
pub struct SendOptions {
    /// Overrides the configured link preview setting.
    pub link_preview: Option<bool>,
}

/// A started Telegram bot.
pub struct TelegramBot {
    self_id: String,
    api: Arc<dyn TelegramApi>,
    assets: Arc<dyn AssetResolver>,
    host: BoxedHost,
    link_preview: bool,
}

impl TelegramBot {
    pub fn new(
        self_id: impl Into<String>,
        api: Arc<dyn TelegramApi>,
        assets: Arc<dyn AssetResolver>,
        host: BoxedHost,
        link_preview: bool,
    ) -> Self {
        Self {
            self_id: self_id.into(),
            api,
            assets,
            host,
            link_preview,
        }
    }

    /// Returns the bot's user id.
    pub fn self_id(&self) -> &str {
        &self.self_id
    }

    /// Sends a document to a chat.
    ///
    /// `guild_id` is the group of a forum topic; `channel_id` is then the
    /// topic's thread id. Returns one session per call made.
    pub async fn send(
        &self,
        channel_id: &str,
        guild_id: Option<&str>,
        elements: &[Element],
        options: SendOptions,
    ) -> Result<Vec<Session>, EncodeError> {
        let sent = MessageEncoder::new(
            self.api.clone(),
            self.assets.clone(),
            self.host.clone(),
            self.self_id.clone(),
            channel_id,
            guild_id,
        )
        .with_link_preview(options.link_preview.unwrap_or(self.link_preview))
        .send(elements)
        .await?;

        info!(bot_id = %self.self_id, channel_id = %channel_id, calls = sent.len(), "Document sent");
        Ok(sent)
    }
}

/// Converts a sent message into a session.
pub fn adapt_sent(self_id: &str, message: &TgMessage) -> Session {
    let chat_id = message.chat.id.to_string();
    let (channel_id, guild_id) = match message.message_thread_id {
        Some(thread) if message.is_topic_message => (thread.to_string(), Some(chat_id)),
        _ if message.chat.is_private() => (chat_id, None),
        _ => (chat_id.clone(), Some(chat_id)),
    };

    let mut session = Session::new(
        PLATFORM,
        self_id,
        SessionKind::MessageSent,
        message.message_id.to_string(),
        channel_id,
    );
    session.guild_id = guild_id;
    session.user_id = message.from.as_ref().map(|user| user.id.to_string());
    session.content = message
        .text
        .clone()
        .or_else(|| message.caption.clone())
        .unwrap_or_default();
    session.timestamp = Some(message.date * 1000);
    session
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{TgChat, TgUser};

    fn message(kind: &str, thread: Option<i64>) -> TgMessage {
        TgMessage {
            message_id: 5,
            date: 1_700_000_000,
            chat: TgChat {
                id: -100,
                kind: kind.into(),
                title: None,
                username: None,
            },
            from: Some(TgUser {
                id: 42,
                is_bot: true,
                first_name: "bronze".into(),
                last_name: None,
                username: None,
            }),
            message_thread_id: thread,
            is_topic_message: thread.is_some(),
            text: None,
            caption: Some("cap".into()),
        }
    }

    #[test]
    fn test_adapt_private() {
        let session = adapt_sent("42", &message("private", None));
        assert_eq!(session.platform, "telegram");
        assert_eq!(session.kind, SessionKind::MessageSent);
        assert_eq!(session.message_id, "5");
        assert_eq!(session.channel_id, "-100");
        assert_eq!(session.guild_id, None);
        assert_eq!(session.user_id.as_deref(), Some("42"));
        assert_eq!(session.content, "cap");
        assert_eq!(session.timestamp, Some(1_700_000_000_000));
    }

    #[test]
    fn test_adapt_group_and_topic() {
        let group = adapt_sent("42", &message("supergroup", None));
        assert_eq!(group.channel_id, "-100");
        assert_eq!(group.guild_id.as_deref(), Some("-100"));

        let topic = adapt_sent("42", &message("supergroup", Some(9)));
        assert_eq!(topic.channel_id, "9");
        assert_eq!(topic.guild_id.as_deref(), Some("-100"));
    }
}
