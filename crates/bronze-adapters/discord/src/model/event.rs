//! Dispatch event classification.

/// Classified dispatch event type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Session established.
    Ready,
    /// Session resumed.
    Resumed,
    /// `MESSAGE_CREATE`.
    MessageCreate,
    /// `MESSAGE_UPDATE`.
    MessageUpdate,
    /// `MESSAGE_DELETE`.
    MessageDelete,
    /// `MESSAGE_REACTION_ADD`.
    ReactionAdd,
    /// `MESSAGE_REACTION_REMOVE`.
    ReactionRemove,
    /// Any other event; forwarded raw only.
    Other,
}

impl EventKind {
    /// Classifies an event type, ignoring case and separator style.
    ///
    /// `MESSAGE_CREATE`, `message-create` and `Message.Create` are the same.
    pub fn classify(event_type: &str) -> Self {
        match normalize(event_type).as_str() {
            "READY" => Self::Ready,
            "RESUMED" => Self::Resumed,
            "MESSAGE_CREATE" => Self::MessageCreate,
            "MESSAGE_UPDATE" => Self::MessageUpdate,
            "MESSAGE_DELETE" => Self::MessageDelete,
            "MESSAGE_REACTION_ADD" => Self::ReactionAdd,
            "MESSAGE_REACTION_REMOVE" => Self::ReactionRemove,
            _ => Self::Other,
        }
    }

    /// Returns whether dispatches of this kind carry chat content.
    pub fn is_chat_content(self) -> bool {
        matches!(
            self,
            Self::MessageCreate
                | Self::MessageUpdate
                | Self::MessageDelete
                | Self::ReactionAdd
                | Self::ReactionRemove
        )
    }
}

fn normalize(event_type: &str) -> String {
    event_type
        .trim()
        .chars()
        .map(|c| match c {
            '-' | '.' | ' ' => '_',
            c => c.to_ascii_uppercase(),
        })
        .collect()
}

/// Returns the host bus name for an event type, e.g. `discord/message-create`.
pub fn bus_name(event_type: &str) -> String {
    format!(
        "discord/{}",
        event_type.to_ascii_lowercase().replace('_', "-")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_normalizes() {
        assert_eq!(EventKind::classify("READY"), EventKind::Ready);
        assert_eq!(EventKind::classify("ready"), EventKind::Ready);
        assert_eq!(EventKind::classify("message-create"), EventKind::MessageCreate);
        assert_eq!(
            EventKind::classify("Message.Reaction.Add"),
            EventKind::ReactionAdd
        );
        assert_eq!(EventKind::classify("TYPING_START"), EventKind::Other);
    }

    #[test]
    fn test_bus_name() {
        assert_eq!(bus_name("MESSAGE_REACTION_ADD"), "discord/message-reaction-add");
        assert_eq!(bus_name("READY"), "discord/ready");
    }
}
