//! The bot's own identity.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The bot user, captured from `READY`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelfUser {
    /// User id.
    pub id: String,
    /// Display name, falling back to the username.
    pub name: String,
    /// Avatar URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// Whether the account is a bot account.
    #[serde(default)]
    pub is_bot: bool,
}

impl SelfUser {
    /// Extracts the user from a `READY` payload's `user` object.
    pub fn from_ready_user(user: &Value) -> Option<Self> {
        let id = user.get("id")?.as_str()?.to_string();
        let username = user.get("username").and_then(Value::as_str).unwrap_or_default();
        let name = user
            .get("global_name")
            .and_then(Value::as_str)
            .unwrap_or(username)
            .to_string();
        let avatar = user
            .get("avatar")
            .and_then(Value::as_str)
            .map(|hash| format!("https://cdn.discordapp.com/avatars/{id}/{hash}"));
        let is_bot = user.get("bot").and_then(Value::as_bool).unwrap_or(false);

        Some(Self {
            id,
            name,
            avatar,
            is_bot,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_ready_user() {
        let user = SelfUser::from_ready_user(&json!({
            "id": "42", "username": "bronze", "avatar": "abc", "bot": true
        }))
        .unwrap();
        assert_eq!(user.name, "bronze");
        assert_eq!(
            user.avatar.as_deref(),
            Some("https://cdn.discordapp.com/avatars/42/abc")
        );
        assert!(user.is_bot);

        assert!(SelfUser::from_ready_user(&json!({"username": "x"})).is_none());
    }
}
