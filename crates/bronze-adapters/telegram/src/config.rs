//! Configuration types for the Telegram adapter.
//!
//! # Example Configuration
//!
//! ```yaml
//! adapters:
//!   telegram:
//!     token: ${TELEGRAM_TOKEN}
//!     link_preview: true
//! ```

use serde::{Deserialize, Serialize};

/// Telegram adapter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot token.
    pub token: String,

    /// Bot API base URL.
    pub api_base: String,

    /// Default for link previews in text messages.
    pub link_preview: bool,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            api_base: "https://api.telegram.org".to_string(),
            link_preview: false,
        }
    }
}

impl TelegramConfig {
    /// Returns the URL for a Bot API method.
    pub fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.api_base.trim_end_matches('/'),
            self.token,
            method
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_config() {
        let config: TelegramConfig = serde_yaml::from_str("token: '1:abc'\nlink_preview: true").unwrap();
        assert!(config.link_preview);
        assert_eq!(
            config.method_url("sendMessage"),
            "https://api.telegram.org/bot1:abc/sendMessage"
        );
    }
}
