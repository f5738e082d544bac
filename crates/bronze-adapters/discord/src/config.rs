//! Configuration types for the Discord adapter.
//!
//! Loaded from `adapters.discord` in the global configuration file.
//!
//! # Example Configuration
//!
//! ```yaml
//! adapters:
//!   discord:
//!     token: ${DISCORD_TOKEN}
//!     # GUILD_MESSAGES | DIRECT_MESSAGES | MESSAGE_CONTENT
//!     intents: 37376
//!     retry:
//!       max_retries: 10
//!       initial_delay_ms: 2000
//! ```

use std::time::Duration;

use bronze_core::ClientConfig;
use serde::{Deserialize, Serialize};

use crate::model::Intents;

/// Discord adapter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    /// Bot token.
    pub token: String,

    /// Gateway intents to subscribe to.
    pub intents: Intents,

    /// REST API base URL, used for gateway discovery.
    pub api_base: String,

    /// Gateway protocol version.
    pub gateway_version: u8,

    /// Connection name used before the bot's own id is known.
    pub name: String,

    /// Reconnection settings.
    pub retry: RetryConfig,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            intents: Intents::default(),
            api_base: "https://discord.com/api/v10".to_string(),
            gateway_version: 10,
            name: "discord".to_string(),
            retry: RetryConfig::default(),
        }
    }
}

/// Reconnection settings for the gateway socket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Whether to reconnect after the socket closes.
    pub auto_reconnect: bool,

    /// Consecutive failed attempts before giving up (unset = never).
    pub max_retries: Option<u32>,

    /// First reconnection delay in milliseconds.
    pub initial_delay_ms: u64,

    /// Maximum reconnection delay in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            auto_reconnect: true,
            max_retries: None,
            initial_delay_ms: 1000,
            max_delay_ms: 60_000,
        }
    }
}

impl RetryConfig {
    /// Converts to a transport client config.
    pub fn to_client_config(&self) -> ClientConfig {
        ClientConfig {
            auto_reconnect: self.auto_reconnect,
            max_retries: self.max_retries,
            initial_delay: Duration::from_millis(self.initial_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            ..ClientConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_config() {
        let yaml = r#"
token: abc
intents: 512
retry:
  max_retries: 3
  initial_delay_ms: 250
"#;

        let config: DiscordConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.token, "abc");
        assert_eq!(config.intents, Intents::GUILD_MESSAGES);
        assert_eq!(config.gateway_version, 10);
        assert_eq!(config.api_base, "https://discord.com/api/v10");

        let client = config.retry.to_client_config();
        assert!(client.auto_reconnect);
        assert_eq!(client.max_retries, Some(3));
        assert_eq!(client.initial_delay, Duration::from_millis(250));
        assert_eq!(client.max_delay, Duration::from_secs(60));
    }

    #[test]
    fn test_default_intents_when_missing() {
        let config: DiscordConfig = serde_yaml::from_str("token: abc").unwrap();
        assert_eq!(config.intents, Intents::default());
    }
}
