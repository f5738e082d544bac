//! Discord REST calls needed by the gateway.

use std::sync::Arc;

use bronze_core::{HttpClientCapability, HttpRequest};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::GatewayError;

/// Response of `GET /gateway/bot`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GatewayBot {
    /// Gateway WebSocket URL.
    pub url: String,
    /// Recommended shard count.
    #[serde(default)]
    pub shards: Option<u32>,
    /// Identify rate limit information.
    #[serde(default)]
    pub session_start_limit: Option<SessionStartLimit>,
}

/// Identify rate limit information.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionStartLimit {
    /// Total identifies allowed per reset window.
    pub total: u32,
    /// Identifies left in the current window.
    pub remaining: u32,
    /// Milliseconds until the window resets.
    pub reset_after: u64,
}

/// Minimal Discord REST client.
#[derive(Clone)]
pub struct DiscordApi {
    http: Arc<dyn HttpClientCapability>,
    api_base: String,
    token: String,
}

impl DiscordApi {
    /// Creates a client for `api_base` authenticating with a bot token.
    pub fn new(
        http: Arc<dyn HttpClientCapability>,
        api_base: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    /// Discovers the gateway endpoint.
    pub async fn get_gateway_bot(&self) -> Result<GatewayBot, GatewayError> {
        let request = HttpRequest::get(format!("{}/gateway/bot", self.api_base))
            .header("Authorization", format!("Bot {}", self.token));
        let value = self
            .http
            .request(request)
            .await
            .map_err(|e| GatewayError::Discovery(e.to_string()))?;
        let gateway: GatewayBot =
            serde_json::from_value(value).map_err(|e| GatewayError::Discovery(e.to_string()))?;

        debug!(url = %gateway.url, shards = ?gateway.shards, "Gateway discovered");
        if let Some(limit) = &gateway.session_start_limit
            && limit.remaining == 0
        {
            warn!(reset_after_ms = limit.reset_after, "Identify limit exhausted");
        }
        Ok(gateway)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bronze_core::{Download, TransportError, TransportResult};
    use parking_lot::Mutex;
    use serde_json::{Value, json};

    struct FakeHttp {
        response: TransportResult<Value>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    #[async_trait]
    impl HttpClientCapability for FakeHttp {
        async fn request(&self, request: HttpRequest) -> TransportResult<Value> {
            self.requests.lock().push(request);
            self.response.clone()
        }

        async fn download(&self, _url: &str) -> TransportResult<Download> {
            Err(TransportError::NotAvailable { transport: "download" })
        }
    }

    #[tokio::test]
    async fn test_get_gateway_bot() {
        let http = Arc::new(FakeHttp {
            response: Ok(json!({"url": "wss://gateway.discord.gg", "shards": 1})),
            requests: Mutex::new(Vec::new()),
        });
        let api = DiscordApi::new(http.clone(), "https://discord.com/api/v10/", "tok");

        let gateway = api.get_gateway_bot().await.unwrap();
        assert_eq!(gateway.url, "wss://gateway.discord.gg");

        let requests = http.requests.lock();
        assert_eq!(requests[0].url, "https://discord.com/api/v10/gateway/bot");
        assert_eq!(
            requests[0].headers,
            vec![("Authorization".to_string(), "Bot tok".to_string())]
        );
    }

    #[tokio::test]
    async fn test_discovery_failure() {
        let http = Arc::new(FakeHttp {
            response: Err(TransportError::Http {
                status: 401,
                body: "unauthorized".into(),
            }),
            requests: Mutex::new(Vec::new()),
        });
        let api = DiscordApi::new(http, "https://discord.com/api/v10", "bad");

        assert!(matches!(
            api.get_gateway_bot().await,
            Err(GatewayError::Discovery(_))
        ));
    }
}
