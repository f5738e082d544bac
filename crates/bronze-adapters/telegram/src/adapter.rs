//! Telegram adapter for the Bronze runtime.
//!
//! The adapter reads its configuration from `adapters.telegram`:
//!
//! ```yaml
//! adapters:
//!   telegram:
//!     token: ${TELEGRAM_TOKEN}
//!     link_preview: false
//! ```
//!
//! Starting calls `getMe` to learn the bot's id, then signals the bot online.
//! Sends go through [`TelegramBot`], available once started.

use std::sync::Arc;

use async_trait::async_trait;
use bronze_core::{
    Adapter, AdapterContext, AdapterError, AdapterResult, ConfigurableAdapter, TransportError,
};
use parking_lot::Mutex;
use tracing::info;

use crate::api::{HttpTelegramApi, TelegramApi};
use crate::asset::HttpAssetResolver;
use crate::bot::TelegramBot;
use crate::config::TelegramConfig;

/// The Telegram Bot API adapter.
#[derive(Default)]
pub struct TelegramAdapter {
    /// Adapter configuration.
    config: TelegramConfig,
    /// The started bot.
    bot: Mutex<Option<Arc<TelegramBot>>>,
}

impl TelegramAdapter {
    /// Creates an adapter from a configuration.
    pub fn new(config: TelegramConfig) -> Self {
        Self {
            config,
            bot: Mutex::new(None),
        }
    }

    /// Returns the adapter configuration.
    pub fn config(&self) -> &TelegramConfig {
        &self.config
    }

    /// Returns the bot, once started.
    pub fn bot(&self) -> Option<Arc<TelegramBot>> {
        self.bot.lock().clone()
    }
}

#[async_trait]
impl Adapter for TelegramAdapter {
    fn name() -> &'static str {
        "telegram"
    }

    async fn on_start(&self, ctx: &mut AdapterContext) -> AdapterResult<()> {
        if self.config.token.is_empty() {
            return Err(AdapterError::config("adapters.telegram.token is empty"));
        }

        let http_client = ctx
            .transport()
            .http_client()
            .cloned()
            .ok_or(TransportError::NotAvailable {
                transport: "http-client",
            })?;

        let api = Arc::new(HttpTelegramApi::new(http_client.clone(), self.config.clone()));
        let me = api.get_me().await?;
        let self_id = me.id.to_string();

        let bot = Arc::new(TelegramBot::new(
            self_id.clone(),
            api,
            Arc::new(HttpAssetResolver::new(http_client)),
            ctx.host().clone(),
            self.config.link_preview,
        ));
        *self.bot.lock() = Some(bot);

        info!(
            bot_id = %self_id,
            username = me.username.as_deref().unwrap_or_default(),
            "Telegram bot online"
        );
        ctx.host().online(&self_id);
        Ok(())
    }

    async fn on_shutdown(&self, ctx: &mut AdapterContext) -> AdapterResult<()> {
        if let Some(bot) = self.bot.lock().take() {
            info!(bot_id = %bot.self_id(), "Telegram bot offline");
            ctx.host().offline(bot.self_id());
        }
        Ok(())
    }
}

impl ConfigurableAdapter for TelegramAdapter {
    type Config = TelegramConfig;

    fn from_config(config: Self::Config) -> AdapterResult<Arc<Self>> {
        Ok(Arc::new(Self::new(config)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bronze_core::{
        Download, Element, HostBus, HostEvent, HttpClientCapability, HttpRequest,
        TransportContext, TransportResult,
    };
    use serde_json::{Value, json};

    use crate::bot::SendOptions;

    /// Answers every call with a canned envelope keyed by method name.
    struct FakeHttp {
        requests: Mutex<Vec<HttpRequest>>,
    }

    #[async_trait]
    impl HttpClientCapability for FakeHttp {
        async fn request(&self, request: HttpRequest) -> TransportResult<Value> {
            let response = if request.url.ends_with("/getMe") {
                json!({"ok": true, "result": {"id": 42, "is_bot": true, "first_name": "bronze"}})
            } else {
                json!({"ok": true, "result": {
                    "message_id": 7,
                    "date": 2,
                    "chat": {"id": 10, "type": "private"},
                    "text": "hi"
                }})
            };
            self.requests.lock().push(request);
            Ok(response)
        }

        async fn download(&self, _url: &str) -> TransportResult<Download> {
            Err(TransportError::NotAvailable {
                transport: "download",
            })
        }
    }

    fn context(http: Arc<FakeHttp>, bus: &HostBus) -> AdapterContext {
        AdapterContext::new(
            TransportContext::new().with_http_client(http),
            Arc::new(bus.clone()),
        )
    }

    fn config() -> TelegramConfig {
        TelegramConfig {
            token: "123:abc".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_start_send_shutdown() {
        let http = Arc::new(FakeHttp {
            requests: Mutex::new(Vec::new()),
        });
        let bus = HostBus::default();
        let mut events = bus.subscribe();
        let mut ctx = context(http.clone(), &bus);

        let adapter = TelegramAdapter::new(config());
        adapter.on_start(&mut ctx).await.unwrap();
        assert_eq!(
            events.recv().await.unwrap(),
            HostEvent::Online {
                bot_id: "42".into()
            }
        );

        let bot = adapter.bot().unwrap();
        let sent = bot
            .send("10", None, &[Element::text("hi")], SendOptions::default())
            .await
            .unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].message_id, "7");
        assert!(matches!(events.recv().await.unwrap(), HostEvent::Sent(s) if s.message_id == "7"));
        assert_eq!(
            http.requests.lock()[1].url,
            "https://api.telegram.org/bot123:abc/sendMessage"
        );

        adapter.on_shutdown(&mut ctx).await.unwrap();
        assert!(adapter.bot().is_none());
        assert_eq!(
            events.recv().await.unwrap(),
            HostEvent::Offline {
                bot_id: "42".into()
            }
        );
    }

    #[tokio::test]
    async fn test_start_requires_token() {
        let http = Arc::new(FakeHttp {
            requests: Mutex::new(Vec::new()),
        });
        let bus = HostBus::default();
        let mut ctx = context(http, &bus);

        let adapter = TelegramAdapter::default();
        assert!(matches!(
            adapter.on_start(&mut ctx).await,
            Err(AdapterError::Config(_))
        ));
    }
}
