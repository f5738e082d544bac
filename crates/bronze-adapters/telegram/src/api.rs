//! Bot API client.
//!
//! [`TelegramApi`] is the seam the encoder sends through; [`HttpTelegramApi`]
//! implements it over the transport's HTTP client capability.

use std::sync::Arc;

use async_trait::async_trait;
use bronze_core::{
    ApiError, ApiResult, FormPart, HttpClientCapability, HttpRequest, TransportError,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::TelegramConfig;
use crate::endpoint::MediaEndpoint;
use crate::model::{ApiResponse, TgMessage, TgUser};

/// Parameters of `sendMessage`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendMessage {
    pub chat_id: String,
    pub text: String,
    pub parse_mode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_message_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_thread_id: Option<i64>,
    pub disable_web_page_preview: bool,
}

/// The Bot API calls the adapter needs.
#[async_trait]
pub trait TelegramApi: Send + Sync {
    /// `getMe`.
    async fn get_me(&self) -> ApiResult<TgUser>;

    /// `sendMessage`.
    async fn send_message(&self, params: SendMessage) -> ApiResult<TgMessage>;

    /// A multipart media upload through `endpoint`.
    async fn send_media(
        &self,
        endpoint: MediaEndpoint,
        form: Vec<FormPart>,
    ) -> ApiResult<TgMessage>;
}

/// [`TelegramApi`] over HTTP.
pub struct HttpTelegramApi {
    http: Arc<dyn HttpClientCapability>,
    config: TelegramConfig,
}

impl HttpTelegramApi {
    /// Creates a client.
    pub fn new(http: Arc<dyn HttpClientCapability>, config: TelegramConfig) -> Self {
        Self { http, config }
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, request: HttpRequest) -> ApiResult<T> {
        debug!(method = %method, "Bot API call");
        match self.http.request(request).await {
            Ok(value) => unwrap_response(value),
            // Failed calls still carry the JSON envelope.
            Err(TransportError::Http { status, body }) => {
                match serde_json::from_str::<ApiResponse<Value>>(&body) {
                    Ok(resp) => {
                        let code = resp.error_code.unwrap_or(status.into());
                        let err = rejection(code, resp.description);
                        warn!(method = %method, error = %err, "Bot API call rejected");
                        Err(err)
                    }
                    Err(_) => Err(TransportError::Http { status, body }.into()),
                }
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn rejection(code: i64, description: Option<String>) -> ApiError {
    ApiError::Rejected {
        code,
        message: description.unwrap_or_default(),
    }
}

fn unwrap_response<T: DeserializeOwned>(value: Value) -> ApiResult<T> {
    let resp: ApiResponse<T> = serde_json::from_value(value)?;
    if !resp.ok {
        return Err(rejection(resp.error_code.unwrap_or_default(), resp.description));
    }
    resp.result
        .ok_or_else(|| ApiError::Other("response carried no result".into()))
}

#[async_trait]
impl TelegramApi for HttpTelegramApi {
    async fn get_me(&self) -> ApiResult<TgUser> {
        let request = HttpRequest::post(self.config.method_url("getMe"));
        self.call("getMe", request).await
    }

    async fn send_message(&self, params: SendMessage) -> ApiResult<TgMessage> {
        let body = serde_json::to_value(params)?;
        let request = HttpRequest::post(self.config.method_url("sendMessage")).json(body);
        self.call("sendMessage", request).await
    }

    async fn send_media(
        &self,
        endpoint: MediaEndpoint,
        form: Vec<FormPart>,
    ) -> ApiResult<TgMessage> {
        let request = HttpRequest::post(self.config.method_url(endpoint.method())).multipart(form);
        self.call(endpoint.method(), request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bronze_core::{Download, HttpBody, TransportResult};
    use parking_lot::Mutex;
    use serde_json::json;

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

    fn api(response: TransportResult<Value>) -> (HttpTelegramApi, Arc<FakeHttp>) {
        let http = Arc::new(FakeHttp {
            response,
            requests: Mutex::new(Vec::new()),
        });
        let config = TelegramConfig {
            token: "T".into(),
            ..Default::default()
        };
        (HttpTelegramApi::new(http.clone(), config), http)
    }

    #[tokio::test]
    async fn test_send_message_posts_json() {
        let (api, http) = api(Ok(json!({
            "ok": true,
            "result": {"message_id": 1, "date": 0, "chat": {"id": 5, "type": "private"}},
        })));
        let msg = api
            .send_message(SendMessage {
                chat_id: "5".into(),
                text: "hi".into(),
                parse_mode: "html".into(),
                reply_to_message_id: None,
                message_thread_id: None,
                disable_web_page_preview: true,
            })
            .await
            .unwrap();
        assert_eq!(msg.message_id, 1);

        let requests = http.requests.lock();
        assert_eq!(requests[0].url, "https://api.telegram.org/botT/sendMessage");
        let HttpBody::Json(body) = &requests[0].body else {
            panic!("expected JSON body");
        };
        assert_eq!(body["text"], "hi");
        assert!(body.get("reply_to_message_id").is_none());
    }

    #[tokio::test]
    async fn test_http_error_envelope_is_rejection() {
        let (api, _) = api(Err(TransportError::Http {
            status: 400,
            body: r#"{"ok":false,"error_code":400,"description":"Bad Request: chat not found"}"#
                .into(),
        }));
        let err = api.get_me().await.unwrap_err();
        assert!(matches!(
            err,
            ApiError::Rejected { code: 400, ref message } if message.contains("chat not found")
        ));
    }
}
