//! HTTP client capability implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, ClientBuilder, RequestBuilder};
use serde_json::Value;
use tracing::{debug, trace};

use bronze_core::{
    Download, FormValue, HttpBody, HttpClientCapability, HttpMethod, HttpRequest,
    TransportError, TransportResult,
};

/// HTTP client capability implementation.
pub struct HttpClientCapabilityImpl {
    client: Client,
}

impl HttpClientCapabilityImpl {
    /// Creates a new HTTP client capability with a 30 second timeout.
    pub fn new() -> TransportResult<Self> {
        Self::with_timeout(Duration::from_secs(30))
    }

    /// Creates with custom timeout.
    pub fn with_timeout(timeout: Duration) -> TransportResult<Self> {
        let client = ClientBuilder::new()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::InvalidConfig(format!("HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Wraps an existing client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    fn build(&self, request: HttpRequest) -> TransportResult<RequestBuilder> {
        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        builder = match request.body {
            HttpBody::Empty => builder,
            HttpBody::Json(body) => builder.json(&body),
            HttpBody::Multipart(parts) => {
                let mut form = Form::new();
                for part in parts {
                    form = match part.value {
                        FormValue::Text(text) => form.text(part.name, text),
                        FormValue::File {
                            data,
                            filename,
                            mime,
                        } => {
                            let file = Part::bytes(data)
                                .file_name(filename)
                                .mime_str(&mime)
                                .map_err(|e| {
                                    TransportError::SendFailed(format!("invalid mime {mime}: {e}"))
                                })?;
                            form.part(part.name, file)
                        }
                    };
                }
                builder.multipart(form)
            }
        };
        Ok(builder)
    }
}

#[async_trait]
impl HttpClientCapability for HttpClientCapabilityImpl {
    async fn request(&self, request: HttpRequest) -> TransportResult<Value> {
        let url = redact_url(&request.url);
        debug!(method = ?request.method, url = %url, "HTTP request");

        let resp = self
            .build(request)?
            .send()
            .await
            .map_err(|e| TransportError::ConnectionFailed {
                url: url.clone(),
                reason: e.without_url().to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(TransportError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let value = resp
            .json::<Value>()
            .await
            .map_err(|e| {
                TransportError::Io(format!("invalid JSON from {url}: {}", e.without_url()))
            })?;
        trace!(url = %url, "HTTP response received");
        Ok(value)
    }

    async fn download(&self, url: &str) -> TransportResult<Download> {
        let redacted = redact_url(url);
        debug!(url = %redacted, "Downloading");
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TransportError::ConnectionFailed {
                url: redacted,
                reason: e.without_url().to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(TransportError::Http {
                status: status.as_u16(),
                body: String::new(),
            });
        }

        let mime = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_string());
        let filename = filename_from_url(resp.url().path());
        let data = resp
            .bytes()
            .await
            .map_err(|e| TransportError::Io(e.without_url().to_string()))?
            .to_vec();

        Ok(Download {
            data,
            mime,
            filename,
        })
    }
}

/// Renders a URL for logs and errors: origin and last path segment only.
///
/// Bot API URLs carry the token in the path, so the rest of the path and the
/// query are never printed.
fn redact_url(raw: &str) -> String {
    let Ok(url) = reqwest::Url::parse(raw) else {
        return "<invalid url>".to_string();
    };
    let origin = url.origin().ascii_serialization();
    match url
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
    {
        Some(last) => format!("{origin}/.../{last}"),
        None => origin,
    }
}

/// Returns the last non-empty path segment.
fn filename_from_url(path: &str) -> Option<String> {
    path.rsplit('/')
        .find(|segment| !segment.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filename_from_url() {
        assert_eq!(filename_from_url("/a/b/cat.png"), Some("cat.png".into()));
        assert_eq!(filename_from_url("/a/dir/"), Some("dir".into()));
        assert_eq!(filename_from_url("/"), None);
    }

    #[test]
    fn test_redact_url_hides_path_and_query() {
        assert_eq!(
            redact_url("https://api.telegram.org/bot123:SECRET/sendMessage?x=1"),
            "https://api.telegram.org/.../sendMessage"
        );
        assert_eq!(redact_url("http://127.0.0.1:8080/"), "http://127.0.0.1:8080");
        assert_eq!(redact_url("not a url"), "<invalid url>");
    }

    #[tokio::test]
    async fn test_connection_error_omits_token() {
        let client = HttpClientCapabilityImpl::new().unwrap();
        let err = client
            .request(HttpRequest::post("http://127.0.0.1:1/bot123:SECRET/getMe"))
            .await
            .unwrap_err();

        let text = err.to_string();
        assert!(matches!(err, TransportError::ConnectionFailed { .. }));
        assert!(!text.contains("SECRET"), "{text}");
        assert!(text.contains("getMe"), "{text}");
    }

    #[test]
    fn test_build_rejects_bad_mime() {
        let client = HttpClientCapabilityImpl::from_client(Client::new());
        let request = HttpRequest::post("http://localhost/upload").multipart(vec![
            bronze_core::FormPart::file("photo", vec![1, 2], "a.png", "not a mime"),
        ]);
        assert!(client.build(request).is_err());
    }
}
