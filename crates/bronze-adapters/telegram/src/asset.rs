//! Asset resolution.
//!
//! Media elements only carry a URL. Before upload the encoder resolves it
//! into bytes, a content type and a file name.

use std::sync::Arc;

use async_trait::async_trait;
use bronze_core::{HttpClientCapability, Media};
use tracing::debug;

use crate::error::EncodeError;

/// Resolved media content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub data: Vec<u8>,
    pub mime: String,
    pub filename: String,
}

/// Fetches media content.
#[async_trait]
pub trait AssetResolver: Send + Sync {
    /// Resolves a media reference.
    async fn resolve(&self, media: &Media) -> Result<Asset, EncodeError>;
}

/// [`AssetResolver`] that downloads over HTTP.
pub struct HttpAssetResolver {
    http: Arc<dyn HttpClientCapability>,
}

impl HttpAssetResolver {
    /// Creates a resolver.
    pub fn new(http: Arc<dyn HttpClientCapability>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl AssetResolver for HttpAssetResolver {
    async fn resolve(&self, media: &Media) -> Result<Asset, EncodeError> {
        let download = self
            .http
            .download(&media.url)
            .await
            .map_err(|e| EncodeError::Asset {
                url: media.url.clone(),
                reason: e.to_string(),
            })?;

        let filename = media
            .filename
            .clone()
            .or(download.filename)
            .unwrap_or_else(|| media.kind.as_str().to_string());
        let mime = download
            .mime
            .filter(|mime| !mime.is_empty() && mime != "application/octet-stream")
            .unwrap_or_else(|| guess_mime(&filename).to_string());

        debug!(url = %media.url, mime = %mime, bytes = download.data.len(), "Asset resolved");
        Ok(Asset {
            data: download.data,
            mime,
            filename,
        })
    }
}

/// Guesses a content type from a file extension.
pub fn guess_mime(filename: &str) -> &'static str {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mp3" => "audio/mpeg",
        "ogg" | "oga" => "audio/ogg",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bronze_core::{Download, HttpRequest, TransportResult};
    use serde_json::Value;

    struct FakeDownloads(Download);

    #[async_trait]
    impl HttpClientCapability for FakeDownloads {
        async fn request(&self, _request: HttpRequest) -> TransportResult<Value> {
            Ok(Value::Null)
        }

        async fn download(&self, _url: &str) -> TransportResult<Download> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn test_resolve_prefers_element_filename_and_guesses_mime() {
        let resolver = HttpAssetResolver::new(Arc::new(FakeDownloads(Download {
            data: vec![1],
            mime: Some("application/octet-stream".into()),
            filename: Some("blob".into()),
        })));

        let asset = resolver
            .resolve(&Media::image("https://x/y").with_filename("dance.gif"))
            .await
            .unwrap();
        assert_eq!(asset.filename, "dance.gif");
        assert_eq!(asset.mime, "image/gif");
    }

    #[tokio::test]
    async fn test_resolve_keeps_server_mime() {
        let resolver = HttpAssetResolver::new(Arc::new(FakeDownloads(Download {
            data: vec![1],
            mime: Some("image/png".into()),
            filename: None,
        })));

        let asset = resolver.resolve(&Media::image("https://x/y")).await.unwrap();
        assert_eq!(asset.filename, "image");
        assert_eq!(asset.mime, "image/png");
    }
}
