use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use super::mime::{extension_from_url, mime_for_extension};
use crate::config::FetcherConfig;
use crate::upload::{ImagePayload, OutboundRequest, Transport, TransportError};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("invalid image URL: {0}")]
    InvalidUrl(String),

    #[error("remote server answered HTTP {0}")]
    Status(u16),

    #[error(transparent)]
    Transport(TransportError),

    #[error("remote image of {size} bytes exceeds limit of {limit} bytes")]
    TooLarge { size: u64, limit: u64 },

    #[error("remote server returned an empty body")]
    Empty,
}

/// Downloads an image by URL so it can be re-hosted
#[derive(Clone)]
pub struct RemoteImageFetcher {
    transport: Arc<dyn Transport>,
    config: FetcherConfig,
}

impl RemoteImageFetcher {
    pub fn new(transport: Arc<dyn Transport>, config: FetcherConfig) -> Self {
        Self { transport, config }
    }

    pub async fn fetch(&self, raw_url: &str) -> Result<ImagePayload, FetchError> {
        let url = parse_image_url(raw_url)?;

        let timeout = Duration::from_millis(self.config.timeout_ms);
        let mut request = OutboundRequest::get(url.as_str(), timeout, self.config.max_bytes);
        request.set_header("User-Agent", self.config.user_agent.as_str());
        request.set_header("Referer", self.config.referer.as_str());
        request.set_header("Accept", self.config.accept.as_str());

        debug!(url = %url, "Fetching remote image");
        let response = self.transport.send(request).await.map_err(|e| {
            warn!(url = %url, error = %e, "Remote image fetch failed");
            FetchError::from(e)
        })?;

        if !response.is_success() {
            warn!(url = %url, status = response.status, "Remote image fetch rejected");
            return Err(FetchError::Status(response.status));
        }
        if response.body.is_empty() {
            return Err(FetchError::Empty);
        }
        let limit = self.config.max_bytes.as_u64();
        if self.config.max_bytes.is_exceeded_by(response.body.len()) {
            return Err(FetchError::TooLarge {
                size: response.body.len() as u64,
                limit,
            });
        }

        let ext = extension_from_url(&url);
        let filename = format!("converted_{}.{ext}", chrono::Utc::now().timestamp_millis());
        info!(url = %url, size = response.body.len(), filename = %filename, "Fetched remote image");

        Ok(ImagePayload::new(response.body, filename, mime_for_extension(&ext)))
    }
}

impl From<TransportError> for FetchError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::TooLarge { size, limit } => FetchError::TooLarge { size, limit },
            other => FetchError::Transport(other),
        }
    }
}

fn parse_image_url(raw: &str) -> Result<Url, FetchError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(FetchError::InvalidUrl("URL is empty".to_string()));
    }
    let url = Url::parse(trimmed).map_err(|e| FetchError::InvalidUrl(format!("{trimmed}: {e}")))?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(url),
        scheme => Err(FetchError::InvalidUrl(format!(
            "unsupported scheme '{scheme}' in {trimmed}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use bytes::Bytes;

    use super::*;
    use crate::upload::HttpResponse;

    struct Canned {
        status: u16,
        body: &'static [u8],
        seen: Mutex<Vec<OutboundRequest>>,
    }

    impl Canned {
        fn new(status: u16, body: &'static [u8]) -> Arc<Self> {
            Arc::new(Self {
                status,
                body,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Transport for Canned {
        async fn send(&self, request: OutboundRequest) -> Result<HttpResponse, TransportError> {
            self.seen.lock().unwrap().push(request);
            Ok(HttpResponse {
                status: self.status,
                body: Bytes::from_static(self.body),
            })
        }
    }

    fn fetcher(transport: Arc<Canned>) -> RemoteImageFetcher {
        RemoteImageFetcher::new(transport, FetcherConfig::default())
    }

    #[tokio::test]
    async fn test_fetch_builds_payload() {
        let transport = Canned::new(200, b"GIF89a");
        let payload = fetcher(transport.clone())
            .fetch("https://img.example.com/a/b/anim.GIF?x=1")
            .await
            .unwrap();

        assert_eq!(payload.mime_type, "image/gif");
        assert!(payload.filename.starts_with("converted_"));
        assert!(payload.filename.ends_with(".gif"));

        let seen = transport.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].header("user-agent").is_some());
        assert!(seen[0].header("referer").is_some());
        assert!(seen[0].header("accept").unwrap().contains("image/"));
    }

    #[tokio::test]
    async fn test_invalid_urls_never_hit_the_network() {
        let transport = Canned::new(200, b"x");
        let fetcher = fetcher(transport.clone());

        for raw in ["", "not a url", "ftp://files.example.com/a.png", "file:///etc/passwd"] {
            let err = fetcher.fetch(raw).await.unwrap_err();
            assert!(matches!(err, FetchError::InvalidUrl(_)), "{raw}: {err:?}");
        }
        assert!(transport.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_non_success_status() {
        let err = fetcher(Canned::new(404, b"missing"))
            .fetch("https://img.example.com/a.png")
            .await
            .unwrap_err();
        assert_eq!(err, FetchError::Status(404));
    }

    #[tokio::test]
    async fn test_empty_body() {
        let err = fetcher(Canned::new(200, b""))
            .fetch("https://img.example.com/a.png")
            .await
            .unwrap_err();
        assert_eq!(err, FetchError::Empty);
    }

    #[tokio::test]
    async fn test_body_over_cap() {
        let mut config = FetcherConfig::default();
        config.max_bytes = crate::humanize::ByteSize(3);
        let err = RemoteImageFetcher::new(Canned::new(200, b"abcd"), config)
            .fetch("https://img.example.com/a.png")
            .await
            .unwrap_err();
        assert_eq!(err, FetchError::TooLarge { size: 4, limit: 3 });
    }

    #[tokio::test]
    async fn test_cap_travels_with_the_request() {
        let transport = Canned::new(200, b"GIF89a");
        fetcher(transport.clone())
            .fetch("https://img.example.com/a.gif")
            .await
            .unwrap();

        let seen = transport.seen.lock().unwrap();
        assert_eq!(seen[0].max_response_bytes, FetcherConfig::default().max_bytes);
    }

    #[test]
    fn test_transport_overflow_becomes_too_large() {
        let err = FetchError::from(TransportError::TooLarge { size: 2048, limit: 1024 });
        assert_eq!(err, FetchError::TooLarge { size: 2048, limit: 1024 });
        assert_eq!(
            FetchError::from(TransportError::Timeout),
            FetchError::Transport(TransportError::Timeout)
        );
    }
}
