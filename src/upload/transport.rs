//! HTTP transport shared by host uploads and remote image fetches

use std::time::Duration;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use reqwest::Client;
use reqwest::header::{HeaderName, HeaderValue};
use tracing::debug;

use super::encoder::{OutboundRequest, RequestBody};
use super::error::TransportError;
use crate::humanize::ByteSize;

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends a prepared request and hands back status plus body.
///
/// Implementations must honour `request.timeout` and stop reading once the
/// body passes `request.max_response_bytes`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: OutboundRequest) -> Result<HttpResponse, TransportError>;
}

#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub connect_timeout: Duration,
    pub max_redirects: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            max_redirects: 10,
        }
    }
}

/// Production transport backed by a pooled reqwest client
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(config: TransportConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()
            .map_err(|e| TransportError::Request(e.to_string()))?;
        Ok(Self { client })
    }

    /// Turn `request` into a reqwest request without sending it.
    ///
    /// The multipart encoder sets `Content-Type` with its boundary; caller
    /// headers are applied afterwards and replace same-named ones.
    pub fn build(&self, request: &OutboundRequest) -> Result<reqwest::Request, TransportError> {
        let mut builder = self
            .client
            .request(request.method.clone(), &request.url)
            .timeout(request.timeout);
        if let RequestBody::Multipart(part) = &request.body {
            let form = part
                .to_form()
                .map_err(|e| TransportError::Request(e.to_string()))?;
            builder = builder.multipart(form);
        }

        let mut built = builder
            .build()
            .map_err(|e| TransportError::Request(e.to_string()))?;
        for (name, value) in &request.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| TransportError::Request(format!("invalid header name '{name}'")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| TransportError::Request(format!("invalid value for header '{name}'")))?;
            built.headers_mut().insert(name, value);
        }
        Ok(built)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: OutboundRequest) -> Result<HttpResponse, TransportError> {
        debug!(method = %request.method, url = %request.url, "Sending request");

        let built = self.build(&request)?;
        let response = self.client.execute(built).await.map_err(classify)?;
        let status = response.status().as_u16();
        let body = read_limited(response, request.max_response_bytes).await?;

        debug!(status, size = body.len(), "Received response");
        Ok(HttpResponse { status, body })
    }
}

/// Collect the body chunk by chunk, giving up as soon as it passes `limit`
async fn read_limited(
    mut response: reqwest::Response,
    limit: ByteSize,
) -> Result<Bytes, TransportError> {
    let declared = response.content_length();
    if let Some(len) = declared {
        if len > limit.as_u64() {
            return Err(TransportError::TooLarge {
                size: len,
                limit: limit.as_u64(),
            });
        }
    }

    let mut buf = BytesMut::with_capacity(declared.unwrap_or(0) as usize);
    while let Some(chunk) = response.chunk().await.map_err(body_error)? {
        let total = buf.len() + chunk.len();
        if limit.is_exceeded_by(total) {
            return Err(TransportError::TooLarge {
                size: total as u64,
                limit: limit.as_u64(),
            });
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf.freeze())
}

fn classify(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_connect() {
        TransportError::Connect(err.to_string())
    } else {
        TransportError::Request(err.to_string())
    }
}

fn body_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Body(err.to_string())
    }
}
