//! Build the outbound multipart request for one host

use std::time::Duration;

use bytes::Bytes;
use reqwest::Method;
use reqwest::multipart::{Form, Part};

use super::error::AttemptError;
use super::payload::ImagePayload;
use crate::hosts::HostDefinition;
use crate::humanize::ByteSize;

/// Cap on a host's reply; upload answers are small JSON documents
pub const HOST_REPLY_LIMIT: ByteSize = ByteSize::mib(1);

/// One file sent as a single multipart/form-data part
#[derive(Debug, Clone, PartialEq)]
pub struct FilePart {
    pub field: String,
    pub filename: String,
    pub mime_type: String,
    pub bytes: Bytes,
}

impl FilePart {
    /// Hand the part to reqwest's form encoder
    pub fn to_form(&self) -> Result<Form, reqwest::Error> {
        let part = Part::bytes(self.bytes.to_vec())
            .file_name(self.filename.clone())
            .mime_str(&self.mime_type)?;
        Ok(Form::new().part(self.field.clone(), part))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    #[default]
    Empty,
    Multipart(FilePart),
}

/// Fully prepared HTTP request; the transport turns it into wire format
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: String,
    /// Applied after the body, so they win over generated headers
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
    pub timeout: Duration,
    /// Largest response body the caller is willing to buffer
    pub max_response_bytes: ByteSize,
}

impl OutboundRequest {
    pub fn get(url: impl Into<String>, timeout: Duration, max_response_bytes: ByteSize) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            headers: Vec::new(),
            body: RequestBody::Empty,
            timeout,
            max_response_bytes,
        }
    }

    /// First value for `name`, compared case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Replace any existing value for `name`, or append it
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
    }

    pub fn file_part(&self) -> Option<&FilePart> {
        match &self.body {
            RequestBody::Multipart(part) => Some(part),
            RequestBody::Empty => None,
        }
    }
}

/// Encode `payload` the way `host` wants it. Performs no I/O.
pub fn encode(host: &HostDefinition, payload: &ImagePayload) -> Result<OutboundRequest, AttemptError> {
    if payload.is_empty() {
        return Err(AttemptError::InvalidInput("image is empty".to_string()));
    }
    if host.response_url_path.trim().is_empty() {
        return Err(AttemptError::Configuration(format!(
            "host '{}' has no response URL path",
            host.name
        )));
    }
    let api_key = host.api_key();
    if host.requires_api_key && api_key.is_none() {
        return Err(AttemptError::Configuration(format!(
            "host '{}' requires an API key",
            host.name
        )));
    }
    if host.max_file_size.is_exceeded_by(payload.len()) {
        return Err(AttemptError::PayloadTooLarge {
            size: payload.len(),
            limit: host.max_file_size.as_u64(),
        });
    }
    if payload.mime_type.parse::<mime::Mime>().is_err() {
        return Err(AttemptError::InvalidInput(format!(
            "invalid mime type '{}'",
            payload.mime_type
        )));
    }

    let part = FilePart {
        field: host.form_field.clone(),
        filename: payload.filename.clone(),
        mime_type: payload.mime_type.clone(),
        bytes: payload.bytes.clone(),
    };

    let mut request = OutboundRequest {
        method: host.method.as_reqwest(),
        url: host.url.clone(),
        headers: Vec::with_capacity(host.headers.len() + 1),
        body: RequestBody::Multipart(part),
        timeout: host.timeout(),
        max_response_bytes: HOST_REPLY_LIMIT,
    };
    for (name, value) in &host.headers {
        request.set_header(name.as_str(), value.as_str());
    }
    if let Some(key) = api_key {
        request.set_header(host.api_key_header.as_str(), key);
    }

    Ok(request)
}
