use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::humanize::ByteSize;

pub type HeadersMap = BTreeMap<String, String>;

/// HTTP verb used for the upload call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Post,
    Put,
    Patch,
}

impl HttpMethod {
    pub fn as_reqwest(self) -> reqwest::Method {
        match self {
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
        }
    }
}

/// One external image host: where to send the file and how to read the reply.
///
/// Providers differ only in data. A new host is a new row, never new code.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct HostDefinition {
    pub id: u64,
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub method: HttpMethod,
    #[serde(default = "default_form_field")]
    pub form_field: String,
    #[serde(default)]
    pub headers: HeadersMap,
    #[serde(default)]
    pub requires_api_key: bool,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_api_key_header")]
    pub api_key_header: String,
    #[serde(default = "default_success_code")]
    pub success_code: String,
    #[serde(default)]
    pub success_field: Option<String>,
    #[serde(default)]
    pub success_value: Option<String>,
    pub response_url_path: String,
    #[serde(default)]
    pub priority: i32,
    #[serde(default = "default_enabled")]
    pub is_enabled: bool,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_max_file_size")]
    pub max_file_size: ByteSize,
    #[serde(default)]
    pub description: Option<String>,
}

/// Insert form of a host definition; the store assigns the id
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NewHost {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub method: HttpMethod,
    #[serde(default = "default_form_field")]
    pub form_field: String,
    #[serde(default)]
    pub headers: HeadersMap,
    #[serde(default)]
    pub requires_api_key: bool,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_api_key_header")]
    pub api_key_header: String,
    #[serde(default = "default_success_code")]
    pub success_code: String,
    #[serde(default)]
    pub success_field: Option<String>,
    #[serde(default)]
    pub success_value: Option<String>,
    #[serde(default)]
    pub response_url_path: String,
    #[serde(default)]
    pub priority: i32,
    #[serde(default = "default_enabled")]
    pub is_enabled: bool,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_max_file_size")]
    pub max_file_size: ByteSize,
    #[serde(default)]
    pub description: Option<String>,
}

impl NewHost {
    /// Minimal host posting `file` to `url` and reading the link from `response_url_path`
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        response_url_path: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            method: HttpMethod::default(),
            form_field: default_form_field(),
            headers: HeadersMap::new(),
            requires_api_key: false,
            api_key: None,
            api_key_header: default_api_key_header(),
            success_code: default_success_code(),
            success_field: None,
            success_value: None,
            response_url_path: response_url_path.into(),
            priority: 0,
            is_enabled: default_enabled(),
            timeout_ms: default_timeout_ms(),
            max_file_size: default_max_file_size(),
            description: None,
        }
    }

    pub fn into_definition(self, id: u64) -> HostDefinition {
        HostDefinition {
            id,
            name: self.name,
            url: self.url,
            method: self.method,
            form_field: self.form_field,
            headers: self.headers,
            requires_api_key: self.requires_api_key,
            api_key: self.api_key,
            api_key_header: self.api_key_header,
            success_code: self.success_code,
            success_field: self.success_field,
            success_value: self.success_value,
            response_url_path: self.response_url_path,
            priority: self.priority,
            is_enabled: self.is_enabled,
            timeout_ms: self.timeout_ms,
            max_file_size: self.max_file_size,
            description: self.description,
        }
    }
}

/// Partial update of a host definition.
///
/// Absent fields stay untouched. For the optional text fields an empty
/// string clears the stored value.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct HostPatch {
    pub name: Option<String>,
    pub url: Option<String>,
    pub method: Option<HttpMethod>,
    pub form_field: Option<String>,
    pub headers: Option<HeadersMap>,
    pub requires_api_key: Option<bool>,
    pub api_key: Option<String>,
    pub api_key_header: Option<String>,
    pub success_code: Option<String>,
    pub success_field: Option<String>,
    pub success_value: Option<String>,
    pub response_url_path: Option<String>,
    pub priority: Option<i32>,
    pub is_enabled: Option<bool>,
    pub timeout_ms: Option<u64>,
    pub max_file_size: Option<ByteSize>,
    pub description: Option<String>,
}

impl HostPatch {
    pub fn apply(self, host: &mut HostDefinition) {
        if let Some(name) = self.name {
            host.name = name;
        }
        if let Some(url) = self.url {
            host.url = url;
        }
        if let Some(method) = self.method {
            host.method = method;
        }
        if let Some(form_field) = self.form_field {
            host.form_field = form_field;
        }
        if let Some(headers) = self.headers {
            host.headers = headers;
        }
        if let Some(requires_api_key) = self.requires_api_key {
            host.requires_api_key = requires_api_key;
        }
        if let Some(api_key) = self.api_key {
            host.api_key = non_empty(api_key);
        }
        if let Some(api_key_header) = self.api_key_header {
            host.api_key_header = api_key_header;
        }
        if let Some(success_code) = self.success_code {
            host.success_code = success_code;
        }
        if let Some(success_field) = self.success_field {
            host.success_field = non_empty(success_field);
        }
        if let Some(success_value) = self.success_value {
            host.success_value = non_empty(success_value);
        }
        if let Some(path) = self.response_url_path {
            host.response_url_path = path;
        }
        if let Some(priority) = self.priority {
            host.priority = priority;
        }
        if let Some(is_enabled) = self.is_enabled {
            host.is_enabled = is_enabled;
        }
        if let Some(timeout_ms) = self.timeout_ms {
            host.timeout_ms = timeout_ms;
        }
        if let Some(max_file_size) = self.max_file_size {
            host.max_file_size = max_file_size;
        }
        if let Some(description) = self.description {
            host.description = non_empty(description);
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

impl HostDefinition {
    /// Key to send, if one is configured and non-blank
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HostValidationError {
    #[error("host name must not be empty")]
    MissingName,
    #[error("host '{0}' must have an absolute http/https url")]
    InvalidUrl(String),
    #[error("host '{0}' must name the multipart form field")]
    MissingFormField(String),
    #[error("host '{0}' must declare response_url_path")]
    MissingResponseUrlPath(String),
    #[error("host '{0}' success_code '{1}' is not an HTTP status")]
    InvalidSuccessCode(String, String),
    #[error("host '{0}' sets success_value without success_field")]
    OrphanSuccessValue(String),
    #[error("host '{0}' has an empty api_key_header")]
    MissingApiKeyHeader(String),
    #[error("host '{0}' timeout_ms must be positive")]
    InvalidTimeout(String),
    #[error("host '{0}' max_file_size must be positive")]
    InvalidMaxFileSize(String),
}

/// Check the fields every usable definition needs
pub fn validate(host: &HostDefinition) -> Result<(), HostValidationError> {
    let name = host.name.trim();
    if name.is_empty() {
        return Err(HostValidationError::MissingName);
    }
    let name = name.to_string();

    match url::Url::parse(&host.url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
        _ => return Err(HostValidationError::InvalidUrl(name)),
    }

    if host.form_field.trim().is_empty() {
        return Err(HostValidationError::MissingFormField(name));
    }

    if host.response_url_path.trim().is_empty() {
        return Err(HostValidationError::MissingResponseUrlPath(name));
    }

    match host.success_code.trim().parse::<u16>() {
        Ok(code) if (100..=599).contains(&code) => {}
        _ => {
            return Err(HostValidationError::InvalidSuccessCode(
                name,
                host.success_code.clone(),
            ));
        }
    }

    if host.success_value.is_some() && host.success_field.is_none() {
        return Err(HostValidationError::OrphanSuccessValue(name));
    }

    if host.api_key_header.trim().is_empty() {
        return Err(HostValidationError::MissingApiKeyHeader(name));
    }

    if host.timeout_ms == 0 {
        return Err(HostValidationError::InvalidTimeout(name));
    }

    if host.max_file_size.as_u64() == 0 {
        return Err(HostValidationError::InvalidMaxFileSize(name));
    }

    Ok(())
}

fn default_form_field() -> String {
    "file".to_string()
}

fn default_api_key_header() -> String {
    "X-API-Key".to_string()
}

fn default_success_code() -> String {
    "200".to_string()
}

fn default_enabled() -> bool {
    true
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_max_file_size() -> ByteSize {
    ByteSize::mib(50)
}
