//! Request and response bodies of the HTTP API
//!
//! Upload endpoints answer with [`UploadOutcome`]s, either alone or wrapped
//! per file:
//!
//! ```json
//! {
//!   "success": true,
//!   "url": "https://cdn.example.com/a.png",
//!   "used_host_name": "xinyew",
//!   "message": "uploaded via xinyew",
//!   "errors": [{"host_id": 2, "host_name": "4399", "message": "request timed out"}]
//! }
//! ```
//!
//! Host listings never expose stored API keys in full; see [`HostView`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::hosts::{HeadersMap, HostDefinition, HttpMethod};
use crate::observability::MetricsSnapshot;
use crate::upload::UploadOutcome;

/// One uploaded file and what became of it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<usize>,
    #[serde(flatten)]
    pub outcome: UploadOutcome,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResponse {
    pub succeeded: usize,
    pub failed: usize,
    pub results: Vec<FileResult>,
}

impl BatchResponse {
    pub fn new(results: Vec<FileResult>) -> Self {
        let succeeded = results.iter().filter(|r| r.outcome.success).count();
        Self {
            succeeded,
            failed: results.len() - succeeded,
            results,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Base64UploadRequest {
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ConvertLinkRequest {
    #[serde(default)]
    pub url: String,
}

/// Host definition as shown to administrators
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostView {
    pub id: u64,
    pub name: String,
    pub url: String,
    pub method: HttpMethod,
    pub form_field: String,
    pub headers: HeadersMap,
    pub requires_api_key: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub api_key_header: String,
    pub success_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_value: Option<String>,
    pub response_url_path: String,
    pub priority: i32,
    pub is_enabled: bool,
    pub timeout_ms: u64,
    pub max_file_size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl From<HostDefinition> for HostView {
    fn from(host: HostDefinition) -> Self {
        Self {
            id: host.id,
            api_key: host.api_key.as_deref().map(mask_secret),
            name: host.name,
            url: host.url,
            method: host.method,
            form_field: host.form_field,
            headers: host.headers,
            requires_api_key: host.requires_api_key,
            api_key_header: host.api_key_header,
            success_code: host.success_code,
            success_field: host.success_field,
            success_value: host.success_value,
            response_url_path: host.response_url_path,
            priority: host.priority,
            is_enabled: host.is_enabled,
            timeout_ms: host.timeout_ms,
            max_file_size: host.max_file_size.as_u64(),
            description: host.description,
        }
    }
}

/// Keep a short prefix of long secrets, hide short ones entirely
pub fn mask_secret(secret: &str) -> String {
    let secret = secret.trim();
    if secret.chars().count() <= 8 {
        return "****".to_string();
    }
    let prefix: String = secret.chars().take(4).collect();
    format!("{prefix}****")
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdatedResponse {
    pub id: u64,
    pub updated: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub components: BTreeMap<String, String>,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct MetricsResponse {
    #[serde(flatten)]
    pub counters: MetricsSnapshot,
    pub hosts_enabled: usize,
    pub hosts_total: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hosts::NewHost;

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret("short"), "****");
        assert_eq!(mask_secret("abcdefghijkl"), "abcd****");
    }

    #[test]
    fn test_host_view_masks_key() {
        let mut host = NewHost::new("n", "https://n.example.com/up", "url");
        host.api_key = Some("sk-live-1234567890".into());
        let view = HostView::from(host.into_definition(4));

        assert_eq!(view.id, 4);
        assert_eq!(view.api_key.as_deref(), Some("sk-l****"));
        let json = serde_json::to_string(&view).unwrap();
        assert!(!json.contains("1234567890"));
    }

    #[test]
    fn test_batch_counts() {
        let bad = FileResult {
            filename: Some("a.png".into()),
            size: Some(3),
            outcome: UploadOutcome::failed("x", Vec::new()),
        };
        let mut good = bad.clone();
        good.outcome.success = true;

        let batch = BatchResponse::new(vec![good, bad]);
        assert_eq!((batch.succeeded, batch.failed), (1, 1));
    }
}
