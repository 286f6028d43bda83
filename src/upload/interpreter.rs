//! Turn a host's HTTP reply into a public image URL

use serde_json::Value;

use super::error::ProviderError;
use super::field_path;
use crate::hosts::HostDefinition;

/// Check status and success markers, then pull the image URL out of `body`
pub fn interpret(host: &HostDefinition, status: u16, body: &[u8]) -> Result<String, ProviderError> {
    let expected = host.success_code.trim();
    if status.to_string() != expected {
        return Err(ProviderError::UnexpectedStatus {
            expected: expected.to_string(),
            actual: status,
        });
    }

    let json: Value =
        serde_json::from_slice(body).map_err(|e| ProviderError::InvalidBody(e.to_string()))?;

    if let Some(field) = host.success_field.as_deref().filter(|f| !f.trim().is_empty()) {
        check_success_field(&json, field, host.success_value.as_deref())?;
    }

    field_path::resolve_string(&json, &host.response_url_path)
        .map(|raw| normalize_url(&raw))
        .filter(|url| has_host(url))
        .ok_or_else(|| ProviderError::MissingUrl(host.response_url_path.clone()))
}

/// A normalized URL is only usable if something is left after the scheme
fn has_host(url: &str) -> bool {
    url::Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(|h| !h.is_empty()))
        .unwrap_or(false)
}

fn check_success_field(
    json: &Value,
    field: &str,
    expected: Option<&str>,
) -> Result<(), ProviderError> {
    let value = field_path::resolve(json, field)
        .filter(|v| !v.is_null())
        .ok_or_else(|| ProviderError::SuccessFieldMissing(field.to_string()))?;

    match expected {
        Some(expected) => {
            let actual = field_path::resolve_string(json, field).unwrap_or_default();
            if actual != expected {
                return Err(ProviderError::SuccessFieldMismatch {
                    field: field.to_string(),
                    expected: expected.to_string(),
                    actual,
                });
            }
        }
        None if !field_path::is_truthy(value) => {
            return Err(ProviderError::SuccessFieldMismatch {
                field: field.to_string(),
                expected: "a truthy value".to_string(),
                actual: value.to_string(),
            });
        }
        None => {}
    }
    Ok(())
}

/// Clean up a URL as returned by a host.
///
/// Backticks and whitespace go, protocol-relative URLs get `https:`, and
/// the query string is dropped. Applying it twice changes nothing.
pub fn normalize_url(raw: &str) -> String {
    let mut url: String = raw
        .trim()
        .chars()
        .filter(|c| *c != '`' && !c.is_whitespace())
        .collect();

    if let Some(idx) = url.find('?') {
        url.truncate(idx);
    }
    if !url.starts_with("http") {
        url.insert_str(0, "https:");
    }
    url
}
