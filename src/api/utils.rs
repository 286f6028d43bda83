//! Stateless request helpers shared by the handlers

use axum::http::{HeaderMap, header::CONTENT_TYPE};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use serde::de::DeserializeOwned;

use crate::api::error::ApiError;
use crate::humanize::ByteSize;

/// Accepts `application/json` with optional parameters, nothing else
pub fn parse_content_type(content_type: &str) -> Result<mime::Mime, ApiError> {
    let media_type: mime::Mime = content_type
        .parse()
        .map_err(|_| ApiError::InvalidPayload(format!("invalid Content-Type: {content_type}")))?;

    if media_type.type_() != mime::APPLICATION || media_type.subtype() != mime::JSON {
        return Err(ApiError::InvalidPayload(format!(
            "Content-Type must be application/json, got: {}/{}",
            media_type.type_(),
            media_type.subtype()
        )));
    }

    Ok(media_type)
}

/// Multipart parts must declare an `image/*` type
pub fn ensure_image_type(content_type: Option<&str>) -> Result<mime::Mime, ApiError> {
    let raw = content_type
        .ok_or_else(|| ApiError::InvalidPayload("file part has no Content-Type".into()))?;
    let media_type: mime::Mime = raw
        .parse()
        .map_err(|_| ApiError::InvalidPayload(format!("invalid file type: {raw}")))?;

    if media_type.type_() != mime::IMAGE {
        return Err(ApiError::InvalidPayload(format!(
            "only image files are accepted, got: {}",
            media_type.essence_str()
        )));
    }
    Ok(media_type)
}

pub fn validate_body_size(data: &[u8], max_size: ByteSize) -> Result<(), ApiError> {
    if max_size.is_exceeded_by(data.len()) {
        return Err(ApiError::PayloadTooLarge(format!(
            "{} bytes exceeds limit of {max_size}",
            data.len()
        )));
    }
    Ok(())
}

/// Check the JSON content type, collect the body and deserialize it
pub async fn read_json<T: DeserializeOwned>(
    headers: &HeaderMap,
    body: axum::body::Body,
    max_size: ByteSize,
) -> Result<T, ApiError> {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::InvalidPayload("missing Content-Type header".into()))?;
    parse_content_type(content_type)?;

    // Decompression already happened in RequestDecompressionLayer
    let data = Limited::new(body, max_size.as_usize())
        .collect()
        .await
        .map_err(|err| {
            if err.downcast_ref::<LengthLimitError>().is_some() {
                ApiError::PayloadTooLarge(format!("request body exceeds limit of {max_size}"))
            } else {
                ApiError::InvalidPayload(format!("failed to read request body: {err}"))
            }
        })?
        .to_bytes();

    Ok(serde_json::from_slice(&data)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_content_type() {
        assert!(parse_content_type("application/json").is_ok());
        assert!(parse_content_type("application/json; charset=UTF-8").is_ok());
        assert!(parse_content_type("application/jsonp").is_err());
        assert!(parse_content_type("text/json").is_err());
        assert!(parse_content_type("").is_err());
    }

    #[test]
    fn test_image_types_only() {
        assert!(ensure_image_type(Some("image/png")).is_ok());
        assert!(ensure_image_type(Some("image/svg+xml")).is_ok());
        assert!(ensure_image_type(Some("application/pdf")).is_err());
        assert!(ensure_image_type(Some("text/plain")).is_err());
        assert!(ensure_image_type(None).is_err());
    }

    #[test]
    fn test_validate_body_size() {
        let data = vec![0u8; 1000];
        assert!(validate_body_size(&data, ByteSize(1000)).is_ok());
        assert!(matches!(
            validate_body_size(&data, ByteSize(999)),
            Err(ApiError::PayloadTooLarge(_))
        ));
    }
}
