use axum::{Json, http::StatusCode, response::IntoResponse};
use thiserror::Error;

use super::models::ErrorResponse;
use crate::hosts::RegistryError;
use crate::ingest::FetchError;
use crate::upload::UploadError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("payload invalid: {0}")]
    InvalidPayload(String),
    #[error("payload too large: {0}")]
    PayloadTooLarge(String),
    #[error("resource not found: {0}")]
    NotFound(String),
    #[error("remote fetch failed: {0}")]
    BadGateway(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidPayload(_) => "INVALID_PAYLOAD",
            ApiError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::BadGateway(_) => "BAD_GATEWAY",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let body = ErrorResponse {
            code: self.code(),
            message: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(value: serde_json::Error) -> Self {
        ApiError::InvalidPayload(value.to_string())
    }
}

impl From<RegistryError> for ApiError {
    fn from(value: RegistryError) -> Self {
        match value {
            RegistryError::Invalid(e) => ApiError::InvalidPayload(e.to_string()),
            RegistryError::Store(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<UploadError> for ApiError {
    fn from(value: UploadError) -> Self {
        match value {
            UploadError::InvalidInput(msg) => ApiError::InvalidPayload(msg),
            UploadError::PayloadTooLarge { .. } => ApiError::PayloadTooLarge(value.to_string()),
            UploadError::HostNotFound(id) => ApiError::NotFound(format!("image host {id}")),
            UploadError::Registry(e) => e.into(),
            UploadError::Fetch(e) => match e {
                FetchError::InvalidUrl(_) => ApiError::InvalidPayload(e.to_string()),
                FetchError::TooLarge { .. } => ApiError::PayloadTooLarge(e.to_string()),
                FetchError::Status(_) | FetchError::Transport(_) | FetchError::Empty => {
                    ApiError::BadGateway(e.to_string())
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_error_status_mapping() {
        let cases = [
            (UploadError::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (
                UploadError::PayloadTooLarge { size: 2, limit: 1 },
                StatusCode::PAYLOAD_TOO_LARGE,
            ),
            (UploadError::HostNotFound(3), StatusCode::NOT_FOUND),
            (
                UploadError::Fetch(FetchError::InvalidUrl("x".into())),
                StatusCode::BAD_REQUEST,
            ),
            (
                UploadError::Fetch(FetchError::Status(404)),
                StatusCode::BAD_GATEWAY,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status_code(), status);
        }
    }
}
