use thiserror::Error;

use super::models::{Base64UploadRequest, ConvertLinkRequest};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestValidationError {
    #[error("no files uploaded")]
    NoFiles,
    #[error("at most {limit} files per request, got {actual}")]
    TooManyFiles { actual: usize, limit: usize },
    #[error("images must contain at least one data URL")]
    NoImages,
    #[error("url is required")]
    MissingUrl,
}

pub fn validate_file_count(count: usize, limit: usize) -> Result<(), RequestValidationError> {
    if count == 0 {
        return Err(RequestValidationError::NoFiles);
    }
    if count > limit {
        return Err(RequestValidationError::TooManyFiles {
            actual: count,
            limit,
        });
    }
    Ok(())
}

pub fn validate_base64_request(
    request: &Base64UploadRequest,
    limit: usize,
) -> Result<(), RequestValidationError> {
    if request.images.is_empty() {
        return Err(RequestValidationError::NoImages);
    }
    if request.images.len() > limit {
        return Err(RequestValidationError::TooManyFiles {
            actual: request.images.len(),
            limit,
        });
    }
    Ok(())
}

pub fn validate_convert_request(request: &ConvertLinkRequest) -> Result<(), RequestValidationError> {
    if request.url.trim().is_empty() {
        return Err(RequestValidationError::MissingUrl);
    }
    Ok(())
}
