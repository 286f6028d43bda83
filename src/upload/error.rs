use thiserror::Error;

use crate::ingest::FetchError;

/// Failure of the HTTP exchange itself, before any body is interpreted
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("failed to read response body: {0}")]
    Body(String),

    #[error("response of at least {size} bytes exceeds limit of {limit} bytes")]
    TooLarge { size: u64, limit: u64 },
}

/// The host answered, but not with a usable image URL
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("unexpected HTTP status {actual} (expected {expected})")]
    UnexpectedStatus { expected: String, actual: u16 },

    #[error("response is not valid JSON: {0}")]
    InvalidBody(String),

    #[error("success field '{0}' missing from response")]
    SuccessFieldMissing(String),

    #[error("success field '{field}' is '{actual}', expected '{expected}'")]
    SuccessFieldMismatch {
        field: String,
        expected: String,
        actual: String,
    },

    #[error("no image URL at '{0}'")]
    MissingUrl(String),
}

/// Why one attempt against one host produced no URL
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AttemptError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("host misconfigured: {0}")]
    Configuration(String),

    #[error("payload of {size} bytes exceeds host limit of {limit} bytes")]
    PayloadTooLarge { size: usize, limit: u64 },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Rejections raised before any host is contacted.
///
/// Provider failures never surface here; they are folded into the
/// [`UploadOutcome`](super::UploadOutcome).
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("payload of {size} bytes exceeds limit of {limit} bytes")]
    PayloadTooLarge { size: usize, limit: u64 },

    #[error("remote image fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("host {0} not found")]
    HostNotFound(u64),

    #[error(transparent)]
    Registry(#[from] crate::hosts::RegistryError),
}
