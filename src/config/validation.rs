use super::models::Config;
use crate::hosts::{HostValidationError, validate as validate_host};
use std::collections::HashSet;
use thiserror::Error;

pub const MAX_BATCH_FILES_LIMIT: usize = 100;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field} must be positive")]
    NonPositiveLimit { field: &'static str },

    #[error("max_batch_files must be between 1 and {limit}, got {actual}")]
    InvalidBatchLimit { actual: usize, limit: usize },

    #[error("max_request_bytes ({request}) is smaller than max_upload_bytes ({upload})")]
    RequestLimitBelowUpload { request: u64, upload: u64 },

    #[error("Seed host '{name}' is invalid: {source}")]
    InvalidSeedHost {
        name: String,
        #[source]
        source: HostValidationError,
    },

    #[error("Seed host name '{0}' is used more than once")]
    DuplicateSeedHost(String),
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_server(config)?;
    validate_fetcher(config)?;
    validate_seeds(config)?;
    Ok(())
}

fn validate_server(config: &Config) -> Result<(), ValidationError> {
    let server = &config.server;
    if server.max_upload_bytes.as_u64() == 0 {
        return Err(ValidationError::NonPositiveLimit {
            field: "server.max_upload_bytes",
        });
    }
    if server.max_request_bytes.as_u64() == 0 {
        return Err(ValidationError::NonPositiveLimit {
            field: "server.max_request_bytes",
        });
    }
    if server.max_request_bytes < server.max_upload_bytes {
        return Err(ValidationError::RequestLimitBelowUpload {
            request: server.max_request_bytes.as_u64(),
            upload: server.max_upload_bytes.as_u64(),
        });
    }
    if !(1..=MAX_BATCH_FILES_LIMIT).contains(&server.max_batch_files) {
        return Err(ValidationError::InvalidBatchLimit {
            actual: server.max_batch_files,
            limit: MAX_BATCH_FILES_LIMIT,
        });
    }
    Ok(())
}

fn validate_fetcher(config: &Config) -> Result<(), ValidationError> {
    if config.fetcher.timeout_ms == 0 {
        return Err(ValidationError::NonPositiveLimit {
            field: "fetcher.timeout_ms",
        });
    }
    if config.fetcher.max_bytes.as_u64() == 0 {
        return Err(ValidationError::NonPositiveLimit {
            field: "fetcher.max_bytes",
        });
    }
    Ok(())
}

/// Seeds must be valid definitions with distinct names, builtins included
fn validate_seeds(config: &Config) -> Result<(), ValidationError> {
    let mut names = HashSet::new();
    for seed in config.hosts.seed_hosts() {
        let name = seed.name.clone();
        if !names.insert(name.to_lowercase()) {
            return Err(ValidationError::DuplicateSeedHost(name));
        }
        validate_host(&seed.into_definition(0))
            .map_err(|source| ValidationError::InvalidSeedHost { name, source })?;
    }
    Ok(())
}
