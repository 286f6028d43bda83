//! Configuration management for imgrelay
//!
//! Layered configuration, lowest to highest priority:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables
//!
//! # Usage
//!
//! ```no_run
//! use imgrelay::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Server listening on: {}", config.server.bind_addr);
//! ```
//!
//! # Environment Variables
//!
//! Any key can be overridden with `IMGRELAY__<section>__<key>`:
//! - `IMGRELAY__SERVER__BIND_ADDR=0.0.0.0:9000`
//! - `IMGRELAY__SERVER__MAX_UPLOAD_BYTES=20MB`
//! - `IMGRELAY__FETCHER__TIMEOUT_MS=10000`
//!
//! `NODEIMAGE_API_KEY` supplies the key for the builtin NodeImage host.
//!
//! # Configuration File
//!
//! Defaults to `config/imgrelay.toml`; override with `IMGRELAY_CONFIG`.

mod models;
mod sources;
mod validation;

pub use crate::humanize::ByteSize;
pub use models::{Config, FetcherConfig, HostsConfig, ServerConfig};
pub use validation::{MAX_BATCH_FILES_LIMIT, ValidationError};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// # Errors
    ///
    /// Returns an error if the file is malformed or validation fails
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }
}
