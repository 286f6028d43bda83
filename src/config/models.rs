use crate::hosts::NewHost;
use crate::humanize::ByteSize;
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub hosts: HostsConfig,
}

/// HTTP server and request limits
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    /// Directory of the fjall keyspace holding host definitions
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
    /// Largest single image accepted from a client
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: ByteSize,
    #[serde(default = "default_max_batch_files")]
    pub max_batch_files: usize,
    /// Whole-request body cap, covering multi-file and base64 batches
    #[serde(default = "default_max_request_bytes")]
    pub max_request_bytes: ByteSize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            store_path: default_store_path(),
            max_upload_bytes: default_max_upload_bytes(),
            max_batch_files: default_max_batch_files(),
            max_request_bytes: default_max_request_bytes(),
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, 3000))
}

fn default_store_path() -> PathBuf {
    PathBuf::from("data/hosts")
}

fn default_max_upload_bytes() -> ByteSize {
    ByteSize::mib(50)
}

fn default_max_batch_files() -> usize {
    9
}

fn default_max_request_bytes() -> ByteSize {
    ByteSize::mib(512)
}

/// Outbound GET used to pull images referenced by URL
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FetcherConfig {
    #[serde(default = "default_fetch_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_fetch_max_bytes")]
    pub max_bytes: ByteSize,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_referer")]
    pub referer: String,
    #[serde(default = "default_accept")]
    pub accept: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_fetch_timeout_ms(),
            max_bytes: default_fetch_max_bytes(),
            user_agent: default_user_agent(),
            referer: default_referer(),
            accept: default_accept(),
        }
    }
}

fn default_fetch_timeout_ms() -> u64 {
    30_000
}

fn default_fetch_max_bytes() -> ByteSize {
    ByteSize::mib(50)
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string()
}

fn default_referer() -> String {
    "https://www.google.com/".to_string()
}

fn default_accept() -> String {
    "image/webp,image/apng,image/*,*/*;q=0.8".to_string()
}

/// Host definitions inserted when the store starts out empty
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HostsConfig {
    #[serde(default = "default_seed_builtin")]
    pub seed_builtin: bool,
    #[serde(default)]
    pub seeds: Vec<NewHost>,
    /// Key for the builtin NodeImage host (loaded from environment only)
    #[serde(skip)]
    pub nodeimage_api_key: Option<String>,
}

impl Default for HostsConfig {
    fn default() -> Self {
        Self {
            seed_builtin: default_seed_builtin(),
            seeds: Vec::new(),
            nodeimage_api_key: None,
        }
    }
}

fn default_seed_builtin() -> bool {
    true
}

impl HostsConfig {
    /// Builtin hosts (when enabled) followed by configured seeds
    pub fn seed_hosts(&self) -> Vec<NewHost> {
        let mut seeds = if self.seed_builtin {
            crate::hosts::builtin_hosts(self.nodeimage_api_key.as_deref())
        } else {
            Vec::new()
        };
        seeds.extend(self.seeds.iter().cloned());
        seeds
    }
}
