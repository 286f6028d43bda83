use super::models::Config;
use config::{ConfigError, Environment, File};
use std::env;
use std::path::PathBuf;

const CONFIG_ENV_VAR: &str = "IMGRELAY_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/imgrelay.toml";
const ENV_PREFIX: &str = "IMGRELAY";
const ENV_SEPARATOR: &str = "__";
const NODEIMAGE_KEY_VAR: &str = "NODEIMAGE_API_KEY";

/// Load configuration with priority (lowest to highest):
/// 1. Defaults (embedded in structs)
/// 2. TOML file (if exists)
/// 3. `.env` file (via dotenvy)
/// 4. System environment variables
pub fn load() -> Result<Config, ConfigError> {
    // A missing .env is normal
    let _ = dotenvy::dotenv();

    let config_path = env::var(CONFIG_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

    let mut config = load_from_sources(config_path)?;
    load_secrets(&mut config);
    Ok(config)
}

/// Secrets come from the environment only, never from TOML
fn load_secrets(config: &mut Config) {
    if let Ok(key) = env::var(NODEIMAGE_KEY_VAR) {
        let key = key.trim();
        if !key.is_empty() {
            config.hosts.nodeimage_api_key = Some(key.to_string());
        }
    }
}

/// Load configuration from a specific path plus environment overrides
pub fn load_from_sources(config_path: PathBuf) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();

    if config_path.exists() {
        tracing::info!("Loading configuration from: {}", config_path.display());
        builder = builder.add_source(File::from(config_path).required(false));
    } else {
        tracing::warn!(
            "Configuration file not found at {}, using defaults and environment overrides",
            config_path.display()
        );
    }

    // IMGRELAY__SERVER__BIND_ADDR -> server.bind_addr
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator(ENV_SEPARATOR)
            .separator(ENV_SEPARATOR)
            .try_parsing(true),
    );

    builder.build()?.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::humanize::ByteSize;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_defaults_only() {
        let temp_dir = TempDir::new().unwrap();
        let config = load_from_sources(temp_dir.path().join("missing.toml")).unwrap();

        assert_eq!(config.server.bind_addr.to_string(), "0.0.0.0:3000");
        assert_eq!(config.server.store_path, PathBuf::from("data/hosts"));
    }

    #[test]
    fn test_load_from_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("imgrelay.toml");

        let toml_content = r#"
[server]
bind_addr = "127.0.0.1:9000"
max_upload_bytes = "10MB"
max_batch_files = 4

[fetcher]
timeout_ms = 5000
referer = "https://example.com/"

[hosts]
seed_builtin = false

[[hosts.seeds]]
name = "own-cdn"
url = "https://cdn.example.com/upload"
response_url_path = "data.0.url"
priority = 50
headers = { device = "main_pc" }
        "#;
        fs::write(&config_path, toml_content).unwrap();

        let config = load_from_sources(config_path).unwrap();
        assert_eq!(config.server.bind_addr.to_string(), "127.0.0.1:9000");
        assert_eq!(config.server.max_upload_bytes, ByteSize::mib(10));
        assert_eq!(config.server.max_batch_files, 4);
        assert_eq!(config.fetcher.timeout_ms, 5000);
        assert_eq!(config.fetcher.referer, "https://example.com/");
        assert!(!config.hosts.seed_builtin);

        let seed = &config.hosts.seeds[0];
        assert_eq!(seed.name, "own-cdn");
        assert_eq!(seed.form_field, "file");
        assert_eq!(seed.priority, 50);
        assert_eq!(seed.headers["device"], "main_pc");
    }
}
