use std::path::{Path, PathBuf};

use sentinel_common::config::ProxyConfig;

use super::env_overlay::apply_env_overrides;
use super::validation;

/// Load, overlay, and validate the proxy's YAML configuration file.
///
/// Fails loudly with a descriptive error on any problem; the caller
/// (`main`) refuses to start rather than run with a half-parsed config.
pub fn load_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    tracing::info!(path = %path.display(), "loading configuration");

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut value: serde_json::Value =
        serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;

    let env_prefix = std::env::var("SENTINEL_CONFIG_PREFIX").unwrap_or_else(|_| "SENTINEL".into());
    apply_env_overrides(&mut value, &env_prefix);

    let config: ProxyConfig = serde_json::from_value(value).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;

    validation::validate(&config)?;

    tracing::info!("configuration loaded successfully");
    Ok(config)
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {detail}")]
    Parse { path: PathBuf, detail: String },

    #[error("configuration validation failed: {0}")]
    Validation(String),
}
