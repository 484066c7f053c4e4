//! Configuration management for the toolgate CLI.
//!
//! Settings are layered:
//! 1. Default values
//! 2. Config file (`~/.toolgate/config.toml`, or `--config`)
//! 3. Environment variables (`OPENAI_*`)
//! 4. Command-line flags

mod schema;

pub use schema::ToolgateConfig;

use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Error type for configuration operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
    /// TOML serialization error.
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    /// Refusing to overwrite an existing file.
    #[error("{} already exists (use --force to overwrite)", .0.display())]
    AlreadyExists(PathBuf),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Get the default config directory path.
#[must_use]
pub fn default_config_dir() -> PathBuf {
    dirs_next::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".toolgate")
}

/// Get the default config file path.
#[must_use]
pub fn config_path() -> PathBuf {
    default_config_dir().join("config.toml")
}

/// Load configuration from `path`, or defaults when it does not exist.
pub async fn load_config_from(path: &Path) -> ConfigResult<ToolgateConfig> {
    if !path.exists() {
        info!(path = %path.display(), "config file not found, using defaults");
        return Ok(ToolgateConfig::default());
    }

    let content = tokio::fs::read_to_string(path).await?;
    let config: ToolgateConfig = toml::from_str(&content)?;
    debug!(path = %path.display(), "loaded config file");

    Ok(config)
}

/// Save configuration to `path`, creating parent directories.
pub async fn save_config_to(config: &ToolgateConfig, path: &Path) -> ConfigResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let content = toml::to_string_pretty(config)?;
    tokio::fs::write(path, content).await?;
    info!(path = %path.display(), "saved config file");

    Ok(())
}

/// Write a default config file at `path`.
pub async fn init_config(path: &Path, force: bool) -> ConfigResult<ToolgateConfig> {
    if path.exists() && !force {
        return Err(ConfigError::AlreadyExists(path.to_path_buf()));
    }
    let config = ToolgateConfig::default();
    save_config_to(&config, path).await?;
    Ok(config)
}
