//! CLI error type.

use crate::config::ConfigError;

/// Errors surfaced by the `toolgate` binary.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Library error.
    #[error(transparent)]
    Toolgate(#[from] toolgate::Error),

    /// Configuration file error.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Bad or missing command-line input.
    #[error("{0}")]
    Usage(String),

    /// Malformed `--args` JSON.
    #[error("invalid JSON arguments: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Create a usage error.
    pub fn usage(msg: impl Into<String>) -> Self {
        Self::Usage(msg.into())
    }
}

/// Result type for CLI commands.
pub type Result<T> = std::result::Result<T, CliError>;
