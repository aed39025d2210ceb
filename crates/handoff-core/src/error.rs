//! Error types for Handoff Core
//!
//! Provides error handling for:
//! - Configuration loading
//! - Broker contract violations
//! - Shell misuse (responding with nothing shown)

use handoff_intervention::BrokerError;
use std::path::PathBuf;

/// Main Handoff error type
#[derive(Debug, thiserror::Error)]
pub enum HandoffError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Broker contract violation
    #[error("broker error: {0}")]
    Broker(#[from] BrokerError),

    /// Shell has no intervention on screen
    #[error("no intervention is being shown")]
    NothingShown,

    /// I/O failure
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config {path}: {source}")]
    Read {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Config text is not valid TOML for this schema
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config could not be rendered
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}
