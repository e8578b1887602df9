//! Error types for configuration loading and validation

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or validating settings
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Settings document does not exist
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    /// Settings document could not be read
    #[error("Failed to read configuration {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Settings document is not valid YAML for the expected shape
    #[error("Failed to parse configuration {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// RAG window overlap must be strictly smaller than the window
    #[error("Invalid chunk configuration: overlap_size ({overlap_size}) must be less than chunk_size ({chunk_size})")]
    InvalidChunkConfig {
        chunk_size: usize,
        overlap_size: usize,
    },

    /// Any other rejected value
    #[error("Invalid configuration value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

impl ConfigError {
    pub fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key,
            reason: reason.into(),
        }
    }

    /// Get a user-friendly error message for CLI output
    pub fn user_message(&self) -> String {
        match self {
            ConfigError::NotFound(path) => format!(
                "Configuration file not found: {}\n\nHint: Pass --config with the path to your settings YAML.",
                path.display()
            ),
            ConfigError::Parse { path, source } => format!(
                "Could not parse {}: {source}\n\nHint: Check indentation and key names against config.yaml.",
                path.display()
            ),
            ConfigError::InvalidChunkConfig { .. } => format!(
                "{self}\n\nHint: Lower llm_training.rag_chunks.overlap_size or raise chunk_size."
            ),
            ConfigError::InvalidValue { key, reason } => {
                format!("Invalid value for {key}: {reason}\n\nHint: Fix the value in your settings file.")
            }
            _ => self.to_string(),
        }
    }
}
