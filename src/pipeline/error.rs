//! Error types for pipeline operations
//!
//! Fatal conditions of a run. Record-level problems are findings handled by
//! the error collector and only become a `PipelineError` when they exceed
//! the configured threshold.

use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;
use crate::ingest::ReadError;
use crate::output::WriteError;

/// Errors that abort a pipeline run
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Invalid or unreadable configuration
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Input could not be loaded
    #[error(transparent)]
    Read(#[from] ReadError),

    /// Output could not be written
    #[error(transparent)]
    Write(#[from] WriteError),

    /// Error threshold reached
    #[error("Too many errors: {count} reached the limit of {limit}")]
    TooManyErrors { count: usize, limit: usize },

    /// Unrecoverable filesystem failure outside the writer
    #[error("IO error with {path}: {source}")]
    IoFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Stage execution failed with context
    #[error("Stage '{stage}' failed: {message}")]
    StageError { stage: String, message: String },
}

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

impl PipelineError {
    /// Create a stage error with message
    pub fn stage(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StageError {
            stage: stage.into(),
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoFailure {
            path: path.into(),
            source,
        }
    }

    /// Whether the run ended because of the error threshold
    pub fn is_threshold(&self) -> bool {
        matches!(self, Self::TooManyErrors { .. })
    }

    /// Get the stage name if this is a stage error
    pub fn stage_name(&self) -> Option<&str> {
        match self {
            Self::StageError { stage, .. } => Some(stage),
            _ => None,
        }
    }

    /// Get a user-friendly error message for CLI output
    pub fn user_message(&self) -> String {
        match self {
            Self::Config(err) => err.user_message(),
            Self::Read(err) => err.user_message(),
            Self::Write(err) => err.user_message(),
            Self::TooManyErrors { count, limit } => format!(
                "Processing stopped after {count} errors (limit {limit}).\n\nHint: Inspect error_report.json in the reports directory, or raise error_handling.max_errors_before_stop."
            ),
            Self::IoFailure { path, source } => format!(
                "IO error with {}: {source}\n\nHint: Check that the path exists and is accessible.",
                path.display()
            ),
            Self::StageError { stage, message } => format!("Stage '{stage}' failed: {message}"),
        }
    }
}
