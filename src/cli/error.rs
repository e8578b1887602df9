//! CLI error type

use thiserror::Error;

use crate::config::ConfigError;
use crate::pipeline::PipelineError;

/// Errors surfaced by the command-line driver
#[derive(Error, Debug)]
pub enum CliError {
    /// Bad flag combination or value
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Settings could not be loaded or are invalid
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The run failed or aborted
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// Log file could not be opened
    #[error("Failed to initialise logging: {0}")]
    Logging(#[source] std::io::Error),
}

impl CliError {
    /// Message printed before exiting
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidArgument(msg) => {
                format!("Invalid argument: {msg}\n\nHint: Run with --help for usage.")
            }
            Self::Config(err) => err.user_message(),
            Self::Pipeline(err) => err.user_message(),
            Self::Logging(err) => format!(
                "Failed to initialise logging: {err}\n\nHint: Check that logging.file_path or the reports directory is writable."
            ),
        }
    }

    /// Process exit code; 2 for an aborted run, 1 otherwise
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Pipeline(err) if err.is_threshold() => 2,
            _ => 1,
        }
    }
}
