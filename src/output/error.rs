//! Error types for writing outputs and backups

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while writing run outputs
#[derive(Error, Debug)]
pub enum WriteError {
    /// Filesystem failure with path context
    #[error("IO error with {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization failed
    #[error("Failed to serialize {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// CSV encoding failed
    #[error("Failed to write CSV {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Backup archive failure
    #[error("Failed to write archive {path}: {source}")]
    Zip {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    /// Invalid backup listing pattern
    #[error("Invalid backup pattern: {0}")]
    Pattern(#[from] glob::PatternError),
}

/// Result type for write operations
pub type WriteResult<T> = Result<T, WriteError>;

impl WriteError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Path the failure relates to, when known
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::Io { path, .. }
            | Self::Json { path, .. }
            | Self::Csv { path, .. }
            | Self::Zip { path, .. } => Some(path),
            Self::Pattern(_) => None,
        }
    }

    /// Get a user-friendly error message for CLI output
    pub fn user_message(&self) -> String {
        match self {
            Self::Io { path, source } => format!(
                "Could not write {}: {source}\n\nHint: Check that the output directories are writable and the disk is not full.",
                path.display()
            ),
            Self::Zip { path, source } => format!(
                "Could not create backup archive {}: {source}\n\nHint: Disable backup.compress to store backups as plain directories.",
                path.display()
            ),
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_has_path_and_hint() {
        let err = WriteError::io(
            "/out/chunks/chunk_001.json",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().contains("chunk_001.json"));
        assert!(err.user_message().contains("Hint:"));
        assert_eq!(
            err.path(),
            Some(&PathBuf::from("/out/chunks/chunk_001.json"))
        );
    }
}
