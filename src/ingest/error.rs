//! Error types for reading the source dataset

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading the input document
#[derive(Error, Debug)]
pub enum ReadError {
    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// File exceeds the configured size bound
    #[error("Input too large: {path} is {size_bytes} bytes, limit is {limit_bytes} bytes")]
    InputTooLarge {
        path: PathBuf,
        size_bytes: u64,
        limit_bytes: u64,
    },

    /// Bytes are not valid in the declared encoding
    #[error("Decode error in {path}: not valid {encoding} at byte {offset}")]
    DecodeError {
        path: PathBuf,
        encoding: &'static str,
        offset: usize,
    },

    /// Declared utf-8, but the file starts with a byte-order mark
    #[error("Unexpected UTF-8 byte-order mark at the start of {path}")]
    UnexpectedBom { path: PathBuf },

    /// Text is not a JSON document
    #[error("JSON parsing error in {path}: {source}")]
    JsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// JSON document has no recognisable record collection
    #[error("Unsupported document structure in {path}: {found}")]
    UnsupportedStructure { path: PathBuf, found: String },

    /// IO error
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for read operations
pub type ReadResult<T> = Result<T, ReadError>;

impl ReadError {
    /// Get a user-friendly error message for CLI output
    pub fn user_message(&self) -> String {
        match self {
            ReadError::FileNotFound(path) => format!(
                "Input file not found: {}\n\nHint: Set input.file_path or pass --input.",
                path.display()
            ),
            ReadError::InputTooLarge {
                path,
                size_bytes,
                limit_bytes,
            } => format!(
                "Input file {} is {} MB, above the {} MB limit\n\nHint: Raise input.max_file_size_mb if the file is expected to be this large.",
                path.display(),
                size_bytes / (1024 * 1024),
                limit_bytes / (1024 * 1024)
            ),
            ReadError::DecodeError { encoding, .. } => format!(
                "{self}\n\nHint: The file is not {encoding}; set input.encoding to match it (utf-8, utf-8-sig, ascii, latin-1)."
            ),
            ReadError::UnexpectedBom { .. } => format!(
                "{self}\n\nHint: Set input.encoding to utf-8-sig to read files saved with a byte-order mark."
            ),
            ReadError::UnsupportedStructure { .. } => format!(
                "{self}\n\nHint: Expected a GeoJSON FeatureCollection, an array of features, or an object with a 'properties' array."
            ),
            _ => self.to_string(),
        }
    }
}
