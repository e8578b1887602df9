//! Error types for field mapping

use thiserror::Error;

use crate::models::CanonicalField;

/// Errors that can occur while projecting a raw record
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MappingError {
    /// A field flagged as required has no usable value
    #[error("Required field '{field}' missing in {record_id} (source path '{source_path}')")]
    RequiredFieldMissing {
        record_id: String,
        field: CanonicalField,
        source_path: String,
    },

    /// The raw entry has no attribute object to map from
    #[error("Record {record_id} has no properties object")]
    NoProperties { record_id: String },
}

/// Result type for mapping operations
pub type MappingResult<T> = Result<T, MappingError>;

impl MappingError {
    /// Canonical field involved, if any
    pub fn field(&self) -> Option<CanonicalField> {
        match self {
            MappingError::RequiredFieldMissing { field, .. } => Some(*field),
            MappingError::NoProperties { .. } => None,
        }
    }

    pub fn record_id(&self) -> &str {
        match self {
            MappingError::RequiredFieldMissing { record_id, .. } => record_id,
            MappingError::NoProperties { record_id } => record_id,
        }
    }
}
