//! Validation findings

use serde::{Deserialize, Serialize};

use crate::mapping::MappingError;

/// How serious a finding is. Only [`Severity::Error`] counts toward the
/// error threshold and excludes the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// What a finding is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    /// Entry does not have the expected feature shape or has unparsable geometry
    StructuralValidationFailure,
    /// A required mapped field is absent
    RequiredFieldMissing,
    /// An optional mapped field is absent
    MissingMappedField,
    /// Coordinates outside the valid or configured range
    CoordinateOutOfRange,
    /// A configured field has a value of the wrong type
    TypeMismatch,
    /// Failure outside validation, e.g. a write error
    ProcessingFailure,
}

/// One validation or processing issue. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationFinding {
    /// `property_NNNNNN`, absent for run-level findings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub severity: Severity,
    pub kind: FindingKind,
    pub message: String,
}

impl ValidationFinding {
    pub fn new(
        record_id: impl Into<String>,
        field: Option<&str>,
        severity: Severity,
        kind: FindingKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            record_id: Some(record_id.into()),
            field: field.map(str::to_string),
            severity,
            kind,
            message: message.into(),
        }
    }

    /// A finding not tied to a single record
    pub fn run_level(kind: FindingKind, message: impl Into<String>) -> Self {
        Self {
            record_id: None,
            field: None,
            severity: Severity::Error,
            kind,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl From<&MappingError> for ValidationFinding {
    fn from(err: &MappingError) -> Self {
        let kind = match err {
            MappingError::RequiredFieldMissing { .. } => FindingKind::RequiredFieldMissing,
            MappingError::NoProperties { .. } => FindingKind::StructuralValidationFailure,
        };
        Self {
            record_id: Some(err.record_id().to_string()),
            field: err.field().map(|f| f.name().to_string()),
            severity: Severity::Error,
            kind,
            message: err.to_string(),
        }
    }
}
