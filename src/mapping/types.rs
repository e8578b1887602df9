//! Declarative field-mapping table

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::convert::is_absent;
use crate::config::{FieldMappingSettings, ValidationSettings};
use crate::models::CanonicalField;

/// A location in a record's attribute object.
///
/// Resolution tries the whole path as a literal key first (flat exports use
/// keys such as `AddressPoints.TRUE_OWNER`), then walks nested objects one
/// dot-separated segment at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcePath(String);

impl SourcePath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Resolve against an attribute object; absent values yield `None`
    pub fn resolve<'a>(&self, properties: &'a Map<String, Value>) -> Option<&'a Value> {
        let found = properties.get(&self.0).or_else(|| self.resolve_nested(properties));
        if is_absent(found) { None } else { found }
    }

    fn resolve_nested<'a>(&self, properties: &'a Map<String, Value>) -> Option<&'a Value> {
        let mut segments = self.0.split('.');
        let mut current = properties.get(segments.next()?)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// First segment, i.e. the raw key this path reads from in nested form
    pub fn root_key(&self) -> &str {
        self.0.split('.').next().unwrap_or(&self.0)
    }
}

impl std::fmt::Display for SourcePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One source-path to canonical-field entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMapping {
    pub field: CanonicalField,
    pub source_path: SourcePath,
    /// Missing value is a mapping failure rather than an absent marker
    pub required: bool,
}

/// Explicit lookup structure from canonical field to source path.
///
/// Entries are kept in canonical field order; unmapped fields have no entry
/// and always map to the absent marker.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldMappingTable {
    mappings: Vec<FieldMapping>,
}

impl FieldMappingTable {
    /// Build the table from settings. Required flags are only set when
    /// `check_required_fields` is enabled.
    pub fn from_settings(mapping: &FieldMappingSettings, validation: &ValidationSettings) -> Self {
        let required: BTreeSet<CanonicalField> = if validation.check_required_fields {
            validation.required_fields.iter().copied().collect()
        } else {
            BTreeSet::new()
        };
        let mappings = CanonicalField::all()
            .into_iter()
            .filter_map(|field| {
                mapping.source_for(field).map(|path| FieldMapping {
                    field,
                    source_path: SourcePath::new(path),
                    required: required.contains(&field),
                })
            })
            .collect();
        Self { mappings }
    }

    pub fn new(mappings: Vec<FieldMapping>) -> Self {
        Self { mappings }
    }

    pub fn get(&self, field: CanonicalField) -> Option<&FieldMapping> {
        self.mappings.iter().find(|m| m.field == field)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldMapping> {
        self.mappings.iter()
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Whether a raw attribute key is read by any mapping
    pub fn references_key(&self, key: &str) -> bool {
        self.mappings
            .iter()
            .any(|m| m.source_path.as_str() == key || m.source_path.root_key() == key)
    }
}
