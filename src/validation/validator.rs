//! Per-record validation
//!
//! Checks run in a fixed order: structure, mapped-field presence,
//! coordinates, then field types. Every failed check becomes a
//! [`ValidationFinding`]; a record with any error-severity finding is
//! excluded from downstream stages. Validation itself never stops the run.

use std::collections::BTreeSet;

use serde_json::{Map, Value};

use super::finding::{FindingKind, Severity, ValidationFinding};
use crate::config::ValidationSettings;
use crate::ingest::RawFeature;
use crate::mapping::convert::{as_amount, as_text, as_year};
use crate::mapping::{FieldMappingTable, MapInput};
use crate::models::{CanonicalField, Coordinates, PropertyRecord, ValueKind};

const NON_POINT_GEOMETRIES: &[&str] = &[
    "MultiPoint",
    "LineString",
    "MultiLineString",
    "Polygon",
    "MultiPolygon",
];

/// A record that passed validation, ready for mapping
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedFeature {
    pub index: usize,
    pub id: String,
    pub properties: Map<String, Value>,
    /// Valid point coordinates, if any
    pub coordinates: Option<Coordinates>,
    /// Fields whose raw values failed type checks
    pub suppressed: BTreeSet<CanonicalField>,
}

impl ValidatedFeature {
    pub fn as_map_input(&self) -> MapInput<'_> {
        MapInput {
            index: self.index,
            properties: &self.properties,
            coordinates: self.coordinates,
            suppressed: &self.suppressed,
        }
    }
}

/// Result of validating one raw entry
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationOutcome {
    /// `None` when the record is excluded
    pub feature: Option<ValidatedFeature>,
    pub findings: Vec<ValidationFinding>,
}

impl ValidationOutcome {
    pub fn is_excluded(&self) -> bool {
        self.feature.is_none()
    }

    fn excluded(findings: Vec<ValidationFinding>) -> Self {
        Self {
            feature: None,
            findings,
        }
    }
}

/// Validates raw entries against the settings and the mapping table
#[derive(Debug, Clone)]
pub struct Validator {
    settings: ValidationSettings,
    table: FieldMappingTable,
}

impl Validator {
    pub fn new(settings: ValidationSettings, table: FieldMappingTable) -> Self {
        Self { settings, table }
    }

    /// Validate one raw entry
    pub fn validate(&self, raw: &RawFeature) -> ValidationOutcome {
        let id = PropertyRecord::id_for_index(raw.index);
        let structural = |message: String| {
            ValidationFinding::new(
                &id,
                None,
                Severity::Error,
                FindingKind::StructuralValidationFailure,
                message,
            )
        };

        let Some(object) = raw.value.as_object() else {
            return ValidationOutcome::excluded(vec![structural(format!(
                "entry is {}, expected an object",
                json_type_name(&raw.value)
            ))]);
        };

        let (properties, geometry) = match split_feature(object, self.settings.validate_geojson) {
            Ok(parts) => parts,
            Err(message) => return ValidationOutcome::excluded(vec![structural(message)]),
        };

        let mut findings = Vec::new();

        let point = match geometry.map(parse_geometry) {
            None => None,
            Some(Ok(point)) => point,
            Some(Err(message)) if self.settings.validate_geojson => {
                return ValidationOutcome::excluded(vec![structural(format!(
                    "unparsable geometry: {message}"
                ))]);
            }
            Some(Err(_)) => None,
        };

        let mut suppressed = BTreeSet::new();
        for mapping in self.table.iter() {
            let field = mapping.field;
            let Some(value) = mapping.source_path.resolve(&properties) else {
                findings.push(self.missing_field_finding(&id, field, mapping.required, &mapping.source_path.to_string()));
                continue;
            };
            if self.settings.validate_data_types && !type_conforms(field, value) {
                suppressed.insert(field);
                findings.push(ValidationFinding::new(
                    &id,
                    Some(field.name()),
                    Severity::Warning,
                    FindingKind::TypeMismatch,
                    format!(
                        "{} has unusable value {}; treated as absent",
                        field.name(),
                        truncate_value(value)
                    ),
                ));
                if mapping.required {
                    findings.push(ValidationFinding::new(
                        &id,
                        Some(field.name()),
                        Severity::Error,
                        FindingKind::RequiredFieldMissing,
                        format!("required field '{}' has no usable value", field.name()),
                    ));
                }
            }
        }

        let coordinates = point.and_then(|(longitude, latitude)| {
            self.check_coordinates(&id, Coordinates::new(latitude, longitude), &mut findings)
        });

        if findings.iter().any(ValidationFinding::is_error) {
            return ValidationOutcome::excluded(findings);
        }

        ValidationOutcome {
            feature: Some(ValidatedFeature {
                index: raw.index,
                id,
                properties,
                coordinates,
                suppressed,
            }),
            findings,
        }
    }

    fn missing_field_finding(
        &self,
        id: &str,
        field: CanonicalField,
        required: bool,
        source_path: &str,
    ) -> ValidationFinding {
        if required {
            ValidationFinding::new(
                id,
                Some(field.name()),
                Severity::Error,
                FindingKind::RequiredFieldMissing,
                format!(
                    "required field '{}' is missing (source path '{}')",
                    field.name(),
                    source_path
                ),
            )
        } else {
            ValidationFinding::new(
                id,
                Some(field.name()),
                Severity::Info,
                FindingKind::MissingMappedField,
                format!("{} not present (source path '{}')", field.name(), source_path),
            )
        }
    }

    /// Keep coordinates only if they are in range; out-of-range pairs are
    /// dropped, with a warning when coordinate validation is enabled.
    fn check_coordinates(
        &self,
        id: &str,
        coordinates: Coordinates,
        findings: &mut Vec<ValidationFinding>,
    ) -> Option<Coordinates> {
        let reason = if !coordinates.in_global_range() {
            Some("outside valid latitude/longitude ranges")
        } else if self.settings.validate_coordinates
            && self
                .settings
                .coordinate_bounds
                .is_some_and(|b| !b.contains(coordinates.latitude, coordinates.longitude))
        {
            Some("outside configured coordinate bounds")
        } else {
            None
        };

        match reason {
            None => Some(coordinates),
            Some(reason) => {
                if self.settings.validate_coordinates {
                    findings.push(ValidationFinding::new(
                        id,
                        Some("coordinates"),
                        Severity::Warning,
                        FindingKind::CoordinateOutOfRange,
                        format!(
                            "({}, {}) {}; coordinates dropped",
                            coordinates.latitude, coordinates.longitude, reason
                        ),
                    ));
                }
                None
            }
        }
    }
}

/// Separate an entry into its attribute object and geometry.
///
/// Accepts GeoJSON features and bare attribute objects (no `type`, no
/// `properties`), which are treated as properties without geometry.
fn split_feature(
    object: &Map<String, Value>,
    strict: bool,
) -> Result<(Map<String, Value>, Option<&Value>), String> {
    let declared_type = object.get("type").and_then(Value::as_str);
    let geometry = object.get("geometry").filter(|g| !g.is_null());

    if strict {
        if let Some(kind) = declared_type {
            if kind != "Feature" {
                return Err(format!("expected type 'Feature', found '{kind}'"));
            }
        }
    }

    match object.get("properties") {
        Some(Value::Object(properties)) => Ok((properties.clone(), geometry)),
        Some(Value::Null) => Ok((Map::new(), geometry)),
        Some(other) => Err(format!(
            "'properties' is {}, expected an object",
            json_type_name(other)
        )),
        None if declared_type.is_some() => Ok((Map::new(), geometry)),
        None => {
            let mut properties = object.clone();
            properties.remove("geometry");
            Ok((properties, geometry))
        }
    }
}

/// Parse a GeoJSON geometry; returns `(longitude, latitude)` for points
fn parse_geometry(geometry: &Value) -> Result<Option<(f64, f64)>, String> {
    let object = geometry
        .as_object()
        .ok_or_else(|| format!("geometry is {}", json_type_name(geometry)))?;
    let kind = object
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| "geometry has no type".to_string())?;

    if kind == "GeometryCollection" {
        return match object.get("geometries") {
            Some(Value::Array(_)) => Ok(None),
            _ => Err("GeometryCollection without 'geometries' array".to_string()),
        };
    }

    let coordinates = object
        .get("coordinates")
        .and_then(Value::as_array)
        .ok_or_else(|| format!("{kind} has no coordinates array"))?;

    if kind == "Point" {
        let longitude = coordinates.first().and_then(Value::as_f64);
        let latitude = coordinates.get(1).and_then(Value::as_f64);
        return match (longitude, latitude) {
            (Some(lon), Some(lat)) => Ok(Some((lon, lat))),
            _ => Err("Point coordinates are not a numeric [longitude, latitude] pair".to_string()),
        };
    }

    if NON_POINT_GEOMETRIES.contains(&kind) {
        Ok(None)
    } else {
        Err(format!("unknown geometry type '{kind}'"))
    }
}

fn type_conforms(field: CanonicalField, value: &Value) -> bool {
    match field.value_kind() {
        ValueKind::Text => as_text(value).is_some(),
        ValueKind::Year => as_year(value).is_some(),
        ValueKind::Amount => as_amount(value).is_some(),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn truncate_value(value: &Value) -> String {
    let rendered = value.to_string();
    if rendered.chars().count() > 60 {
        format!("{}...", rendered.chars().take(60).collect::<String>())
    } else {
        rendered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CoordinateBounds, FieldMappingSettings};
    use serde_json::json;

    fn validator(settings: ValidationSettings) -> Validator {
        let table = FieldMappingTable::from_settings(&FieldMappingSettings::default(), &settings);
        Validator::new(settings, table)
    }

    fn feature(properties: Value, geometry: Value) -> RawFeature {
        RawFeature {
            index: 0,
            value: json!({"type": "Feature", "properties": properties, "geometry": geometry}),
        }
    }

    fn complete_properties() -> Value {
        json!({
            "AddressPoints.TRUE_SITE_": "1 MAIN ST",
            "AddressPoints.TRUE_OWNER": "DOE JANE"
        })
    }

    #[test]
    fn test_valid_point_feature() {
        let raw = feature(
            complete_properties(),
            json!({"type": "Point", "coordinates": [-80.27, 25.72]}),
        );
        let outcome = validator(ValidationSettings::default()).validate(&raw);
        let validated = outcome.feature.expect("record should pass");
        let coords = validated.coordinates.unwrap();
        assert_eq!(coords.latitude, 25.72);
        assert_eq!(coords.longitude, -80.27);
        // Optional mapped fields that are absent produce info findings only
        assert!(outcome.findings.iter().all(|f| f.severity == Severity::Info));
    }

    #[test]
    fn test_missing_owner_excludes_record() {
        let raw = feature(json!({"AddressPoints.TRUE_SITE_": "1 MAIN ST"}), Value::Null);
        let outcome = validator(ValidationSettings::default()).validate(&raw);
        assert!(outcome.is_excluded());
        let errors: Vec<_> = outcome.findings.iter().filter(|f| f.is_error()).collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, FindingKind::RequiredFieldMissing);
        assert_eq!(errors[0].field.as_deref(), Some("owner"));
    }

    #[test]
    fn test_missing_owner_allowed_without_required_check() {
        let settings = ValidationSettings {
            check_required_fields: false,
            ..Default::default()
        };
        let raw = feature(json!({"AddressPoints.TRUE_SITE_": "1 MAIN ST"}), Value::Null);
        let outcome = validator(settings).validate(&raw);
        assert!(!outcome.is_excluded());
        assert!(outcome.findings.iter().any(|f| {
            f.kind == FindingKind::MissingMappedField && f.field.as_deref() == Some("owner")
        }));
    }

    #[test]
    fn test_unparsable_geometry_is_structural() {
        let raw = feature(
            complete_properties(),
            json!({"type": "Point", "coordinates": ["east", "north"]}),
        );
        let outcome = validator(ValidationSettings::default()).validate(&raw);
        assert!(outcome.is_excluded());
        assert_eq!(
            outcome.findings[0].kind,
            FindingKind::StructuralValidationFailure
        );
    }

    #[test]
    fn test_non_object_entry_is_structural() {
        let raw = RawFeature {
            index: 3,
            value: json!("not a feature"),
        };
        let outcome = validator(ValidationSettings::default()).validate(&raw);
        assert!(outcome.is_excluded());
        assert_eq!(outcome.findings[0].record_id.as_deref(), Some("property_000004"));
    }

    #[test]
    fn test_out_of_range_coordinates_dropped_with_warning() {
        let raw = feature(
            complete_properties(),
            json!({"type": "Point", "coordinates": [-80.27, 125.0]}),
        );
        let outcome = validator(ValidationSettings::default()).validate(&raw);
        let validated = outcome.feature.as_ref().unwrap();
        assert!(validated.coordinates.is_none());
        assert!(outcome.findings.iter().any(|f| {
            f.kind == FindingKind::CoordinateOutOfRange && f.severity == Severity::Warning
        }));
    }

    #[test]
    fn test_configured_bounds() {
        let settings = ValidationSettings {
            coordinate_bounds: Some(CoordinateBounds {
                min_latitude: 25.6,
                max_latitude: 25.8,
                min_longitude: -80.4,
                max_longitude: -80.2,
            }),
            ..Default::default()
        };
        let raw = feature(
            complete_properties(),
            json!({"type": "Point", "coordinates": [-81.0, 25.7]}),
        );
        let outcome = validator(settings).validate(&raw);
        assert!(outcome.feature.unwrap().coordinates.is_none());
    }

    #[test]
    fn test_type_mismatch_suppresses_field() {
        let raw = feature(
            json!({
                "AddressPoints.TRUE_SITE_": "1 MAIN ST",
                "AddressPoints.TRUE_OWNER": "DOE JANE",
                "AddressPoints.YEAR_BUILT": "circa 1920",
                "AddressPoints.BUILDING_V": "$150,000"
            }),
            Value::Null,
        );
        let outcome = validator(ValidationSettings::default()).validate(&raw);
        let validated = outcome.feature.as_ref().unwrap();
        assert!(validated.suppressed.contains(&CanonicalField::YearBuilt));
        assert!(!validated.suppressed.contains(&CanonicalField::BuildingValue));
        let mismatches: Vec<_> = outcome
            .findings
            .iter()
            .filter(|f| f.kind == FindingKind::TypeMismatch)
            .collect();
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].severity, Severity::Warning);
    }

    #[test]
    fn test_attribute_object_without_feature_wrapper() {
        let raw = RawFeature {
            index: 0,
            value: complete_properties(),
        };
        let outcome = validator(ValidationSettings::default()).validate(&raw);
        assert!(!outcome.is_excluded());
    }

    #[test]
    fn test_polygon_has_no_point() {
        let raw = feature(
            complete_properties(),
            json!({"type": "Polygon", "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]}),
        );
        let outcome = validator(ValidationSettings::default()).validate(&raw);
        let validated = outcome.feature.unwrap();
        assert!(validated.coordinates.is_none());
    }

    #[test]
    fn test_wrong_feature_type() {
        let raw = RawFeature {
            index: 0,
            value: json!({"type": "FeatureCollection", "properties": {}}),
        };
        let outcome = validator(ValidationSettings::default()).validate(&raw);
        assert!(outcome.is_excluded());
    }
}
