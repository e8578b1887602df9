//! Projection of raw attribute objects onto [`PropertyRecord`]

use std::collections::BTreeSet;

use serde_json::{Map, Value};

use super::convert::{as_amount, as_text, as_year};
use super::error::{MappingError, MappingResult};
use super::types::FieldMappingTable;
use crate::models::{CanonicalField, Coordinates, PropertyRecord, ValueKind};

/// Borrowed view of one record ready for mapping
#[derive(Debug, Clone, Copy)]
pub struct MapInput<'a> {
    /// Zero-based source position
    pub index: usize,
    pub properties: &'a Map<String, Value>,
    pub coordinates: Option<Coordinates>,
    /// Fields whose raw value was rejected upstream and must be treated as absent
    pub suppressed: &'a BTreeSet<CanonicalField>,
}

/// Maps raw records through a [`FieldMappingTable`]
#[derive(Debug, Clone)]
pub struct FieldMapper {
    table: FieldMappingTable,
}

impl FieldMapper {
    pub fn new(table: FieldMappingTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &FieldMappingTable {
        &self.table
    }

    /// Project one record. Never fails for a missing optional field; fails
    /// with [`MappingError::RequiredFieldMissing`] for the first required one.
    pub fn map(&self, input: &MapInput<'_>) -> MappingResult<PropertyRecord> {
        let mut record = PropertyRecord::new(input.index);
        record.coordinates = input.coordinates;

        for mapping in self.table.iter() {
            let raw = if input.suppressed.contains(&mapping.field) {
                None
            } else {
                mapping.source_path.resolve(input.properties)
            };
            let assigned = raw.is_some_and(|value| assign(&mut record, mapping.field, value));
            if !assigned && mapping.required {
                return Err(MappingError::RequiredFieldMissing {
                    record_id: record.id,
                    field: mapping.field,
                    source_path: mapping.source_path.to_string(),
                });
            }
        }
        Ok(record)
    }
}

/// Store a converted value; returns false when the value is unusable
fn assign(record: &mut PropertyRecord, field: CanonicalField, value: &Value) -> bool {
    match field.value_kind() {
        ValueKind::Text => {
            let Some(text) = as_text(value) else {
                return false;
            };
            let slot = match field {
                CanonicalField::Address => &mut record.address,
                CanonicalField::Owner => &mut record.owner,
                CanonicalField::Zoning => &mut record.zoning,
                CanonicalField::Neighborhood => &mut record.neighborhood,
                CanonicalField::Municipality => &mut record.municipality,
                CanonicalField::TrashRoute => &mut record.trash_route,
                CanonicalField::FloodZone => &mut record.flood_zone,
                CanonicalField::Folio => &mut record.folio,
                _ => return false,
            };
            *slot = Some(text);
            true
        }
        ValueKind::Year => {
            record.year_built = as_year(value);
            record.year_built.is_some()
        }
        ValueKind::Amount => {
            let amount = as_amount(value);
            let slot = match field {
                CanonicalField::BuildingValue => &mut record.building_value,
                CanonicalField::LandValue => &mut record.land_value,
                CanonicalField::TotalValue => &mut record.total_value,
                _ => return false,
            };
            *slot = amount;
            amount.is_some()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FieldMappingSettings, ValidationSettings};
    use serde_json::json;

    fn mapper() -> FieldMapper {
        FieldMapper::new(FieldMappingTable::from_settings(
            &FieldMappingSettings::default(),
            &ValidationSettings::default(),
        ))
    }

    fn props(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_maps_all_fields() {
        let properties = props(json!({
            "AddressPoints.TRUE_SITE_": "1200 ANASTASIA AVE",
            "AddressPoints.TRUE_OWNER": "BILTMORE HOTEL LLC",
            "AddressPoints.PRIMARY_ZO": "MX2",
            "AddressPoints.YEAR_BUILT": "1926",
            "AddressPoints.BUILDING_V": 12500000,
            "AddressPoints.NEIGHBORHO": "Biltmore",
            "AddressPoints.MUNICIPALI": "Coral Gables",
            "AddressPoints_AddSpatialJoin_10.Route": "R-14",
            "AddressPoints.FOLIO": "0341180010010"
        }));
        let none = BTreeSet::new();
        let input = MapInput {
            index: 4,
            properties: &properties,
            coordinates: Some(Coordinates::new(25.72, -80.28)),
            suppressed: &none,
        };
        let record = mapper().map(&input).unwrap();
        assert_eq!(record.id, "property_000005");
        assert_eq!(record.address.as_deref(), Some("1200 ANASTASIA AVE"));
        assert_eq!(record.year_built, Some(1926));
        assert_eq!(record.building_value, Some(12_500_000.0));
        assert_eq!(record.trash_route.as_deref(), Some("R-14"));
        assert!(record.land_value.is_none());
        assert!(record.coordinates.is_some());
    }

    #[test]
    fn test_missing_optional_is_absent() {
        let properties = props(json!({
            "AddressPoints.TRUE_SITE_": "1 MAIN ST",
            "AddressPoints.TRUE_OWNER": "DOE JANE"
        }));
        let none = BTreeSet::new();
        let input = MapInput {
            index: 0,
            properties: &properties,
            coordinates: None,
            suppressed: &none,
        };
        let record = mapper().map(&input).unwrap();
        assert!(record.zoning.is_none());
        assert!(record.year_built.is_none());
    }

    #[test]
    fn test_missing_required_owner_fails() {
        let properties = props(json!({"AddressPoints.TRUE_SITE_": "1 MAIN ST"}));
        let none = BTreeSet::new();
        let input = MapInput {
            index: 2,
            properties: &properties,
            coordinates: None,
            suppressed: &none,
        };
        let err = mapper().map(&input).unwrap_err();
        assert_eq!(
            err,
            MappingError::RequiredFieldMissing {
                record_id: "property_000003".to_string(),
                field: CanonicalField::Owner,
                source_path: "AddressPoints.TRUE_OWNER".to_string(),
            }
        );
    }

    #[test]
    fn test_suppressed_field_is_absent() {
        let properties = props(json!({
            "AddressPoints.TRUE_SITE_": "1 MAIN ST",
            "AddressPoints.TRUE_OWNER": "DOE JANE",
            "AddressPoints.YEAR_BUILT": "circa 1920"
        }));
        let suppressed: BTreeSet<_> = [CanonicalField::YearBuilt].into_iter().collect();
        let input = MapInput {
            index: 0,
            properties: &properties,
            coordinates: None,
            suppressed: &suppressed,
        };
        let record = mapper().map(&input).unwrap();
        assert!(record.year_built.is_none());
    }
}
