//! Canonical property record and its attribute set

use serde::{Deserialize, Serialize};

/// Canonical attributes a raw parcel is projected onto
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    Address,
    Owner,
    Zoning,
    YearBuilt,
    BuildingValue,
    Neighborhood,
    Municipality,
    TrashRoute,
    LandValue,
    TotalValue,
    FloodZone,
    Folio,
}

/// How a canonical field's raw value is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Free text
    Text,
    /// Integer-like year
    Year,
    /// Numeric currency amount
    Amount,
}

impl CanonicalField {
    /// All fields in canonical column order
    pub fn all() -> Vec<Self> {
        vec![
            Self::Address,
            Self::Owner,
            Self::Zoning,
            Self::YearBuilt,
            Self::BuildingValue,
            Self::Neighborhood,
            Self::Municipality,
            Self::TrashRoute,
            Self::LandValue,
            Self::TotalValue,
            Self::FloodZone,
            Self::Folio,
        ]
    }

    /// Configuration and column name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Address => "address",
            Self::Owner => "owner",
            Self::Zoning => "zoning",
            Self::YearBuilt => "year_built",
            Self::BuildingValue => "building_value",
            Self::Neighborhood => "neighborhood",
            Self::Municipality => "municipality",
            Self::TrashRoute => "trash_route",
            Self::LandValue => "land_value",
            Self::TotalValue => "total_value",
            Self::FloodZone => "flood_zone",
            Self::Folio => "folio",
        }
    }

    /// Human-readable label used in narratives and reports
    pub fn label(&self) -> &'static str {
        match self {
            Self::Address => "Property Address",
            Self::Owner => "Owner",
            Self::Zoning => "Zoning",
            Self::YearBuilt => "Year Built",
            Self::BuildingValue => "Building Value",
            Self::Neighborhood => "Neighborhood",
            Self::Municipality => "Municipality",
            Self::TrashRoute => "Trash Route",
            Self::LandValue => "Land Value",
            Self::TotalValue => "Total Value",
            Self::FloodZone => "Flood Zone",
            Self::Folio => "Folio Number",
        }
    }

    pub fn value_kind(&self) -> ValueKind {
        match self {
            Self::YearBuilt => ValueKind::Year,
            Self::BuildingValue | Self::LandValue | Self::TotalValue => ValueKind::Amount,
            _ => ValueKind::Text,
        }
    }
}

impl std::fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for CanonicalField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        Self::all()
            .into_iter()
            .find(|field| field.name() == normalized)
            .ok_or_else(|| {
                format!(
                    "Unknown field: {}. Valid fields: {}",
                    s,
                    Self::all()
                        .iter()
                        .map(|f| f.name())
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            })
    }
}

/// A latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Whether both components lie within the global WGS84 ranges
    pub fn in_global_range(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// One parcel after projection onto the canonical attribute set.
///
/// Absent optional attributes are `None`; nothing is ever rendered as a blank
/// placeholder. The address is the natural key within a run, `id` is the
/// stable positional identifier (`property_000001`).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PropertyRecord {
    pub id: String,
    /// Zero-based position in the source document
    pub source_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoning: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_built: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neighborhood: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub municipality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trash_route: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub land_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flood_zone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
}

impl PropertyRecord {
    /// Identifier for the record at a zero-based source position
    pub fn id_for_index(index: usize) -> String {
        format!("property_{:06}", index + 1)
    }

    pub fn new(source_index: usize) -> Self {
        Self {
            id: Self::id_for_index(source_index),
            source_index,
            ..Default::default()
        }
    }

    /// Text value of a string-typed field
    pub fn text(&self, field: CanonicalField) -> Option<&str> {
        let value = match field {
            CanonicalField::Address => &self.address,
            CanonicalField::Owner => &self.owner,
            CanonicalField::Zoning => &self.zoning,
            CanonicalField::Neighborhood => &self.neighborhood,
            CanonicalField::Municipality => &self.municipality,
            CanonicalField::TrashRoute => &self.trash_route,
            CanonicalField::FloodZone => &self.flood_zone,
            CanonicalField::Folio => &self.folio,
            _ => return None,
        };
        value.as_deref()
    }

    /// Numeric value of an amount field
    pub fn amount(&self, field: CanonicalField) -> Option<f64> {
        match field {
            CanonicalField::BuildingValue => self.building_value,
            CanonicalField::LandValue => self.land_value,
            CanonicalField::TotalValue => self.total_value,
            _ => None,
        }
    }

    /// Any field rendered as display text, `None` when absent
    pub fn display_value(&self, field: CanonicalField) -> Option<String> {
        match field.value_kind() {
            ValueKind::Text => self.text(field).map(str::to_string),
            ValueKind::Year => self.year_built.map(|y| y.to_string()),
            ValueKind::Amount => self.amount(field).map(format_amount),
        }
    }

    pub fn is_present(&self, field: CanonicalField) -> bool {
        match field.value_kind() {
            ValueKind::Text => self.text(field).is_some(),
            ValueKind::Year => self.year_built.is_some(),
            ValueKind::Amount => self.amount(field).is_some(),
        }
    }

    /// Group key for attribute splits; absent values fall under `Unknown`
    pub fn group_key(&self, field: CanonicalField) -> String {
        match field.value_kind() {
            ValueKind::Amount => self
                .amount(field)
                .map(|v| format!("{:.0}", v))
                .unwrap_or_else(|| "Unknown".to_string()),
            _ => self
                .display_value(field)
                .unwrap_or_else(|| "Unknown".to_string()),
        }
    }
}

/// Format a currency amount as whole dollars with thousands separators
pub fn format_amount(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if rounded < 0.0 {
        format!("-${}", grouped)
    } else {
        format!("${}", grouped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_round_trip_names() {
        for field in CanonicalField::all() {
            assert_eq!(field.name().parse::<CanonicalField>().unwrap(), field);
        }
        assert_eq!(
            "Year Built".parse::<CanonicalField>().unwrap(),
            CanonicalField::YearBuilt
        );
        assert!("parcel_size".parse::<CanonicalField>().is_err());
    }

    #[test]
    fn test_record_ids() {
        assert_eq!(PropertyRecord::id_for_index(0), "property_000001");
        assert_eq!(PropertyRecord::new(41).id, "property_000042");
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0.0), "$0");
        assert_eq!(format_amount(999.4), "$999");
        assert_eq!(format_amount(1_234_567.5), "$1,234,568");
        assert_eq!(format_amount(-2500.0), "-$2,500");
    }

    #[test]
    fn test_display_and_group_key() {
        let mut record = PropertyRecord::new(0);
        record.year_built = Some(1952);
        record.building_value = Some(250_000.0);
        assert_eq!(
            record.display_value(CanonicalField::YearBuilt).as_deref(),
            Some("1952")
        );
        assert_eq!(
            record.display_value(CanonicalField::BuildingValue).as_deref(),
            Some("$250,000")
        );
        assert_eq!(record.group_key(CanonicalField::Owner), "Unknown");
        assert!(!record.is_present(CanonicalField::Owner));
    }

    #[test]
    fn test_coordinate_range() {
        assert!(Coordinates::new(25.72, -80.27).in_global_range());
        assert!(!Coordinates::new(95.0, 0.0).in_global_range());
        assert!(!Coordinates::new(0.0, f64::NAN).in_global_range());
    }

    #[test]
    fn test_absent_fields_not_serialized() {
        let record = PropertyRecord::new(0);
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("owner").is_none());
        assert_eq!(json["id"], "property_000001");
    }
}
