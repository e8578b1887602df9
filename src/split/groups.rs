//! Attribute splits: one group per distinct value of a field

use std::collections::{BTreeMap, HashSet};

use crate::models::{CanonicalField, PropertyRecord};

const MAX_COMPONENT_LEN: usize = 50;

/// Records sharing one value of a field, in source order
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeGroup<'a> {
    pub field: CanonicalField,
    pub value: String,
    /// File stem, unique among the groups of one field
    pub stem: String,
    pub records: Vec<&'a PropertyRecord>,
}

impl AttributeGroup<'_> {
    /// File stem, e.g. `zoning_MX2`
    pub fn file_stem(&self) -> &str {
        &self.stem
    }
}

/// Group records by a field's value; absent values group under `Unknown`.
/// Groups are ordered by value.
///
/// Distinct values can sanitize to the same stem (`SMITH/JOHN` and
/// `SMITH JOHN`, or long names sharing a prefix). Later groups in value order
/// then get a `_2`, `_3`, ... suffix. Stems are compared case-insensitively
/// so they stay distinct on case-folding filesystems.
pub fn group_by_field(records: &[PropertyRecord], field: CanonicalField) -> Vec<AttributeGroup<'_>> {
    let mut groups: BTreeMap<String, Vec<&PropertyRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(record.group_key(field)).or_default().push(record);
    }

    let mut taken: HashSet<String> = HashSet::new();
    groups
        .into_iter()
        .map(|(value, records)| {
            let base = format!("{}_{}", field.name(), sanitize_file_component(&value));
            let mut stem = base.clone();
            let mut n = 1;
            while !taken.insert(stem.to_lowercase()) {
                n += 1;
                stem = format!("{base}_{n}");
            }
            AttributeGroup {
                field,
                value,
                stem,
                records,
            }
        })
        .collect()
}

/// Make a value safe as a file-name component
pub fn sanitize_file_component(value: &str) -> String {
    let cleaned: String = value
        .trim()
        .chars()
        .map(|c| match c {
            ' ' | '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .take(MAX_COMPONENT_LEN)
        .collect();
    if cleaned.is_empty() {
        "Unknown".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize_file_component("CITY OF CORAL GABLES"), "CITY_OF_CORAL_GABLES");
        assert_eq!(sanitize_file_component("A/B\\C"), "A_B_C");
        assert_eq!(sanitize_file_component(&"X".repeat(80)).len(), 50);
        assert_eq!(sanitize_file_component("  "), "Unknown");
    }

    #[test]
    fn test_group_by_zoning() {
        let mut records: Vec<PropertyRecord> = (0..5).map(PropertyRecord::new).collect();
        records[0].zoning = Some("SFR".to_string());
        records[1].zoning = Some("MX2".to_string());
        records[2].zoning = Some("SFR".to_string());
        let groups = group_by_field(&records, CanonicalField::Zoning);
        let summary: Vec<(&str, usize)> = groups
            .iter()
            .map(|g| (g.value.as_str(), g.records.len()))
            .collect();
        assert_eq!(summary, vec![("MX2", 1), ("SFR", 2), ("Unknown", 2)]);
        assert_eq!(groups[1].records[1].id, "property_000003");
        assert_eq!(groups[1].file_stem(), "zoning_SFR");
    }

    #[test]
    fn test_colliding_stems_are_disambiguated() {
        let mut records: Vec<PropertyRecord> = (0..4).map(PropertyRecord::new).collect();
        records[0].owner = Some("SMITH/JOHN".to_string());
        records[1].owner = Some("SMITH JOHN".to_string());
        records[2].owner = Some("smith john".to_string());
        records[3].owner = Some("SMITH JOHN".to_string());

        let groups = group_by_field(&records, CanonicalField::Owner);
        let stems: Vec<&str> = groups.iter().map(|g| g.file_stem()).collect();
        assert_eq!(stems, vec!["owner_SMITH_JOHN", "owner_SMITH_JOHN_2", "owner_smith_john_3"]);
        assert_eq!(groups[0].value, "SMITH JOHN");
        assert_eq!(groups[0].records.len(), 2);
        assert_eq!(groups.iter().map(|g| g.records.len()).sum::<usize>(), 4);
    }

    #[test]
    fn test_long_values_sharing_a_prefix() {
        let prefix = "A".repeat(60);
        let mut records: Vec<PropertyRecord> = (0..2).map(PropertyRecord::new).collect();
        records[0].owner = Some(format!("{prefix} ONE"));
        records[1].owner = Some(format!("{prefix} TWO"));
        let groups = group_by_field(&records, CanonicalField::Owner);
        assert_ne!(groups[0].file_stem(), groups[1].file_stem());
    }
}
