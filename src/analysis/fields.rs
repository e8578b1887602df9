//! Raw attribute key profiling

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ingest::RawFeature;
use crate::mapping::FieldMappingTable;

const MAX_SAMPLES: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldProfile {
    /// Entries in which the key holds a non-null value
    pub non_null_count: usize,
    pub unique_values: usize,
    /// Up to ten distinct values, sorted
    pub samples: Vec<String>,
    pub used_in_mapping: bool,
}

/// Profile of every attribute key present in the raw input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldAnalysis {
    pub total_features: usize,
    pub fields: BTreeMap<String, FieldProfile>,
}

impl FieldAnalysis {
    pub fn analyze(features: &[RawFeature], table: &FieldMappingTable) -> Self {
        let mut values: BTreeMap<String, (usize, BTreeSet<String>)> = BTreeMap::new();
        for attributes in features.iter().filter_map(RawFeature::attributes) {
            for (key, value) in attributes {
                let entry = values.entry(key.clone()).or_default();
                if !value.is_null() {
                    entry.0 += 1;
                    entry.1.insert(render(value));
                }
            }
        }

        let fields = values
            .into_iter()
            .map(|(key, (non_null_count, distinct))| {
                let profile = FieldProfile {
                    non_null_count,
                    unique_values: distinct.len(),
                    samples: distinct.into_iter().take(MAX_SAMPLES).collect(),
                    used_in_mapping: table.references_key(&key),
                };
                (key, profile)
            })
            .collect();

        Self {
            total_features: features.len(),
            fields,
        }
    }

    /// Keys present in the data that no mapping reads
    pub fn unmapped_keys(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|(_, p)| !p.used_in_mapping)
            .map(|(k, _)| k.as_str())
            .collect()
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
