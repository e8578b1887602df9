//! Aggregate statistics over mapped records
//!
//! Each category is computed independently. A disabled category is `None`
//! and is omitted from the serialized report rather than written as zeros.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Datelike;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::StatisticsSettings;
use crate::models::{CanonicalField, PropertyRecord};

const EARLIEST_PLAUSIBLE_YEAR: i32 = 1800;

static CORPORATE_OWNER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(LLC|INC|CORP|LTD|TRUST|ASSOCIATION|COMPANY|CO)\b").unwrap()
});

/// Total-value bands, lower bound inclusive, upper bound exclusive
const VALUE_RANGES: &[(f64, f64, &str)] = &[
    (0.0, 100_000.0, "Under $100k"),
    (100_000.0, 250_000.0, "$100k-$250k"),
    (250_000.0, 500_000.0, "$250k-$500k"),
    (500_000.0, 1_000_000.0, "$500k-$1M"),
    (1_000_000.0, 2_500_000.0, "$1M-$2.5M"),
    (2_500_000.0, 5_000_000.0, "$2.5M-$5M"),
    (5_000_000.0, f64::INFINITY, "Over $5M"),
];

/// Count, centre and spread of a numeric sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericSummary {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    /// Sample standard deviation, zero for fewer than two values
    pub std_dev: f64,
}

impl NumericSummary {
    /// Summary of `values`, `None` when empty
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let count = values.len();
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let mean = sorted.iter().sum::<f64>() / count as f64;
        let median = if count % 2 == 0 {
            (sorted[count / 2 - 1] + sorted[count / 2]) / 2.0
        } else {
            sorted[count / 2]
        };
        let std_dev = if count > 1 {
            let variance =
                sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (count - 1) as f64;
            variance.sqrt()
        } else {
            0.0
        };

        Some(Self {
            count,
            mean,
            median,
            min: sorted[0],
            max: sorted[count - 1],
            std_dev,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overview {
    pub total_records: usize,
    pub with_address: usize,
    pub with_owner: usize,
    pub with_value: usize,
    pub with_year_built: usize,
    pub unique_owners: usize,
    pub unique_zonings: usize,
    pub unique_neighborhoods: usize,
    pub unique_municipalities: usize,
    pub unique_trash_routes: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OwnerType {
    Corporate,
    Individual,
    Unknown,
}

impl OwnerType {
    pub fn classify(owner: Option<&str>) -> Self {
        match owner {
            None => Self::Unknown,
            Some(name) => {
                if CORPORATE_OWNER.is_match(name) {
                    Self::Corporate
                } else {
                    Self::Individual
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCount {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnershipStatistics {
    pub top_owners: Vec<RankedCount>,
    pub owner_types: BTreeMap<OwnerType, usize>,
    pub properties_per_owner: Option<NumericSummary>,
    pub owners_with_multiple_properties: usize,
}

/// Total value of the records in one group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupValue {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedValue {
    pub name: String,
    pub mean_value: f64,
    pub count: usize,
}

/// Distribution and value analysis for a grouping field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupStatistics {
    pub distinct: usize,
    pub distribution: BTreeMap<String, usize>,
    pub value_by_group: BTreeMap<String, GroupValue>,
    pub top_by_mean_value: Vec<RankedValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueBucket {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueStatistics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_value: Option<NumericSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building_value: Option<NumericSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub land_value: Option<NumericSummary>,
    pub ranges: Vec<ValueBucket>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearBuiltStatistics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<NumericSummary>,
    /// Years outside the plausible range
    pub excluded: usize,
    /// Keyed by decade start, e.g. `1950`
    pub by_decade: BTreeMap<i32, usize>,
}

/// Aggregates for every enabled category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsReport {
    pub overview: Overview,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ownership: Option<OwnershipStatistics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoning: Option<GroupStatistics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<ValueStatistics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_built: Option<YearBuiltStatistics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neighborhood: Option<GroupStatistics>,
}

/// Computes a [`StatisticsReport`] from the mapped record set
#[derive(Debug, Clone)]
pub struct StatisticsEngine {
    settings: StatisticsSettings,
    current_year: i32,
}

impl StatisticsEngine {
    pub fn new(settings: StatisticsSettings) -> Self {
        Self {
            settings,
            current_year: chrono::Utc::now().year(),
        }
    }

    /// Fix the latest plausible construction year
    pub fn with_current_year(mut self, year: i32) -> Self {
        self.current_year = year;
        self
    }

    /// `None` when statistics are disabled
    pub fn compute(&self, records: &[PropertyRecord]) -> Option<StatisticsReport> {
        if !self.settings.enabled {
            return None;
        }
        let s = &self.settings;
        Some(StatisticsReport {
            overview: overview(records),
            ownership: s.ownership_analysis.then(|| self.ownership(records)),
            zoning: s
                .zoning_analysis
                .then(|| self.group_statistics(records, CanonicalField::Zoning)),
            value: s.value_analysis.then(|| value_statistics(records)),
            year_built: s.year_built_analysis.then(|| self.year_built(records)),
            neighborhood: s
                .neighborhood_analysis
                .then(|| self.group_statistics(records, CanonicalField::Neighborhood)),
        })
    }

    fn ownership(&self, records: &[PropertyRecord]) -> OwnershipStatistics {
        let mut per_owner: BTreeMap<&str, usize> = BTreeMap::new();
        let mut owner_types: BTreeMap<OwnerType, usize> = BTreeMap::new();
        for record in records {
            if let Some(owner) = record.owner.as_deref() {
                *per_owner.entry(owner).or_default() += 1;
            }
            *owner_types
                .entry(OwnerType::classify(record.owner.as_deref()))
                .or_default() += 1;
        }

        let counts: Vec<f64> = per_owner.values().map(|c| *c as f64).collect();
        let mut ranked: Vec<RankedCount> = per_owner
            .iter()
            .map(|(name, count)| RankedCount {
                name: name.to_string(),
                count: *count,
            })
            .collect();
        // BTreeMap order makes the name tie-break implicit
        ranked.sort_by(|a, b| b.count.cmp(&a.count));
        ranked.truncate(self.settings.top_n);

        OwnershipStatistics {
            top_owners: ranked,
            owner_types,
            properties_per_owner: NumericSummary::from_values(&counts),
            owners_with_multiple_properties: per_owner.values().filter(|c| **c > 1).count(),
        }
    }

    fn group_statistics(&self, records: &[PropertyRecord], field: CanonicalField) -> GroupStatistics {
        let mut distribution: BTreeMap<String, usize> = BTreeMap::new();
        let mut values: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        for record in records {
            let key = record.group_key(field);
            if let Some(value) = record.total_value.filter(|v| *v > 0.0) {
                values.entry(key.clone()).or_default().push(value);
            }
            *distribution.entry(key).or_default() += 1;
        }

        let value_by_group: BTreeMap<String, GroupValue> = values
            .iter()
            .filter_map(|(key, vals)| {
                NumericSummary::from_values(vals).map(|s| {
                    (
                        key.clone(),
                        GroupValue {
                            count: s.count,
                            mean: s.mean,
                            median: s.median,
                        },
                    )
                })
            })
            .collect();

        let mut top: Vec<RankedValue> = value_by_group
            .iter()
            .map(|(name, v)| RankedValue {
                name: name.clone(),
                mean_value: v.mean,
                count: v.count,
            })
            .collect();
        top.sort_by(|a, b| b.mean_value.total_cmp(&a.mean_value));
        top.truncate(self.settings.top_n);

        GroupStatistics {
            distinct: distribution.len(),
            distribution,
            value_by_group,
            top_by_mean_value: top,
        }
    }

    fn year_built(&self, records: &[PropertyRecord]) -> YearBuiltStatistics {
        let plausible = EARLIEST_PLAUSIBLE_YEAR..=self.current_year;
        let mut years = Vec::new();
        let mut excluded = 0;
        let mut by_decade: BTreeMap<i32, usize> = BTreeMap::new();
        for year in records.iter().filter_map(|r| r.year_built) {
            if plausible.contains(&year) {
                years.push(year as f64);
                *by_decade.entry(year - year.rem_euclid(10)).or_default() += 1;
            } else {
                excluded += 1;
            }
        }
        YearBuiltStatistics {
            summary: NumericSummary::from_values(&years),
            excluded,
            by_decade,
        }
    }
}

fn overview(records: &[PropertyRecord]) -> Overview {
    let distinct = |field: CanonicalField| -> usize {
        records
            .iter()
            .filter_map(|r| r.text(field))
            .collect::<BTreeSet<_>>()
            .len()
    };
    Overview {
        total_records: records.len(),
        with_address: records.iter().filter(|r| r.address.is_some()).count(),
        with_owner: records.iter().filter(|r| r.owner.is_some()).count(),
        with_value: records
            .iter()
            .filter(|r| r.total_value.is_some_and(|v| v > 0.0))
            .count(),
        with_year_built: records.iter().filter(|r| r.year_built.is_some()).count(),
        unique_owners: distinct(CanonicalField::Owner),
        unique_zonings: distinct(CanonicalField::Zoning),
        unique_neighborhoods: distinct(CanonicalField::Neighborhood),
        unique_municipalities: distinct(CanonicalField::Municipality),
        unique_trash_routes: distinct(CanonicalField::TrashRoute),
    }
}

fn positive(records: &[PropertyRecord], pick: fn(&PropertyRecord) -> Option<f64>) -> Vec<f64> {
    records.iter().filter_map(pick).filter(|v| *v > 0.0).collect()
}

fn value_statistics(records: &[PropertyRecord]) -> ValueStatistics {
    let totals = positive(records, |r| r.total_value);
    let ranges = VALUE_RANGES
        .iter()
        .map(|(low, high, label)| ValueBucket {
            label: label.to_string(),
            count: totals.iter().filter(|v| **v >= *low && **v < *high).count(),
        })
        .collect();
    ValueStatistics {
        total_value: NumericSummary::from_values(&totals),
        building_value: NumericSummary::from_values(&positive(records, |r| r.building_value)),
        land_value: NumericSummary::from_values(&positive(records, |r| r.land_value)),
        ranges,
    }
}
