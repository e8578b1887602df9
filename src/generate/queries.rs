//! Retrieval test queries

use super::context::district_label;
use super::story::story_file_name;
use crate::config::SearchQuerySettings;
use crate::models::{PropertyRecord, QueryType, SearchQuery};

const UNKNOWN: &str = "Unknown";

const GENERAL_QUERIES: &[&str] = &[
    "Find all properties owned by the City of Coral Gables",
    "Show me all properties with historical designation",
    "List all condominium properties",
    "Find properties with lot size over 10,000 square feet",
    "Show me properties with total value over $1 million",
    "Find all properties in flood zones",
    "List properties built before 1950",
    "Show me properties with multiple units",
    "Find properties with specific zoning codes",
    "List all properties served by specific trash routes",
];

/// Fills one property-specific pattern, or `None` when the record lacks a
/// value the pattern mentions
type Pattern = fn(&PropertyRecord, &str) -> Option<String>;

const PATTERNS: &[Pattern] = &[
    |r, address| r.owner.as_ref().map(|_| format!("Who owns the property at {address}?")),
    |r, address| r.zoning.as_ref().map(|_| format!("What is the zoning for {address}?")),
    |r, address| {
        r.trash_route
            .as_ref()
            .map(|_| format!("What trash route serves {address}?"))
    },
    |r, address| r.year_built.map(|_| format!("When was {address} built?")),
    |r, address| {
        r.total_value
            .map(|_| format!("What is the property value of {address}?"))
    },
    |r, address| r.flood_zone.as_ref().map(|_| format!("Is {address} in a flood zone?")),
    |r, address| {
        r.neighborhood
            .as_ref()
            .map(|_| format!("What neighborhood is {address} in?"))
    },
    |r, _| {
        r.neighborhood
            .as_ref()
            .map(|n| format!("Who owns properties in {n}?"))
    },
    |r, _| r.owner.as_ref().map(|o| format!("What properties does {o} own?")),
    |r, _| {
        r.zoning
            .as_ref()
            .map(|z| format!("Show me properties with zoning {z}"))
    },
    |r, _| {
        r.trash_route
            .as_ref()
            .map(|t| format!("What properties are served by trash route {t}?"))
    },
    |r, _| r.year_built.map(|y| format!("Find properties built in {y}")),
];

/// Generates property-specific queries for a sample of records followed by
/// a fixed set of general queries
#[derive(Debug, Clone)]
pub struct SearchQueryGenerator {
    sample_properties: usize,
    patterns_per_property: usize,
}

impl SearchQueryGenerator {
    pub fn new(settings: &SearchQuerySettings) -> Self {
        Self {
            sample_properties: settings.sample_properties,
            patterns_per_property: settings.patterns_per_property,
        }
    }

    pub fn generate(&self, records: &[PropertyRecord]) -> Vec<SearchQuery> {
        let mut drafts: Vec<(String, QueryType, Option<String>, Option<String>)> = Vec::new();

        let sampled = records
            .iter()
            .filter_map(|r| r.address.as_deref().map(|a| (r, a)))
            .take(self.sample_properties);
        for (record, address) in sampled {
            for text in PATTERNS
                .iter()
                .filter_map(|pattern| pattern(record, address))
                .take(self.patterns_per_property)
            {
                drafts.push((
                    text,
                    QueryType::PropertySpecific,
                    Some(address.to_string()),
                    Some(record.id.clone()),
                ));
            }
        }
        for text in GENERAL_QUERIES {
            drafts.push((text.to_string(), QueryType::GeneralSearch, None, None));
        }

        drafts
            .into_iter()
            .enumerate()
            .map(|(i, (query, query_type, expected_address, record_id))| SearchQuery {
                id: format!("query_{:06}", i + 1),
                query,
                query_type,
                expected_address,
                record_id,
            })
            .collect()
    }
}

/// Plain-text lookup table with one line per record:
/// `address | owner | story file | Property #n | neighborhood`.
///
/// Story files hold `records_per_file` properties each, so the file column
/// points at the story of that record. The neighborhood column falls back to
/// the district named by the address.
pub fn render_search_index(records: &[PropertyRecord], records_per_file: usize) -> String {
    let per_file = records_per_file.max(1);
    let mut out = String::new();
    out.push_str("PROPERTY SEARCH INDEX\n");
    out.push_str(&"=".repeat(40));
    out.push_str("\n\n");
    out.push_str("Format: Address | Owner | Chunk File | Property Number | Neighborhood Context\n");
    out.push_str(&"-".repeat(100));
    out.push_str("\n\n");

    for (i, record) in records.iter().enumerate() {
        let address = record.address.as_deref().unwrap_or(UNKNOWN);
        let neighborhood = match &record.neighborhood {
            Some(n) => n.as_str(),
            None => district_label(address),
        };
        out.push_str(&format!(
            "{} | {} | {} | Property #{} | {}\n",
            address,
            record.owner.as_deref().unwrap_or(UNKNOWN),
            story_file_name(i / per_file),
            i + 1,
            neighborhood
        ));
    }
    out
}
