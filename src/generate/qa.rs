//! Question/answer pair generation
//!
//! Each category owns an ordered list of templates. A template is only filled
//! when every field it mentions is present on the record. Candidates from
//! the enabled categories are interleaved (administrative, geographic,
//! financial) and truncated to the per-property limit, so enabling a
//! category can only add pairs.

use crate::config::QaPairSettings;
use crate::models::{PropertyRecord, QaCategory, QaPair, format_amount};

const FLOOD_ZONE_YES: &[&str] = &["YES", "TRUE", "1", "FLOOD"];

struct Candidate {
    category: QaCategory,
    template: &'static str,
    question: String,
    answer: String,
}

/// Generates QA pairs from mapped records
#[derive(Debug, Clone)]
pub struct QaPairGenerator {
    max_pairs: usize,
    categories: Vec<QaCategory>,
}

impl QaPairGenerator {
    pub fn new(settings: &QaPairSettings) -> Self {
        let mut categories = Vec::new();
        if settings.include_administrative {
            categories.push(QaCategory::Administrative);
        }
        if settings.include_geographic {
            categories.push(QaCategory::Geographic);
        }
        if settings.include_financial {
            categories.push(QaCategory::Financial);
        }
        Self {
            max_pairs: settings.max_pairs_per_property,
            categories,
        }
    }

    pub fn enabled_categories(&self) -> &[QaCategory] {
        &self.categories
    }

    /// Pairs for one record. Records without an address yield none, since
    /// every question is phrased about the address.
    pub fn generate(&self, record: &PropertyRecord, context: Option<&str>) -> Vec<QaPair> {
        let Some(address) = record.address.as_deref() else {
            return Vec::new();
        };

        let mut per_category: Vec<std::vec::IntoIter<Candidate>> = self
            .categories
            .iter()
            .map(|category| candidates(*category, record, address).into_iter())
            .collect();

        let mut selected = Vec::new();
        while selected.len() < self.max_pairs {
            let mut progressed = false;
            for queue in per_category.iter_mut() {
                if selected.len() >= self.max_pairs {
                    break;
                }
                if let Some(candidate) = queue.next() {
                    selected.push(candidate);
                    progressed = true;
                }
            }
            if !progressed {
                break;
            }
        }

        selected
            .into_iter()
            .enumerate()
            .map(|(i, candidate)| QaPair {
                id: format!("qa_{:06}_{:02}", record.source_index + 1, i + 1),
                record_id: record.id.clone(),
                address: address.to_string(),
                category: candidate.category,
                template: candidate.template.to_string(),
                question: candidate.question,
                answer: candidate.answer,
                context: context.map(str::to_string),
            })
            .collect()
    }
}

fn candidates(category: QaCategory, record: &PropertyRecord, address: &str) -> Vec<Candidate> {
    let mut out = Vec::new();
    let mut push = |template: &'static str, question: String, answer: String| {
        out.push(Candidate {
            category,
            template,
            question,
            answer,
        });
    };

    match category {
        QaCategory::Administrative => {
            if let Some(owner) = &record.owner {
                push(
                    "owner",
                    format!("Who owns the property at {address}?"),
                    format!("The property at {address} is owned by {owner}."),
                );
            }
            if let Some(zoning) = &record.zoning {
                push(
                    "zoning",
                    format!("What is the zoning for {address}?"),
                    format!("The property at {address} is zoned as {zoning}."),
                );
            }
            if let Some(route) = &record.trash_route {
                push(
                    "trash_route",
                    format!("What trash route serves {address}?"),
                    format!("The property at {address} is served by trash route {route}."),
                );
            }
            if let Some(year) = record.year_built {
                push(
                    "year_built",
                    format!("When was {address} built?"),
                    format!("The building at {address} was constructed in {year}."),
                );
            }
            if let Some(folio) = &record.folio {
                push(
                    "folio",
                    format!("What is the folio number for {address}?"),
                    format!("The folio number for {address} is {folio}."),
                );
            }
        }
        QaCategory::Geographic => {
            if let Some(neighborhood) = &record.neighborhood {
                push(
                    "neighborhood",
                    format!("What neighborhood is {address} in?"),
                    format!("The property at {address} is in the {neighborhood} neighborhood."),
                );
            }
            if let Some(municipality) = &record.municipality {
                push(
                    "municipality",
                    format!("Which municipality is {address} in?"),
                    format!("The property at {address} is in {municipality}."),
                );
            }
            if let Some(flood_zone) = &record.flood_zone {
                let answer = if FLOOD_ZONE_YES.contains(&flood_zone.to_uppercase().as_str()) {
                    format!("Yes, the property at {address} is located in a flood zone.")
                } else {
                    format!("No, the property at {address} is not in a flood zone.")
                };
                push("flood_zone", format!("Is {address} in a flood zone?"), answer);
            }
            if let Some(coords) = record.coordinates {
                push(
                    "coordinates",
                    format!("Where is {address} located?"),
                    format!(
                        "The property at {address} is located at coordinates {:.6}, {:.6}.",
                        coords.latitude, coords.longitude
                    ),
                );
            }
        }
        QaCategory::Financial => {
            if let Some(value) = record.building_value {
                push(
                    "building_value",
                    format!("What is the building value of {address}?"),
                    format!(
                        "The building value of {address} is {}.",
                        format_amount(value)
                    ),
                );
            }
            if let Some(value) = record.total_value {
                push(
                    "total_value",
                    format!("What is the total value of {address}?"),
                    format!("The total value of {address} is {}.", format_amount(value)),
                );
            }
            if let Some(value) = record.land_value {
                push(
                    "land_value",
                    format!("What is the land value of {address}?"),
                    format!("The land value of {address} is {}.", format_amount(value)),
                );
            }
        }
    }
    out
}
