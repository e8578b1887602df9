//! Property story generation

use super::context::{location_description, record_context, year_built_sentence, zoning_sentence};
use crate::config::StorySettings;
use crate::models::{PropertyRecord, PropertyStory, format_amount};

/// Builds one narrative per property
#[derive(Debug, Clone)]
pub struct StoryGenerator {
    max_length: usize,
    include_coordinates: bool,
    include_neighborhood_context: bool,
}

impl StoryGenerator {
    pub fn new(settings: &StorySettings) -> Self {
        Self {
            max_length: settings.max_story_length,
            include_coordinates: settings.include_coordinates,
            include_neighborhood_context: settings.include_neighborhood_context,
        }
    }

    /// Untruncated narrative text for a record
    pub fn narrative(&self, record: &PropertyRecord) -> String {
        let mut sentences = Vec::new();

        let mut opening = match &record.address {
            Some(address) => format!("The property located at {address}"),
            None => "This property".to_string(),
        };
        let mut location = Vec::new();
        if let Some(municipality) = &record.municipality {
            location.push(format!("in {municipality}"));
        }
        if self.include_neighborhood_context {
            if let Some(neighborhood) = &record.neighborhood {
                location.push(format!("within the {neighborhood} neighborhood"));
            }
        }
        if !location.is_empty() {
            opening.push_str(" is situated ");
            opening.push_str(&location.join(" "));
        }
        match &record.owner {
            Some(owner) => opening.push_str(&format!(" and is currently owned by {owner}")),
            None => opening.push_str(" and has no current owner listed"),
        }
        sentences.push(opening);

        if let Some(zoning) = &record.zoning {
            sentences.push(zoning_sentence(zoning));
        }
        if let Some(year) = record.year_built {
            sentences.push(year_built_sentence(year));
        }
        if let Some(route) = &record.trash_route {
            sentences.push(format!("Trash collection is handled via route {route}"));
        }
        if let Some(value) = record.total_value {
            sentences.push(format!("The total property value is {}", format_amount(value)));
        }
        if let Some(value) = record.land_value {
            sentences.push(format!("The land value is {}", format_amount(value)));
        }
        if let Some(value) = record.building_value {
            sentences.push(format!("The building value is {}", format_amount(value)));
        }
        if self.include_coordinates {
            if let Some(coords) = record.coordinates {
                sentences.push(format!(
                    "The property is located {}",
                    location_description(coords)
                ));
            }
        }

        let mut story = sentences.join(". ");
        story.push('.');

        if self.include_neighborhood_context {
            if let Some(context) = record_context(record) {
                story.push(' ');
                story.push_str(context);
            }
        }
        story
    }

    /// Story artifact for a record, truncated to the configured length
    pub fn generate(&self, record: &PropertyRecord) -> PropertyStory {
        let narrative = self.narrative(record);
        let (story, truncated) = truncate_at_word(&narrative, self.max_length);
        PropertyStory {
            id: format!("story_{:06}", record.source_index + 1),
            record_id: record.id.clone(),
            address: record.address.clone(),
            length: story.chars().count(),
            story,
            max_length: self.max_length,
            truncated,
        }
    }
}

/// Story text file name for a zero-based chunk index
pub fn story_file_name(chunk_index: usize) -> String {
    format!("properties_chunk_{:03}.txt", chunk_index + 1)
}

/// Plain-text story file for one chunk. `first_number` is the 1-based
/// position of the chunk's first property among `total` properties.
pub fn render_story_file(
    chunk_index: usize,
    first_number: usize,
    total: usize,
    stories: &[PropertyStory],
    generated_at: &str,
) -> String {
    let last_number = first_number + stories.len().saturating_sub(1);
    let mut out = String::new();
    out.push_str(&format!("PROPERTY STORIES - CHUNK {}\n", chunk_index + 1));
    out.push_str(&format!("Generated: {generated_at}\n"));
    out.push_str(&format!(
        "Properties {first_number} to {last_number} of {total}\n"
    ));
    out.push_str(&"=".repeat(80));
    out.push_str("\n\n");
    for (offset, story) in stories.iter().enumerate() {
        out.push_str(&format!("PROPERTY #{}\n", first_number + offset));
        out.push_str(&story.story);
        out.push_str("\n\n");
    }
    out
}

/// Cut `text` to at most `max_chars` characters, preferring the last
/// whitespace boundary inside the limit. Falls back to a hard cut when the
/// prefix contains no whitespace.
pub fn truncate_at_word(text: &str, max_chars: usize) -> (String, bool) {
    if text.chars().count() <= max_chars {
        return (text.to_string(), false);
    }
    let prefix: String = text.chars().take(max_chars).collect();
    // A cut that lands exactly on a word boundary keeps the whole prefix
    let next_is_space = text
        .chars()
        .nth(max_chars)
        .is_some_and(char::is_whitespace);
    if next_is_space {
        return (prefix.trim_end().to_string(), true);
    }
    match prefix.rfind(char::is_whitespace) {
        Some(pos) if pos > 0 => (prefix[..pos].trim_end().to_string(), true),
        _ => (prefix, true),
    }
}
