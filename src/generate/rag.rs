//! Overlapping text windows for retrieval indexing

use super::context::{area_description, record_context};
use crate::config::{ConfigError, ConfigResult, RagChunkSettings};
use crate::models::{CanonicalField, PropertyRecord, RagChunk, RagChunkMetadata};

/// A window over a text, offsets in characters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextWindow {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

/// Fixed-size character windows with a fixed overlap
#[derive(Debug, Clone, Copy)]
pub struct TextChunker {
    /// Window length in characters
    chunk_size: usize,
    /// Characters shared by consecutive windows
    overlap: usize,
}

impl TextChunker {
    /// Fails with `InvalidChunkConfig` unless `overlap < chunk_size`
    pub fn new(chunk_size: usize, overlap: usize) -> ConfigResult<Self> {
        if chunk_size == 0 || overlap >= chunk_size {
            return Err(ConfigError::InvalidChunkConfig {
                chunk_size,
                overlap_size: overlap,
            });
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    pub fn stride(&self) -> usize {
        self.chunk_size - self.overlap
    }

    /// Split text into windows. Windows start every `stride` characters and
    /// stop once a window reaches the end of the text.
    pub fn windows(&self, text: &str) -> Vec<TextWindow> {
        let chars: Vec<char> = text.chars().collect();
        let mut windows = Vec::new();
        if chars.is_empty() {
            return windows;
        }

        let mut start = 0;
        loop {
            let end = (start + self.chunk_size).min(chars.len());
            windows.push(TextWindow {
                start,
                end,
                text: chars[start..end].iter().collect(),
            });
            if end >= chars.len() {
                break;
            }
            start += self.stride();
        }
        windows
    }
}

/// Fields joined into a chunk's embedding text, in order
const EMBEDDING_FIELDS: [CanonicalField; 7] = [
    CanonicalField::Address,
    CanonicalField::Owner,
    CanonicalField::Zoning,
    CanonicalField::Municipality,
    CanonicalField::Neighborhood,
    CanonicalField::YearBuilt,
    CanonicalField::TrashRoute,
];

/// Key attributes of a record joined by spaces; absent fields are skipped
pub fn embedding_text(record: &PropertyRecord) -> String {
    EMBEDDING_FIELDS
        .iter()
        .filter_map(|field| record.display_value(*field))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Generates RAG chunks from each property's retrieval narrative
#[derive(Debug, Clone)]
pub struct RagChunkGenerator {
    chunker: TextChunker,
    include_metadata: bool,
    include_community_context: bool,
}

impl RagChunkGenerator {
    pub fn new(settings: &RagChunkSettings) -> ConfigResult<Self> {
        Ok(Self {
            chunker: TextChunker::new(settings.chunk_size, settings.overlap_size)?,
            include_metadata: settings.include_metadata,
            include_community_context: settings.include_community_context,
        })
    }

    /// Labelled field listing used as retrieval content
    pub fn narrative(&self, record: &PropertyRecord) -> String {
        let mut lines: Vec<String> = CanonicalField::all()
            .into_iter()
            .filter_map(|field| {
                record
                    .display_value(field)
                    .map(|value| format!("{}: {}", field.label(), value))
            })
            .collect();
        if let Some(coords) = record.coordinates {
            lines.push(format!(
                "Coordinates: {:.6}, {:.6}",
                coords.latitude, coords.longitude
            ));
            if let Some(area) = area_description(coords) {
                lines.push(format!("Area: {area}"));
            }
        }
        if self.include_community_context {
            if let Some(context) = record_context(record) {
                lines.push(format!("Community: {context}"));
            }
        }
        lines.join("\n")
    }

    pub fn generate(&self, record: &PropertyRecord) -> Vec<RagChunk> {
        self.chunk_text(record, &self.narrative(record))
    }

    /// Window an arbitrary text on behalf of a record
    pub fn chunk_text(&self, record: &PropertyRecord, text: &str) -> Vec<RagChunk> {
        let source_length = text.chars().count();
        let embedding = embedding_text(record);
        self.chunker
            .windows(text)
            .into_iter()
            .enumerate()
            .map(|(chunk_index, window)| {
                let metadata = self.include_metadata.then(|| RagChunkMetadata {
                    record_id: record.id.clone(),
                    chunk_index,
                    start_offset: window.start,
                    end_offset: window.end,
                    source_length,
                    chunk_size: self.chunker.chunk_size,
                    overlap_size: self.chunker.overlap,
                    address: record.address.clone(),
                    neighborhood: record.neighborhood.clone(),
                    zoning: record.zoning.clone(),
                    owner: record.owner.clone(),
                    municipality: record.municipality.clone(),
                    year_built: record.year_built,
                    trash_route: record.trash_route.clone(),
                    coordinates: record.coordinates,
                    folio: record.folio.clone(),
                });
                RagChunk {
                    id: format!("rag_{:06}_{:03}", record.source_index + 1, chunk_index + 1),
                    record_id: record.id.clone(),
                    content: window.text,
                    embedding_text: embedding.clone(),
                    metadata,
                }
            })
            .collect()
    }
}
