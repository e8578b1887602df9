//! Derived artifact generation
//!
//! Generators are pure functions of a record and their settings group, so
//! chunks can be processed in any order and merged by chunk index. Each
//! generator is skipped entirely when its group is disabled.

mod context;
pub mod qa;
pub mod queries;
pub mod rag;
pub mod story;

pub use context::{
    area_description, community_context, district_label, location_description, record_context,
    year_built_sentence, zoning_sentence,
};
pub use qa::QaPairGenerator;
pub use queries::{SearchQueryGenerator, render_search_index};
pub use rag::{RagChunkGenerator, TextChunker, TextWindow, embedding_text};
pub use story::{StoryGenerator, render_story_file, story_file_name, truncate_at_word};

use crate::config::{ConfigResult, LlmTrainingSettings};
use crate::models::{DerivedArtifacts, PropertyRecord, SearchQuery};

/// All enabled generators for a run
#[derive(Debug, Clone)]
pub struct ArtifactGenerator {
    qa: Option<QaPairGenerator>,
    rag: Option<RagChunkGenerator>,
    stories: Option<StoryGenerator>,
    queries: Option<SearchQueryGenerator>,
}

impl ArtifactGenerator {
    pub fn new(settings: &LlmTrainingSettings) -> ConfigResult<Self> {
        let rag = if settings.rag_chunks.enabled {
            Some(RagChunkGenerator::new(&settings.rag_chunks)?)
        } else {
            None
        };
        Ok(Self {
            qa: settings
                .qa_pairs
                .enabled
                .then(|| QaPairGenerator::new(&settings.qa_pairs)),
            rag,
            stories: settings
                .property_stories
                .enabled
                .then(|| StoryGenerator::new(&settings.property_stories)),
            queries: settings
                .search_queries
                .enabled
                .then(|| SearchQueryGenerator::new(&settings.search_queries)),
        })
    }

    /// Per-record artifacts for one chunk, in record order. Search queries
    /// span records and come from [`ArtifactGenerator::search_queries`].
    pub fn generate_chunk(&self, records: &[PropertyRecord]) -> DerivedArtifacts {
        let mut artifacts = DerivedArtifacts::default();
        for record in records {
            let story = self.stories.as_ref().map(|g| g.generate(record));
            if let Some(qa) = &self.qa {
                let context = story.as_ref().map(|s| s.story.as_str());
                artifacts.qa_pairs.extend(qa.generate(record, context));
            }
            if let Some(rag) = &self.rag {
                artifacts.rag_chunks.extend(rag.generate(record));
            }
            if let Some(story) = story {
                artifacts.stories.push(story);
            }
        }
        artifacts
    }

    pub fn search_queries(&self, records: &[PropertyRecord]) -> Vec<SearchQuery> {
        self.queries
            .as_ref()
            .map(|g| g.generate(records))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<PropertyRecord> {
        (0..3)
            .map(|i| {
                let mut r = PropertyRecord::new(i);
                r.address = Some(format!("{} ALHAMBRA CIR", 100 + i));
                r.owner = Some("DOE JANE".to_string());
                r
            })
            .collect()
    }

    #[test]
    fn test_disabled_groups_produce_nothing() {
        let mut settings = LlmTrainingSettings::default();
        settings.qa_pairs.enabled = false;
        settings.rag_chunks.enabled = false;
        settings.property_stories.enabled = false;
        settings.search_queries.enabled = false;
        let generator = ArtifactGenerator::new(&settings).unwrap();
        assert_eq!(generator.generate_chunk(&records()).total(), 0);
        assert!(generator.search_queries(&records()).is_empty());
    }

    #[test]
    fn test_one_story_per_record_and_qa_context() {
        let generator = ArtifactGenerator::new(&LlmTrainingSettings::default()).unwrap();
        let artifacts = generator.generate_chunk(&records());
        assert_eq!(artifacts.stories.len(), 3);
        assert_eq!(artifacts.stories[2].record_id, "property_000003");
        assert_eq!(artifacts.rag_chunks.len(), 3);
        assert!(artifacts.qa_pairs.iter().all(|p| p.context.is_some()));
    }

    #[test]
    fn test_invalid_chunk_settings_rejected() {
        let mut settings = LlmTrainingSettings::default();
        settings.rag_chunks.overlap_size = settings.rag_chunks.chunk_size;
        assert!(ArtifactGenerator::new(&settings).is_err());
    }
}
