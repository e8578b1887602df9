//! Derived artifacts written for downstream language-model consumption

use serde::{Deserialize, Serialize};

use super::property::Coordinates;

/// Category a QA template belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QaCategory {
    Administrative,
    Geographic,
    Financial,
}

impl QaCategory {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Administrative => "administrative",
            Self::Geographic => "geographic",
            Self::Financial => "financial",
        }
    }
}

/// A question/answer pair about a single property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaPair {
    /// `qa_<record>_<pair>`
    pub id: String,
    pub record_id: String,
    pub address: String,
    pub category: QaCategory,
    /// Template the pair was filled from
    pub template: String,
    pub question: String,
    pub answer: String,
    /// Property story, when stories are generated in the same run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// Provenance attached to a RAG window when metadata is enabled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagChunkMetadata {
    pub record_id: String,
    pub chunk_index: usize,
    /// Character offset of the window start in the source narrative
    pub start_offset: usize,
    /// Exclusive character offset of the window end
    pub end_offset: usize,
    pub source_length: usize,
    pub chunk_size: usize,
    pub overlap_size: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neighborhood: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoning: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub municipality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_built: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trash_route: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folio: Option<String>,
}

/// One retrieval window over a property narrative
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagChunk {
    /// `rag_<record>_<window>`
    pub id: String,
    pub record_id: String,
    pub content: String,
    /// Space-separated key attributes of the record, for embedding
    pub embedding_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<RagChunkMetadata>,
}

/// Narrative summary of one property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyStory {
    /// `story_<record>`
    pub id: String,
    pub record_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub story: String,
    pub length: usize,
    pub max_length: usize,
    pub truncated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    PropertySpecific,
    GeneralSearch,
}

/// A retrieval test query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// `query_<n>`
    pub id: String,
    pub query: String,
    pub query_type: QueryType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
}

/// Everything the generators produced for a run, in record order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DerivedArtifacts {
    pub qa_pairs: Vec<QaPair>,
    pub rag_chunks: Vec<RagChunk>,
    pub stories: Vec<PropertyStory>,
    pub search_queries: Vec<SearchQuery>,
}

impl DerivedArtifacts {
    /// Append another batch, preserving order
    pub fn extend(&mut self, other: DerivedArtifacts) {
        self.qa_pairs.extend(other.qa_pairs);
        self.rag_chunks.extend(other.rag_chunks);
        self.stories.extend(other.stories);
        self.search_queries.extend(other.search_queries);
    }

    pub fn total(&self) -> usize {
        self.qa_pairs.len() + self.rag_chunks.len() + self.stories.len() + self.search_queries.len()
    }
}
