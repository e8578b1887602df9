//! Domain types shared by every pipeline stage

pub mod artifact;
pub mod property;

pub use artifact::{
    DerivedArtifacts, PropertyStory, QaCategory, QaPair, QueryType, RagChunk, RagChunkMetadata,
    SearchQuery,
};
pub use property::{CanonicalField, Coordinates, PropertyRecord, ValueKind, format_amount};
