//! Input loading
//!
//! The reader enforces `input.max_file_size_mb`, decodes the declared
//! encoding and extracts the raw record collection from a GeoJSON
//! FeatureCollection, a bare array, or a `{"properties": [...]}` object.

mod error;
pub mod progress;
mod reader;

pub use error::{ReadError, ReadResult};
pub use progress::{RecordProgress, format_bytes, format_number};
pub use reader::{DatasetReader, DocumentShape, RawDocument, RawFeature, parse_document};
