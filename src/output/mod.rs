//! Output writing
//!
//! [`OutputWriter`] serializes chunks, attribute groups, derived artifacts
//! and reports into the configured directories. [`BackupManager`] snapshots
//! existing outputs before a run overwrites them.

mod backup;
mod error;
pub mod writer;

pub use backup::{BackupManager, BackupOutcome};
pub use error::{WriteError, WriteResult};
pub use writer::{
    CHUNKS_DIR, OutputWriter, QA_PAIRS_FILE, RAG_CHUNKS_FILE, SEARCH_QUERIES_FILE, STORIES_FILE,
    csv_header, feature_collection, record_feature, write_jsonl,
};
