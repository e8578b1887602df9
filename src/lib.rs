//! Parcel Pipeline - batch ETL for municipal property records
//!
//! Provides:
//! - Loading of GeoJSON-like property documents
//! - Validation and declarative field mapping onto canonical fields
//! - Fixed-size chunk and attribute-group splits in JSON, JSONL and CSV
//! - QA pairs, RAG chunks, property stories and search queries for LLM training
//! - Field analysis, statistics and human-readable reports
//! - Error collection with a stop threshold, backups and rotating logs

pub mod analysis;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod generate;
pub mod ingest;
pub mod logging;
pub mod mapping;
pub mod models;
pub mod output;
pub mod pipeline;
pub mod split;
pub mod validation;

use std::path::Path;

use anyhow::Context;

// Re-export commonly used types
pub use config::{ConfigError, Settings};
pub use models::{CanonicalField, DerivedArtifacts, PropertyRecord};
pub use pipeline::{
    PipelineError, PipelineExecutor, PipelineReport, PipelineStage, PipelineStatus, RunCounts,
};
pub use validation::{FindingKind, Severity, ValidationFinding};

/// Load a settings document and run the full pipeline
pub fn run_pipeline(config_path: impl AsRef<Path>) -> anyhow::Result<PipelineReport> {
    let config_path = config_path.as_ref();
    let settings = Settings::load(config_path)
        .with_context(|| format!("loading settings from {}", config_path.display()))?;
    let mut executor = PipelineExecutor::new(settings)?;
    let report = executor
        .run()
        .with_context(|| format!("pipeline run {}", executor.summary().run_id))?;
    Ok(report)
}
