//! Pipeline stages and their per-stage output records

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineStage {
    /// Load and decode the input document
    Read,
    /// Validate and map every record
    Validate,
    /// Order and partition records into chunks
    Split,
    /// Build stories, QA pairs, RAG chunks and search queries
    Generate,
    /// Field analysis and statistics
    Analyze,
    /// Write chunks, groups and artifacts
    Write,
    /// Write reports
    Report,
}

impl PipelineStage {
    /// Get all stages in order
    pub fn all() -> Vec<Self> {
        vec![
            Self::Read,
            Self::Validate,
            Self::Split,
            Self::Generate,
            Self::Analyze,
            Self::Write,
            Self::Report,
        ]
    }

    /// Stages a dry run executes
    pub fn dry_run() -> Vec<Self> {
        vec![Self::Read, Self::Validate]
    }

    /// Get stage name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Validate => "validate",
            Self::Split => "split",
            Self::Generate => "generate",
            Self::Analyze => "analyze",
            Self::Write => "write",
            Self::Report => "report",
        }
    }

    /// Get stage description
    pub fn description(&self) -> &'static str {
        match self {
            Self::Read => "Load the input document",
            Self::Validate => "Validate and map records",
            Self::Split => "Partition records into chunks",
            Self::Generate => "Generate training artifacts",
            Self::Analyze => "Compute field analysis and statistics",
            Self::Write => "Write chunks and artifacts",
            Self::Report => "Write run reports",
        }
    }

    /// Get stage number (1-indexed)
    pub fn index(&self) -> usize {
        match self {
            Self::Read => 1,
            Self::Validate => 2,
            Self::Split => 3,
            Self::Generate => 4,
            Self::Analyze => 5,
            Self::Write => 6,
            Self::Report => 7,
        }
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for PipelineStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "read" | "1" => Ok(Self::Read),
            "validate" | "2" => Ok(Self::Validate),
            "split" | "3" => Ok(Self::Split),
            "generate" | "4" => Ok(Self::Generate),
            "analyze" | "5" => Ok(Self::Analyze),
            "write" | "6" => Ok(Self::Write),
            "report" | "7" => Ok(Self::Report),
            _ => Err(format!("Unknown stage: {}", s)),
        }
    }
}

/// Output from a pipeline stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageOutput {
    /// Whether the stage was successful
    pub success: bool,
    /// Whether the stage was skipped
    pub skipped: bool,
    /// Reason for skipping (if applicable)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<String>,
    /// Output file paths
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<PathBuf>,
    /// Stage-specific metadata
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
    /// Duration in milliseconds
    pub duration_ms: u64,
    pub timestamp: DateTime<Utc>,
}

impl StageOutput {
    fn with_state(success: bool, skipped: bool, skip_reason: Option<String>) -> Self {
        Self {
            success,
            skipped,
            skip_reason,
            files: Vec::new(),
            metadata: HashMap::new(),
            duration_ms: 0,
            timestamp: Utc::now(),
        }
    }

    /// Create a successful stage output
    pub fn success() -> Self {
        Self::with_state(true, false, None)
    }

    /// Create a skipped stage output
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self::with_state(true, true, Some(reason.into()))
    }

    /// Create a failed stage output
    pub fn failed() -> Self {
        Self::with_state(false, false, None)
    }

    /// Add an output file
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.files.push(path.into());
        self
    }

    /// Add multiple output files
    pub fn with_files(mut self, paths: Vec<PathBuf>) -> Self {
        self.files.extend(paths);
        self
    }

    /// Add metadata
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Set duration
    pub fn with_duration(mut self, ms: u64) -> Self {
        self.duration_ms = ms;
        self
    }

    /// Status word for summaries
    pub fn status_label(&self) -> &'static str {
        if self.skipped {
            "skipped"
        } else if self.success {
            "ok"
        } else {
            "failed"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order() {
        let stages = PipelineStage::all();
        assert_eq!(stages.len(), 7);
        assert_eq!(stages[0], PipelineStage::Read);
        assert_eq!(stages[6], PipelineStage::Report);
        for (i, stage) in stages.iter().enumerate() {
            assert_eq!(stage.index(), i + 1);
        }
    }

    #[test]
    fn test_stage_parse() {
        assert_eq!("validate".parse::<PipelineStage>().unwrap(), PipelineStage::Validate);
        assert_eq!("4".parse::<PipelineStage>().unwrap(), PipelineStage::Generate);
        assert_eq!("WRITE".parse::<PipelineStage>().unwrap(), PipelineStage::Write);
        assert!("ingest".parse::<PipelineStage>().is_err());
    }

    #[test]
    fn test_stage_output_builder() {
        let output = StageOutput::success()
            .with_file("/out/split_output/chunks/chunk_001.json")
            .with_metadata("records", serde_json::json!(50))
            .with_duration(1500);

        assert!(output.success);
        assert!(!output.skipped);
        assert_eq!(output.files.len(), 1);
        assert_eq!(output.duration_ms, 1500);
        assert_eq!(output.status_label(), "ok");
    }

    #[test]
    fn test_skipped_and_failed_labels() {
        let skipped = StageOutput::skipped("no generators enabled");
        assert_eq!(skipped.status_label(), "skipped");
        assert_eq!(skipped.skip_reason.as_deref(), Some("no generators enabled"));
        assert_eq!(StageOutput::failed().status_label(), "failed");
    }
}
