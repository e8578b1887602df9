//! Run summary tracking stage progress and counts

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::stage::{PipelineStage, StageOutput};

/// Pipeline execution status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineStatus {
    /// Pipeline is running
    Running,
    /// Pipeline completed successfully
    Completed,
    /// Pipeline failed on a fatal error
    Failed,
    /// Error threshold reached
    Aborted,
}

impl std::fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
            Self::Aborted => write!(f, "aborted"),
        }
    }
}

/// Record and artifact counts of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCounts {
    pub records_read: usize,
    /// Entries that went through validation; below `records_read` when the
    /// run aborted part way
    pub records_processed: usize,
    /// Records that survived validation and mapping
    pub records_valid: usize,
    pub records_excluded: usize,
    pub errors: usize,
    pub warnings: usize,
    pub chunks_written: usize,
    pub qa_pairs: usize,
    pub rag_chunks: usize,
    pub stories: usize,
    pub search_queries: usize,
}

/// State of one pipeline run, persisted as `run_summary.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Unique pipeline run ID
    pub run_id: String,
    /// When the pipeline started
    pub started_at: DateTime<Utc>,
    /// When the summary was last updated
    pub updated_at: DateTime<Utc>,
    pub status: PipelineStatus,
    pub dry_run: bool,
    /// Completed stages
    pub completed_stages: Vec<PipelineStage>,
    /// Current stage (if running)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_stage: Option<PipelineStage>,
    /// Stage outputs keyed by stage name
    pub stage_outputs: HashMap<String, StageOutput>,
    pub counts: RunCounts,
    /// Error message if failed or aborted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Fingerprint of the effective configuration
    pub config_hash: String,
}

impl RunSummary {
    /// Create a summary for a new run
    pub fn new(run_id: impl Into<String>, config_hash: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            run_id: run_id.into(),
            started_at: now,
            updated_at: now,
            status: PipelineStatus::Running,
            dry_run: false,
            completed_stages: Vec::new(),
            current_stage: None,
            stage_outputs: HashMap::new(),
            counts: RunCounts::default(),
            error: None,
            config_hash: config_hash.into(),
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Mark a stage as started
    pub fn start_stage(&mut self, stage: PipelineStage) {
        self.current_stage = Some(stage);
        self.updated_at = Utc::now();
    }

    /// Mark a stage as completed
    pub fn complete_stage(&mut self, stage: PipelineStage, output: StageOutput) {
        self.completed_stages.push(stage);
        self.stage_outputs.insert(stage.name().to_string(), output);
        self.current_stage = None;
        self.updated_at = Utc::now();
    }

    /// Mark a stage as skipped
    pub fn skip_stage(&mut self, stage: PipelineStage, reason: impl Into<String>) {
        self.stage_outputs
            .insert(stage.name().to_string(), StageOutput::skipped(reason));
        self.current_stage = None;
        self.updated_at = Utc::now();
    }

    /// Mark pipeline as completed
    pub fn complete(&mut self) {
        self.status = PipelineStatus::Completed;
        self.current_stage = None;
        self.updated_at = Utc::now();
    }

    /// Mark pipeline as failed. The failing stage keeps a failed output.
    pub fn fail(&mut self, error: impl Into<String>) {
        self.finish_with(PipelineStatus::Failed, error.into());
    }

    /// Mark pipeline as stopped by the error threshold
    pub fn abort(&mut self, error: impl Into<String>) {
        self.finish_with(PipelineStatus::Aborted, error.into());
    }

    fn finish_with(&mut self, status: PipelineStatus, error: String) {
        if let Some(stage) = self.current_stage.take() {
            self.stage_outputs
                .insert(stage.name().to_string(), StageOutput::failed());
        }
        self.status = status;
        self.error = Some(error);
        self.updated_at = Utc::now();
    }

    /// Calculate duration so far
    pub fn duration(&self) -> chrono::Duration {
        self.updated_at - self.started_at
    }
}
