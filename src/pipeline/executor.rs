//! Pipeline executor for running the full property pipeline

use std::path::PathBuf;
use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, error, info, info_span, warn};
use uuid::Uuid;

use super::collector::ErrorCollector;
use super::error::{PipelineError, PipelineResult};
use super::stage::{PipelineStage, StageOutput};
use super::summary::{PipelineStatus, RunCounts, RunSummary};
use crate::analysis::{FieldAnalysis, StatisticsEngine, StatisticsReport, render_text_report};
use crate::config::Settings;
use crate::generate::ArtifactGenerator;
use crate::ingest::{DatasetReader, RawDocument, RawFeature, RecordProgress, format_number};
use crate::mapping::{FieldMapper, FieldMappingTable};
use crate::models::{DerivedArtifacts, PropertyRecord};
use crate::output::{BackupManager, OutputWriter, WriteError};
use crate::split::{ChunkSplitter, group_by_field, sort_by_address};
use crate::validation::{FindingKind, ValidationFinding, Validator};

pub const STATISTICS_REPORT_FILE: &str = "statistics_report.json";
pub const ANALYSIS_REPORT_FILE: &str = "analysis_report.txt";
pub const FIELD_ANALYSIS_FILE: &str = "field_analysis.json";
pub const RUN_SUMMARY_FILE: &str = "run_summary.json";
pub const ERROR_REPORT_FILE: &str = "error_report.json";

const REPORT_TITLE: &str = "Property Data Analysis Report";

/// Data handed from one stage to the next
#[derive(Debug, Default)]
struct RunState {
    document: Option<RawDocument>,
    records: Vec<PropertyRecord>,
    artifacts: DerivedArtifacts,
    statistics: Option<StatisticsReport>,
    field_analysis: Option<FieldAnalysis>,
    /// Raw entries validated before the stage finished or aborted
    records_processed: usize,
    records_excluded: usize,
    chunks_written: usize,
}

/// Validation and mapping of one raw entry
#[derive(Debug)]
struct RecordOutcome {
    record: Option<PropertyRecord>,
    findings: Vec<ValidationFinding>,
}

/// Validator and mapper shared by every worker
struct RecordProcessor {
    validator: Validator,
    mapper: FieldMapper,
}

impl RecordProcessor {
    fn process(&self, raw: &RawFeature) -> RecordOutcome {
        let outcome = self.validator.validate(raw);
        let mut findings = outcome.findings;
        let record = outcome
            .feature
            .and_then(|feature| match self.mapper.map(&feature.as_map_input()) {
                Ok(record) => Some(record),
                Err(err) => {
                    findings.push(ValidationFinding::from(&err));
                    None
                }
            });
        RecordOutcome { record, findings }
    }
}

/// Pipeline executor that runs all stages
pub struct PipelineExecutor {
    settings: Settings,
    summary: RunSummary,
    dry_run: bool,
    stop_after: Option<PipelineStage>,
}

impl PipelineExecutor {
    /// Create a new pipeline executor. Fails fast on invalid settings.
    pub fn new(settings: Settings) -> PipelineResult<Self> {
        settings.validate()?;

        let config_hash = settings.fingerprint();
        let run_id = Uuid::new_v4().to_string();

        Ok(Self {
            settings,
            summary: RunSummary::new(run_id, config_hash),
            dry_run: false,
            stop_after: None,
        })
    }

    /// Read, validate and map only; nothing is written
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self.summary = self.summary.with_dry_run(dry_run);
        self
    }

    /// End the run after this stage; later stages neither run nor count
    /// as skipped
    pub fn with_stop_after(mut self, stage: Option<PipelineStage>) -> Self {
        self.stop_after = stage;
        self
    }

    /// Stages this run executes, in order
    pub fn planned_stages(&self) -> Vec<PipelineStage> {
        let stages = if self.dry_run {
            PipelineStage::dry_run()
        } else {
            PipelineStage::all()
        };
        match self.stop_after {
            Some(last) => stages
                .into_iter()
                .filter(|stage| stage.index() <= last.index())
                .collect(),
            None => stages,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Get the current run summary
    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    /// Run the pipeline
    pub fn run(&mut self) -> PipelineResult<PipelineReport> {
        let _span = info_span!(
            "pipeline_run",
            run_id = %self.summary.run_id,
            dry_run = self.dry_run
        )
        .entered();

        let start = Instant::now();
        let stages = self.planned_stages();

        info!(
            run_id = %self.summary.run_id,
            input = %self.settings.input.file_path.display(),
            stages = ?stages.iter().map(|s| s.name()).collect::<Vec<_>>(),
            dry_run = self.dry_run,
            "Starting pipeline"
        );

        let mut state = RunState::default();
        let mut collector = ErrorCollector::new(&self.settings.error_handling);

        for stage in &stages {
            if let Some(reason) = self.should_skip_stage(*stage) {
                debug!(stage = stage.name(), reason = %reason, "Skipping stage");
                self.summary.skip_stage(*stage, &reason);
                continue;
            }

            let _stage_span = info_span!("pipeline_stage", stage = stage.name()).entered();
            info!(stage = stage.name(), "Starting stage");
            self.summary.start_stage(*stage);

            match self.run_stage(*stage, &mut state, &mut collector) {
                Ok(output) => {
                    info!(
                        stage = stage.name(),
                        duration_ms = output.duration_ms,
                        "Stage completed"
                    );
                    self.summary.complete_stage(*stage, output);
                }
                Err(e) => {
                    error!(stage = stage.name(), error = %e, "Stage failed");
                    return Err(self.finish_failed(e, &state, &collector));
                }
            }
        }

        self.summary.counts = counts(&state, &collector);
        self.summary.complete();
        if !self.dry_run && self.settings.analysis.generate_reports {
            let path = self.writer().write_report(RUN_SUMMARY_FILE, &self.summary)?;
            debug!(path = %path.display(), "Saved run summary");
        }

        let duration = start.elapsed();
        info!(
            run_id = %self.summary.run_id,
            duration_ms = duration.as_millis() as u64,
            records_valid = self.summary.counts.records_valid,
            records_excluded = self.summary.counts.records_excluded,
            "Pipeline completed"
        );

        Ok(PipelineReport {
            run_id: self.summary.run_id.clone(),
            status: self.summary.status,
            dry_run: self.dry_run,
            stages_completed: self.summary.completed_stages.clone(),
            duration_ms: duration.as_millis() as u64,
            counts: self.summary.counts,
            outputs: self
                .summary
                .stage_outputs
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        })
    }

    /// Run a single stage
    fn run_stage(
        &self,
        stage: PipelineStage,
        state: &mut RunState,
        collector: &mut ErrorCollector,
    ) -> PipelineResult<StageOutput> {
        let start = Instant::now();

        let output = match stage {
            PipelineStage::Read => self.run_read(state)?,
            PipelineStage::Validate => self.run_validate(state, collector)?,
            PipelineStage::Split => self.run_split(state)?,
            PipelineStage::Generate => self.run_generate(state)?,
            PipelineStage::Analyze => self.run_analyze(state)?,
            PipelineStage::Write => self.run_write(state, collector)?,
            PipelineStage::Report => self.run_report(state, collector)?,
        };

        Ok(output.with_duration(start.elapsed().as_millis() as u64))
    }

    /// Load the input document
    fn run_read(&self, state: &mut RunState) -> PipelineResult<StageOutput> {
        let path = &self.settings.input.file_path;
        let document = DatasetReader::from_settings(&self.settings.input).read(path)?;

        info!(
            path = %path.display(),
            records = document.len(),
            shape = ?document.shape,
            "Loaded input"
        );
        let output = StageOutput::success()
            .with_metadata("source", serde_json::json!(path.display().to_string()))
            .with_metadata("records", serde_json::json!(document.len()))
            .with_metadata("size_bytes", serde_json::json!(document.size_bytes));
        state.document = Some(document);
        Ok(output)
    }

    /// Validate and map every entry, stopping at the error threshold
    fn run_validate(
        &self,
        state: &mut RunState,
        collector: &mut ErrorCollector,
    ) -> PipelineResult<StageOutput> {
        let document = state
            .document
            .as_ref()
            .ok_or_else(|| PipelineError::stage("validate", "no input document loaded"))?;

        let table = FieldMappingTable::from_settings(
            &self.settings.field_mapping,
            &self.settings.validation,
        );
        let processor = RecordProcessor {
            validator: Validator::new(self.settings.validation.clone(), table.clone()),
            mapper: FieldMapper::new(table),
        };
        let progress = RecordProgress::new(
            document.len() as u64,
            self.settings.performance.show_progress,
        );

        let mut records = Vec::with_capacity(document.len());
        let mut excluded = 0usize;
        let mut fold = |outcome: RecordOutcome, collector: &mut ErrorCollector| {
            collector.extend(outcome.findings);
            match outcome.record {
                Some(record) => records.push(record),
                None => excluded += 1,
            }
        };

        let performance = &self.settings.performance;
        if performance.enable_parallel_processing {
            let batch_size = performance.effective_batch_size(document.avg_record_bytes());
            let workers = performance.max_workers.max(1);
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(workers)
                .build()
                .map_err(|e| PipelineError::stage("validate", e.to_string()))?;
            debug!(batch_size, workers, "Processing records in parallel");

            'waves: for wave in document.features.chunks(batch_size * workers) {
                let batches: Vec<Vec<RecordOutcome>> = pool.install(|| {
                    wave.par_chunks(batch_size)
                        .map(|batch| batch.iter().map(|raw| processor.process(raw)).collect())
                        .collect()
                });
                for outcome in batches.into_iter().flatten() {
                    fold(outcome, collector);
                    progress.inc(1);
                    if collector.should_abort() {
                        break 'waves;
                    }
                }
            }
        } else {
            for raw in &document.features {
                fold(processor.process(raw), collector);
                progress.inc(1);
                if collector.should_abort() {
                    break;
                }
            }
        }

        state.records_processed = records.len() + excluded;
        state.records_excluded = excluded;
        if let Err(e) = collector.check() {
            progress.finish_error(&format!("stopped after {} errors", collector.error_count()));
            state.records = records;
            return Err(e);
        }
        progress.finish_success(&format!("{} records valid", format_number(records.len() as u64)));

        info!(
            valid = records.len(),
            excluded,
            errors = collector.error_count(),
            warnings = collector.warning_count(),
            "Validation complete"
        );
        let output = StageOutput::success()
            .with_metadata("records_valid", serde_json::json!(records.len()))
            .with_metadata("records_excluded", serde_json::json!(excluded))
            .with_metadata("errors", serde_json::json!(collector.error_count()))
            .with_metadata("warnings", serde_json::json!(collector.warning_count()));
        state.records = records;
        Ok(output)
    }

    /// Order records and record the chunk layout
    fn run_split(&self, state: &mut RunState) -> PipelineResult<StageOutput> {
        let processing = &self.settings.processing;
        if processing.sort_by_address {
            sort_by_address(&mut state.records);
        }

        let splitter = ChunkSplitter::new(processing.records_per_file);
        let sizes: Vec<usize> = splitter.split(&state.records).iter().map(|c| c.len()).collect();
        debug!(chunks = sizes.len(), records_per_file = processing.records_per_file, "Split records");

        let mut output = StageOutput::success()
            .with_metadata("chunks", serde_json::json!(sizes.len()))
            .with_metadata("chunk_sizes", serde_json::json!(sizes));
        for field in &processing.group_by {
            let groups = group_by_field(&state.records, *field).len();
            output = output.with_metadata(format!("groups_by_{}", field.name()), serde_json::json!(groups));
        }
        Ok(output)
    }

    /// Generate artifacts chunk by chunk, merged in chunk order
    fn run_generate(&self, state: &mut RunState) -> PipelineResult<StageOutput> {
        let generator = ArtifactGenerator::new(&self.settings.llm_training)?;
        let chunks = ChunkSplitter::new(self.settings.processing.records_per_file).split(&state.records);

        let per_chunk: Vec<DerivedArtifacts> = if self.settings.performance.enable_parallel_processing {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.settings.performance.max_workers.max(1))
                .build()
                .map_err(|e| PipelineError::stage("generate", e.to_string()))?;
            pool.install(|| {
                chunks
                    .par_iter()
                    .map(|chunk| generator.generate_chunk(chunk.records))
                    .collect()
            })
        } else {
            chunks
                .iter()
                .map(|chunk| generator.generate_chunk(chunk.records))
                .collect()
        };

        let mut artifacts = DerivedArtifacts::default();
        for batch in per_chunk {
            artifacts.extend(batch);
        }
        artifacts.search_queries = generator.search_queries(&state.records);

        info!(
            stories = artifacts.stories.len(),
            qa_pairs = artifacts.qa_pairs.len(),
            rag_chunks = artifacts.rag_chunks.len(),
            search_queries = artifacts.search_queries.len(),
            "Generated artifacts"
        );
        let output = StageOutput::success()
            .with_metadata("stories", serde_json::json!(artifacts.stories.len()))
            .with_metadata("qa_pairs", serde_json::json!(artifacts.qa_pairs.len()))
            .with_metadata("rag_chunks", serde_json::json!(artifacts.rag_chunks.len()))
            .with_metadata("search_queries", serde_json::json!(artifacts.search_queries.len()));
        state.artifacts = artifacts;
        Ok(output)
    }

    /// Field analysis over raw entries and statistics over mapped records
    fn run_analyze(&self, state: &mut RunState) -> PipelineResult<StageOutput> {
        let analysis = &self.settings.analysis;
        let mut output = StageOutput::success();

        if analysis.field_analysis {
            if let Some(document) = &state.document {
                let table = FieldMappingTable::from_settings(
                    &self.settings.field_mapping,
                    &self.settings.validation,
                );
                let fields = FieldAnalysis::analyze(&document.features, &table);
                let unmapped = fields.unmapped_keys().len();
                if unmapped > 0 {
                    debug!(unmapped, "Input carries keys no mapping reads");
                }
                output = output
                    .with_metadata("fields", serde_json::json!(fields.fields.len()))
                    .with_metadata("unmapped_fields", serde_json::json!(unmapped));
                state.field_analysis = Some(fields);
            }
        }

        state.statistics = StatisticsEngine::new(analysis.statistics.clone()).compute(&state.records);
        if let Some(statistics) = &state.statistics {
            output = output.with_metadata(
                "statistics_records",
                serde_json::json!(statistics.overview.total_records),
            );
        }
        Ok(output)
    }

    /// Back up, then write chunks, attribute groups and artifacts
    fn run_write(
        &self,
        state: &mut RunState,
        collector: &mut ErrorCollector,
    ) -> PipelineResult<StageOutput> {
        let output = self.write_outputs(state).map_err(|e| {
            collector.record(ValidationFinding::run_level(
                FindingKind::ProcessingFailure,
                e.to_string(),
            ));
            PipelineError::from(e)
        })?;
        state.chunks_written = ChunkSplitter::new(self.settings.processing.records_per_file)
            .chunk_count(state.records.len());
        Ok(output)
    }

    fn write_outputs(&self, state: &RunState) -> Result<StageOutput, WriteError> {
        let mut output = StageOutput::success();

        if self.settings.backup.backs_up_before_processing() {
            let backups = BackupManager::from_settings(&self.settings.output, &self.settings.backup);
            let outcome = backups.run()?;
            if let Some(created) = outcome.created {
                output = output.with_metadata(
                    "backup",
                    serde_json::json!(created.display().to_string()),
                );
            }
            if !outcome.removed.is_empty() {
                debug!(removed = outcome.removed.len(), "Pruned old backups");
            }
        }

        let writer = self.writer();
        let processing = &self.settings.processing;
        writer.prepare(&processing.group_by)?;

        let chunks = ChunkSplitter::new(processing.records_per_file).split(&state.records);
        let mut files: Vec<PathBuf> = Vec::new();
        for chunk in &chunks {
            files.extend(writer.write_chunk(chunk)?);
        }
        for field in &processing.group_by {
            for group in group_by_field(&state.records, *field) {
                files.extend(writer.write_group(&group)?);
            }
        }
        files.extend(writer.write_artifacts(&state.artifacts)?);
        if !state.artifacts.stories.is_empty() {
            files.extend(writer.write_story_files(&state.artifacts.stories, processing.records_per_file)?);
            files.push(writer.write_search_index(&state.records, processing.records_per_file)?);
        }

        info!(
            chunks = chunks.len(),
            records = state.records.len(),
            files = files.len(),
            "Wrote outputs"
        );
        Ok(output
            .with_metadata("chunks_written", serde_json::json!(chunks.len()))
            .with_metadata("records_written", serde_json::json!(state.records.len()))
            .with_files(files))
    }

    /// Write the statistics, field and error reports
    fn run_report(
        &self,
        state: &RunState,
        collector: &ErrorCollector,
    ) -> PipelineResult<StageOutput> {
        let writer = self.writer();
        let mut output = StageOutput::success();

        if self.settings.analysis.generate_reports {
            if let Some(statistics) = &state.statistics {
                output = output
                    .with_file(writer.write_report(STATISTICS_REPORT_FILE, statistics)?)
                    .with_file(writer.write_text_report(
                        ANALYSIS_REPORT_FILE,
                        &render_text_report(statistics, REPORT_TITLE),
                    )?);
            }
        }
        if let Some(fields) = &state.field_analysis {
            output = output.with_file(writer.write_report(FIELD_ANALYSIS_FILE, fields)?);
        }
        if self.settings.error_handling.save_error_reports {
            output = output.with_file(
                writer.write_report(ERROR_REPORT_FILE, &collector.report(&self.summary.run_id))?,
            );
        }
        Ok(output)
    }

    /// Record the failure, persist what reports can still be written, and
    /// hand the error back
    fn finish_failed(
        &mut self,
        err: PipelineError,
        state: &RunState,
        collector: &ErrorCollector,
    ) -> PipelineError {
        self.summary.counts = counts(state, collector);
        if err.is_threshold() {
            self.summary.abort(err.to_string());
        } else {
            self.summary.fail(err.to_string());
        }
        warn!(
            status = %self.summary.status,
            elapsed_ms = self.summary.duration().num_milliseconds(),
            records_processed = self.summary.counts.records_processed,
            "Pipeline stopped"
        );
        if self.dry_run {
            return err;
        }

        let writer = self.writer();
        if self.settings.error_handling.save_error_reports {
            let report = collector.report(&self.summary.run_id);
            if let Err(e) = writer.write_report(ERROR_REPORT_FILE, &report) {
                warn!(error = %e, "Could not save error report");
            }
        }
        if self.settings.analysis.generate_reports {
            if let Err(e) = writer.write_report(RUN_SUMMARY_FILE, &self.summary) {
                warn!(error = %e, "Could not save run summary");
            }
        }
        err
    }

    /// Check if a stage should be skipped
    fn should_skip_stage(&self, stage: PipelineStage) -> Option<String> {
        let llm = &self.settings.llm_training;
        let analysis = &self.settings.analysis;
        match stage {
            PipelineStage::Generate
                if !(llm.qa_pairs.enabled
                    || llm.rag_chunks.enabled
                    || llm.property_stories.enabled
                    || llm.search_queries.enabled) =>
            {
                Some("No generators enabled".to_string())
            }
            PipelineStage::Analyze if !analysis.field_analysis && !analysis.statistics.enabled => {
                Some("Field analysis and statistics disabled".to_string())
            }
            PipelineStage::Report
                if !analysis.generate_reports
                    && !analysis.field_analysis
                    && !self.settings.error_handling.save_error_reports =>
            {
                Some("Reports disabled".to_string())
            }
            _ => None,
        }
    }

    fn writer(&self) -> OutputWriter {
        OutputWriter::new(&self.settings.output, &self.settings.output_formats)
    }
}

fn counts(state: &RunState, collector: &ErrorCollector) -> RunCounts {
    let records_read = state.document.as_ref().map_or(0, RawDocument::len);
    RunCounts {
        records_read,
        records_processed: state.records_processed,
        records_valid: state.records.len(),
        records_excluded: state.records_excluded,
        errors: collector.error_count(),
        warnings: collector.warning_count(),
        chunks_written: state.chunks_written,
        qa_pairs: state.artifacts.qa_pairs.len(),
        rag_chunks: state.artifacts.rag_chunks.len(),
        stories: state.artifacts.stories.len(),
        search_queries: state.artifacts.search_queries.len(),
    }
}

/// Report from a pipeline run
#[derive(Debug, Clone)]
pub struct PipelineReport {
    /// Run ID
    pub run_id: String,
    /// Final status
    pub status: PipelineStatus,
    pub dry_run: bool,
    /// Completed stages
    pub stages_completed: Vec<PipelineStage>,
    /// Total duration in milliseconds
    pub duration_ms: u64,
    pub counts: RunCounts,
    /// Stage outputs
    pub outputs: std::collections::HashMap<String, StageOutput>,
}

impl PipelineReport {
    /// Check if pipeline was successful
    pub fn is_success(&self) -> bool {
        self.status == PipelineStatus::Completed
    }

    /// Get formatted duration
    pub fn duration_formatted(&self) -> String {
        let secs = self.duration_ms / 1000;
        let mins = secs / 60;
        let remaining_secs = secs % 60;

        if mins > 0 {
            format!("{}m {}s", mins, remaining_secs)
        } else {
            format!("{}s", secs)
        }
    }

    /// Print summary to stderr
    pub fn print_summary(&self) {
        let c = &self.counts;
        eprintln!();
        eprintln!("Pipeline {} - {}", self.run_id, self.status);
        if self.dry_run {
            eprintln!("Dry run: no files were written");
        }
        eprintln!("Duration: {}", self.duration_formatted());
        eprintln!(
            "Records: {} read, {} processed, {} valid, {} excluded ({} errors, {} warnings)",
            format_number(c.records_read as u64),
            format_number(c.records_processed as u64),
            format_number(c.records_valid as u64),
            format_number(c.records_excluded as u64),
            c.errors,
            c.warnings
        );
        if !self.dry_run {
            eprintln!("Chunks written: {}", c.chunks_written);
            eprintln!(
                "Artifacts: {} stories, {} QA pairs, {} RAG chunks, {} search queries",
                c.stories, c.qa_pairs, c.rag_chunks, c.search_queries
            );
        }
        eprintln!("Stages completed: {}", self.stages_completed.len());

        for stage in PipelineStage::all() {
            if let Some(output) = self.outputs.get(stage.name()) {
                eprintln!(
                    "  {}. {:<9} {:<38} {} ({}ms)",
                    stage.index(),
                    stage.name(),
                    stage.description(),
                    output.status_label(),
                    output.duration_ms
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;

    #[test]
    fn test_invalid_settings_fail_fast() {
        let mut settings = Settings::default();
        settings.llm_training.rag_chunks.chunk_size = 100;
        settings.llm_training.rag_chunks.overlap_size = 100;

        match PipelineExecutor::new(settings) {
            Err(PipelineError::Config(ConfigError::InvalidChunkConfig { .. })) => {}
            Err(other) => panic!("expected InvalidChunkConfig, got {other:?}"),
            Ok(_) => panic!("expected InvalidChunkConfig"),
        }
    }

    #[test]
    fn test_executor_creation() {
        let executor = PipelineExecutor::new(Settings::default()).unwrap().with_dry_run(true);
        assert_eq!(executor.summary().status, PipelineStatus::Running);
        assert!(executor.summary().dry_run);
        assert_eq!(executor.summary().config_hash, Settings::default().fingerprint());
    }

    #[test]
    fn test_skips_generate_without_generators() {
        let mut settings = Settings::default();
        settings.llm_training.qa_pairs.enabled = false;
        settings.llm_training.rag_chunks.enabled = false;
        settings.llm_training.property_stories.enabled = false;
        settings.llm_training.search_queries.enabled = false;
        let executor = PipelineExecutor::new(settings).unwrap();
        assert!(executor.should_skip_stage(PipelineStage::Generate).is_some());
        assert!(executor.should_skip_stage(PipelineStage::Write).is_none());
    }

    #[test]
    fn test_stop_after_limits_planned_stages() {
        let executor = PipelineExecutor::new(Settings::default())
            .unwrap()
            .with_stop_after(Some(PipelineStage::Split));
        assert_eq!(
            executor.planned_stages(),
            vec![PipelineStage::Read, PipelineStage::Validate, PipelineStage::Split]
        );

        let executor = PipelineExecutor::new(Settings::default())
            .unwrap()
            .with_dry_run(true)
            .with_stop_after(Some(PipelineStage::Report));
        assert_eq!(executor.planned_stages(), PipelineStage::dry_run());

        let executor = PipelineExecutor::new(Settings::default()).unwrap();
        assert_eq!(executor.planned_stages(), PipelineStage::all());
    }

    #[test]
    fn test_pipeline_report() {
        let report = PipelineReport {
            run_id: "test-123".to_string(),
            status: PipelineStatus::Completed,
            dry_run: false,
            stages_completed: vec![PipelineStage::Read, PipelineStage::Validate],
            duration_ms: 65000,
            counts: RunCounts::default(),
            outputs: std::collections::HashMap::new(),
        };

        assert!(report.is_success());
        assert_eq!(report.duration_formatted(), "1m 5s");
    }
}
