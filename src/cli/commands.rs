//! Handlers for the `run` and `check` commands

use std::path::PathBuf;

use tracing::info;

use super::error::CliError;
use crate::analysis::FieldAnalysis;
use crate::config::Settings;
use crate::ingest::{DatasetReader, format_bytes, format_number};
use crate::logging::init_logging;
use crate::mapping::FieldMappingTable;
use crate::pipeline::{PipelineExecutor, PipelineReport, PipelineStage};

/// Arguments for the `run` command
#[derive(Debug, Clone, Default)]
pub struct RunArgs {
    /// Settings document
    pub config: PathBuf,
    /// Overrides `input.file_path`
    pub input: Option<PathBuf>,
    /// Places every output directory under this root
    pub output: Option<PathBuf>,
    /// Overrides `processing.records_per_file`
    pub records_per_file: Option<usize>,
    /// Enables parallel processing
    pub parallel: bool,
    /// Disables backups for this run
    pub no_backup: bool,
    /// Read, validate and map without writing
    pub dry_run: bool,
    /// Last stage to run
    pub stop_after: Option<PipelineStage>,
}

/// Arguments for the `check` command
#[derive(Debug, Clone, Default)]
pub struct CheckArgs {
    pub config: PathBuf,
    pub input: Option<PathBuf>,
}

/// Load the settings document and apply command-line overrides
pub fn load_settings(args: &RunArgs) -> Result<Settings, CliError> {
    let mut settings = Settings::load(&args.config)?;
    if let Some(input) = &args.input {
        settings = settings.with_input(input);
    }
    if let Some(root) = &args.output {
        settings = settings.with_output_root(root);
    }
    if let Some(n) = args.records_per_file {
        if n == 0 {
            return Err(CliError::InvalidArgument(
                "--records-per-file must be greater than zero".to_string(),
            ));
        }
        settings = settings.with_records_per_file(n);
    }
    if args.parallel {
        settings = settings.with_parallel(true);
    }
    if args.no_backup {
        settings = settings.with_backups(false);
    }
    settings.validate()?;
    Ok(settings)
}

/// Handle the `run` command
pub fn handle_run(args: &RunArgs) -> Result<PipelineReport, CliError> {
    let settings = load_settings(args)?;
    let log_path = if args.dry_run {
        None
    } else {
        Some(init_logging(&settings).map_err(CliError::Logging)?)
    };

    let mut executor = PipelineExecutor::new(settings)?
        .with_dry_run(args.dry_run)
        .with_stop_after(args.stop_after);
    eprintln!("Starting pipeline run: {}", executor.summary().run_id);
    if let Some(path) = &log_path {
        info!(log = %path.display(), "Logging to file");
    }

    let report = executor.run()?;
    report.print_summary();
    if report.is_success() {
        eprintln!();
        eprintln!("Pipeline completed successfully!");
    }
    Ok(report)
}

/// Handle the `check` command: validate settings, then dry-run the input
pub fn handle_check(args: &CheckArgs) -> Result<PipelineReport, CliError> {
    let run_args = RunArgs {
        config: args.config.clone(),
        input: args.input.clone(),
        ..RunArgs::default()
    };
    let settings = load_settings(&run_args)?;

    eprintln!("Configuration OK: {}", args.config.display());
    eprintln!("  Input:            {}", settings.input.file_path.display());
    eprintln!("  Records per file: {}", settings.processing.records_per_file);
    eprintln!("  Output:           {}", settings.output.base_directory.display());

    let document = DatasetReader::from_settings(&settings.input)
        .read(&settings.input.file_path)
        .map_err(crate::pipeline::PipelineError::from)?;
    eprintln!(
        "  Records:          {} ({})",
        format_number(document.len() as u64),
        format_bytes(document.size_bytes)
    );
    let table = FieldMappingTable::from_settings(&settings.field_mapping, &settings.validation);
    let fields = FieldAnalysis::analyze(&document.features, &table);
    let unmapped = fields.unmapped_keys();
    if !unmapped.is_empty() {
        eprintln!("  Unmapped keys:    {}", unmapped.join(", "));
    }

    let report = PipelineExecutor::new(settings)?.with_dry_run(true).run()?;
    report.print_summary();
    Ok(report)
}
