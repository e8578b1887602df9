//! Pipeline orchestration
//!
//! Runs the property records through every stage in order:
//!
//! 1. **Read**: Load and decode the input document
//! 2. **Validate**: Validate each entry and map it onto the canonical fields
//! 3. **Split**: Order records and partition them into chunks
//! 4. **Generate**: Build stories, QA pairs, RAG chunks and search queries
//! 5. **Analyze**: Field analysis and statistics
//! 6. **Write**: Back up previous outputs, then write chunks and artifacts
//! 7. **Report**: Write statistics, field and error reports
//!
//! # Example
//!
//! ```rust,ignore
//! use parcel_pipeline::config::Settings;
//! use parcel_pipeline::pipeline::PipelineExecutor;
//!
//! let settings = Settings::load("config.yaml")?;
//! let mut executor = PipelineExecutor::new(settings)?;
//! let report = executor.run()?;
//!
//! println!("Pipeline completed in {}", report.duration_formatted());
//! ```
//!
//! # Errors
//!
//! Record-level problems become findings in the [`ErrorCollector`] and the
//! record is excluded. A run aborts with [`PipelineError::TooManyErrors`] once
//! the error count reaches the configured limit; `error_report.json` and
//! `run_summary.json` are still written when enabled.
//!
//! # Dry Run
//!
//! `with_dry_run(true)` stops after validation and writes nothing:
//!
//! ```rust,ignore
//! let report = PipelineExecutor::new(settings)?.with_dry_run(true).run()?;
//! assert_eq!(report.counts.chunks_written, 0);
//! ```

mod collector;
mod error;
mod executor;
mod stage;
mod summary;

pub use collector::{ErrorCollector, ErrorReport, MAX_RETAINED_FINDINGS};
pub use error::{PipelineError, PipelineResult};
pub use executor::{
    ANALYSIS_REPORT_FILE, ERROR_REPORT_FILE, FIELD_ANALYSIS_FILE, PipelineExecutor,
    PipelineReport, RUN_SUMMARY_FILE, STATISTICS_REPORT_FILE,
};
pub use stage::{PipelineStage, StageOutput};
pub use summary::{PipelineStatus, RunCounts, RunSummary};
