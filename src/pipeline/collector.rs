//! Error accumulation with a stop threshold
//!
//! Every finding of a run passes through one [`ErrorCollector`]. Only
//! error-severity findings count toward the threshold; warnings and info
//! are kept for the report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use super::error::{PipelineError, PipelineResult};
use crate::config::ErrorHandlingSettings;
use crate::validation::{Severity, ValidationFinding};

/// Findings retained in memory for the report. Counting continues past it.
pub const MAX_RETAINED_FINDINGS: usize = 10_000;

/// Append-only accumulator of findings for one run
#[derive(Debug, Clone)]
pub struct ErrorCollector {
    limit: usize,
    log_errors: bool,
    findings: Vec<ValidationFinding>,
    errors: usize,
    warnings: usize,
    infos: usize,
    truncated: bool,
}

impl ErrorCollector {
    pub fn new(settings: &ErrorHandlingSettings) -> Self {
        Self::with_limit(settings.effective_limit(), settings.log_errors)
    }

    pub fn with_limit(limit: usize, log_errors: bool) -> Self {
        Self {
            limit: limit.max(1),
            log_errors,
            findings: Vec::new(),
            errors: 0,
            warnings: 0,
            infos: 0,
            truncated: false,
        }
    }

    /// Record one finding
    pub fn record(&mut self, finding: ValidationFinding) {
        match finding.severity {
            Severity::Error => self.errors += 1,
            Severity::Warning => self.warnings += 1,
            Severity::Info => self.infos += 1,
        }
        if self.log_errors {
            log_finding(&finding);
        }
        if self.findings.len() < MAX_RETAINED_FINDINGS {
            self.findings.push(finding);
        } else {
            self.truncated = true;
        }
    }

    /// Merge a batch of findings in order
    pub fn extend(&mut self, findings: impl IntoIterator<Item = ValidationFinding>) {
        for finding in findings {
            self.record(finding);
        }
    }

    pub fn error_count(&self) -> usize {
        self.errors
    }

    pub fn warning_count(&self) -> usize {
        self.warnings
    }

    pub fn info_count(&self) -> usize {
        self.infos
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn findings(&self) -> &[ValidationFinding] {
        &self.findings
    }

    /// Whether the threshold has been reached
    pub fn should_abort(&self) -> bool {
        self.errors >= self.limit
    }

    /// Fail with `TooManyErrors` once the threshold is reached
    pub fn check(&self) -> PipelineResult<()> {
        if self.should_abort() {
            return Err(PipelineError::TooManyErrors {
                count: self.errors,
                limit: self.limit,
            });
        }
        Ok(())
    }

    /// Snapshot for `error_report.json`
    pub fn report(&self, run_id: &str) -> ErrorReport {
        ErrorReport {
            run_id: run_id.to_string(),
            generated_at: Utc::now(),
            limit: self.limit,
            error_count: self.errors,
            warning_count: self.warnings,
            info_count: self.infos,
            aborted: self.should_abort(),
            findings_truncated: self.truncated,
            findings: self.findings.clone(),
        }
    }
}

fn log_finding(finding: &ValidationFinding) {
    let record = finding.record_id.as_deref().unwrap_or("-");
    let field = finding.field.as_deref().unwrap_or("-");
    match finding.severity {
        Severity::Error => error!(record, field, kind = ?finding.kind, "{}", finding.message),
        Severity::Warning => warn!(record, field, kind = ?finding.kind, "{}", finding.message),
        Severity::Info => debug!(record, field, kind = ?finding.kind, "{}", finding.message),
    }
}

/// Persisted summary of all findings of a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorReport {
    pub run_id: String,
    pub generated_at: DateTime<Utc>,
    pub limit: usize,
    pub error_count: usize,
    pub warning_count: usize,
    pub info_count: usize,
    /// Threshold reached
    pub aborted: bool,
    /// More findings occurred than were retained
    pub findings_truncated: bool,
    pub findings: Vec<ValidationFinding>,
}
