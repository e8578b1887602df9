//! Progress reporting for record processing
//!
//! Thin wrapper over `indicatif`. When progress display is disabled the bar is
//! hidden, so callers never branch on it.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Progress bar over the records of one run
pub struct RecordProgress {
    bar: ProgressBar,
}

impl RecordProgress {
    /// Create a progress reporter
    ///
    /// # Arguments
    /// * `total_records` - Number of records to process (0 for unknown)
    /// * `visible` - Whether to draw anything at all
    pub fn new(total_records: u64, visible: bool) -> Self {
        if !visible {
            return Self {
                bar: ProgressBar::hidden(),
            };
        }

        let bar = if total_records > 0 {
            let bar = ProgressBar::new(total_records);
            bar.set_style(
                ProgressStyle::with_template(
                    "{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} records ({eta}) {msg}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓▒░  "),
            );
            bar
        } else {
            let bar = ProgressBar::new_spinner();
            bar.set_style(
                ProgressStyle::with_template("{spinner:.green} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            bar
        };
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }

    /// Advance by `n` records
    pub fn inc(&self, n: u64) {
        self.bar.inc(n);
    }

    /// Set a status message
    pub fn set_message(&self, msg: &str) {
        self.bar.set_message(msg.to_string());
    }

    /// Finish with success message
    pub fn finish_success(&self, msg: &str) {
        self.bar.finish_with_message(format!("✓ {}", msg));
    }

    /// Finish with error message
    pub fn finish_error(&self, msg: &str) {
        self.bar.abandon_with_message(format!("✗ {}", msg));
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }
}

/// Format a number with thousands separators
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

/// Format bytes as human-readable string
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
