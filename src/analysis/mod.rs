//! Statistics and reporting over the mapped record set
//!
//! [`StatisticsEngine`] computes the per-category aggregates,
//! [`FieldAnalysis`] profiles the raw attribute keys, and
//! [`render_text_report`] turns the aggregates into the human-readable
//! report. Writing the results to disk is left to the output module.

mod fields;
mod report;
pub mod statistics;

pub use fields::{FieldAnalysis, FieldProfile};
pub use report::render_text_report;
pub use statistics::{
    GroupStatistics, GroupValue, NumericSummary, OwnerType, OwnershipStatistics, Overview,
    RankedCount, RankedValue, StatisticsEngine, StatisticsReport, ValueBucket, ValueStatistics,
    YearBuiltStatistics,
};
