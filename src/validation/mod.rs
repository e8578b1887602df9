//! Record validation
//!
//! The validator annotates records with [`ValidationFinding`]s instead of
//! failing fast. Whether a run continues is decided by the error collector
//! in the pipeline, never here.

mod finding;
mod validator;

pub use finding::{FindingKind, Severity, ValidationFinding};
pub use validator::{ValidatedFeature, ValidationOutcome, Validator};
