//! Command-line driver for the `parcel-pipeline` binary

pub mod commands;
pub mod error;

pub use commands::{CheckArgs, RunArgs, handle_check, handle_run, load_settings};
pub use error::CliError;
