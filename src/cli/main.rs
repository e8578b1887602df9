//! `parcel-pipeline` command-line entry point

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use parcel_pipeline::cli::{CheckArgs, CliError, RunArgs, handle_check, handle_run};
use parcel_pipeline::pipeline::PipelineStage;

#[derive(Parser)]
#[command(name = "parcel-pipeline")]
#[command(version)]
#[command(about = "Split property records and derive LLM training data, statistics and reports")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline
    Run {
        /// Settings document
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,
        /// Input document, overrides input.file_path
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Root for all output directories
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Records per chunk file
        #[arg(long)]
        records_per_file: Option<usize>,
        /// Process records on a worker pool
        #[arg(long, default_value_t = false)]
        parallel: bool,
        /// Skip the pre-write backup
        #[arg(long, default_value_t = false)]
        no_backup: bool,
        /// Read, validate and map without writing anything
        #[arg(long, default_value_t = false)]
        dry_run: bool,
        /// Last stage to run, by name or number (read, validate, split,
        /// generate, analyze, write, report)
        #[arg(long, value_name = "STAGE")]
        stop_after: Option<PipelineStage>,
    },
    /// Validate the settings and dry-run the input
    Check {
        /// Settings document
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,
        /// Input document, overrides input.file_path
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
}

fn dispatch(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Run {
            config,
            input,
            output,
            records_per_file,
            parallel,
            no_backup,
            dry_run,
            stop_after,
        } => {
            handle_run(&RunArgs {
                config,
                input,
                output,
                records_per_file,
                parallel,
                no_backup,
                dry_run,
                stop_after,
            })?;
        }
        Commands::Check { config, input } => {
            handle_check(&CheckArgs { config, input })?;
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    match dispatch(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => match err.downcast_ref::<CliError>() {
            Some(cli_err) => {
                eprintln!("Error: {}", cli_err.user_message());
                ExitCode::from(cli_err.exit_code())
            }
            None => {
                eprintln!("Error: {err:#}");
                ExitCode::FAILURE
            }
        },
    }
}
