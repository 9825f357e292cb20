//! Commands module
//!
//! Defines the CLI commands and the shared job runner they feed into.

mod cell;
mod job;
mod run;

pub use job::JobArgs;

use anyhow::Result;
use clap::Subcommand;
use sbwatch_runner::Config;
use std::path::PathBuf;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Submit a cell: the first line names the job, the rest is the script template
    Cell {
        /// Cell file; read from stdin when omitted or "-"
        file: Option<PathBuf>,

        #[command(flatten)]
        job: JobArgs,
    },
    /// Submit a named job with a script template
    Run {
        /// Job name, without extension
        name: String,

        /// Template file; read from stdin when omitted or "-"
        #[arg(short, long)]
        template: Option<PathBuf>,

        #[command(flatten)]
        job: JobArgs,
    },
}

/// Handle a CLI command
///
/// # Arguments
/// * `command` - The command to execute
/// * `config` - Runner configuration built from environment and flags
pub async fn handle_command(command: Commands, config: Config) -> Result<()> {
    match command {
        Commands::Cell { file, job } => cell::handle_cell_command(file, job, config).await,
        Commands::Run {
            name,
            template,
            job,
        } => run::handle_run_command(name, template, job, config).await,
    }
}
