//! `cell` command
//!
//! A cell carries the job name on its first line and the script template
//! on the remaining lines.

use anyhow::Result;
use sbwatch_core::JobName;
use sbwatch_runner::Config;
use std::path::PathBuf;

use super::job::{JobArgs, execute_job, read_input};

pub async fn handle_cell_command(
    file: Option<PathBuf>,
    args: JobArgs,
    config: Config,
) -> Result<()> {
    let cell = read_input(file.as_deref()).await?;
    let (name, body) = split_cell(&cell)?;
    execute_job(name, body, args, config).await
}

/// Splits a cell into its job name and template body
fn split_cell(cell: &str) -> sbwatch_core::Result<(JobName, &str)> {
    let (line, body) = cell.split_once('\n').unwrap_or((cell, ""));
    Ok((JobName::from_line(line)?, body))
}
