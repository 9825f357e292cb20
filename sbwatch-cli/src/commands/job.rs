//! Shared job execution
//!
//! Launches one job, wires cancellation to the timeout and Ctrl-C, and
//! reports the outcome.

use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use sbwatch_core::{JobError, JobName};
use sbwatch_runner::{Config, JobOrchestrator};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::display::TerminalDisplay;

/// Options shared by every job-submitting command
#[derive(Args, Debug, Default)]
pub struct JobArgs {
    /// Template variable, repeatable
    #[arg(long = "var", value_name = "KEY=VALUE", value_parser = parse_var)]
    pub vars: Vec<(String, String)>,

    /// Stop following the output after this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

fn parse_var(raw: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    if key.is_empty() {
        return Err(format!("empty key in '{raw}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Reads `path`, or stdin when it is absent or "-"
pub async fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) if path != Path::new("-") => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display())),
        _ => {
            let mut input = String::new();
            tokio::io::stdin()
                .read_to_string(&mut input)
                .await
                .context("Failed to read stdin")?;
            Ok(input)
        }
    }
}

/// Submits `template` as job `name` and follows it to the end
pub async fn execute_job(
    name: JobName,
    template: &str,
    args: JobArgs,
    config: Config,
) -> Result<()> {
    let vars: HashMap<String, String> = args.vars.into_iter().collect();
    let orchestrator = Arc::new(JobOrchestrator::from_config(
        config,
        Arc::new(TerminalDisplay::stdout()),
    ));

    let handle = orchestrator
        .launch(name.clone(), template, &vars)
        .await
        .with_context(|| format!("Failed to launch job {}", name))?;

    spawn_cancel_triggers(handle.cancellation_token(), args.timeout.map(Duration::from_secs));

    let result = handle.wait().await;
    // the display leaves the cursor after "Done!"
    println!();

    match result {
        Ok(outcome) => {
            eprintln!(
                "{}",
                format!(
                    "Job {} ({}) finished, {} line(s) of output",
                    outcome.name, outcome.job_id, outcome.lines
                )
                .green()
            );
            Ok(())
        }
        Err(JobError::Cancelled) => {
            eprintln!("{}", format!("Stopped following job {}", name).yellow());
            anyhow::bail!("Job {} cancelled before completion", name)
        }
        Err(e) => {
            eprintln!("{}", format!("Job {} failed", name).red());
            Err(e).with_context(|| format!("Job {} did not complete", name))
        }
    }
}

/// Cancels `token` on Ctrl-C or once `timeout` elapses
fn spawn_cancel_triggers(token: CancellationToken, timeout: Option<Duration>) {
    if let Some(timeout) = timeout {
        let token = token.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(timeout) => {
                    warn!("Timed out after {:?}", timeout);
                    token.cancel();
                }
            }
        });
    }

    tokio::spawn(async move {
        tokio::select! {
            _ = token.cancelled() => {}
            signal = tokio::signal::ctrl_c() => {
                if signal.is_ok() {
                    info!("Interrupted, cancelling");
                    token.cancel();
                }
            }
        }
    });
}
