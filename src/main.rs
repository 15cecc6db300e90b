//! CLI entry point for the repo-cloner tool.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use repo_cloner::{RunReport, RunStatus, run};
use tracing::{error, info};

mod app_config;
mod cli;
mod config_runtime;

use cli::Args;

/// Process exit outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProcessExit {
    /// Every transfer succeeded or was skipped.
    Success,
    /// The run finished with some failed transfers.
    Partial,
    /// The run stopped early or never started.
    Failure,
}

impl From<ProcessExit> for ExitCode {
    fn from(exit: ProcessExit) -> Self {
        match exit {
            ProcessExit::Success => ExitCode::SUCCESS,
            ProcessExit::Failure => ExitCode::from(1),
            ProcessExit::Partial => ExitCode::from(2),
        }
    }
}

impl From<RunStatus> for ProcessExit {
    fn from(status: RunStatus) -> Self {
        match status {
            RunStatus::Complete => Self::Success,
            RunStatus::Partial => Self::Partial,
            RunStatus::Aborted => Self::Failure,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = config_runtime::resolve_default_log_level(&args);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run_cloner(&args).await {
        Ok(exit) => exit.into(),
        Err(e) => {
            error!("{e:#}");
            ProcessExit::Failure.into()
        }
    }
}

async fn run_cloner(args: &Args) -> Result<ProcessExit> {
    let file_config = app_config::load_file_config(args.config.as_deref())?;
    let config = config_runtime::resolve_run_config(args, file_config.as_ref())?;
    info!(
        actions = %config.actions,
        mirror = %config.mirror_path.display(),
        "repo-cloner starting"
    );

    let report = run(&config).await;
    print_summary(&report, args.json)?;
    Ok(report.status().into())
}

/// Writes the final counts to stdout.
fn print_summary(report: &RunReport, json: bool) -> Result<()> {
    if json {
        let summaries: Vec<_> = report.summaries().collect();
        let rendered =
            serde_json::to_string_pretty(&summaries).context("Failed to render summary")?;
        println!("{rendered}");
    } else {
        for summary in report.summaries() {
            println!("{summary}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_mapping() {
        assert_eq!(ProcessExit::from(RunStatus::Complete), ProcessExit::Success);
        assert_eq!(ProcessExit::from(RunStatus::Partial), ProcessExit::Partial);
        assert_eq!(ProcessExit::from(RunStatus::Aborted), ProcessExit::Failure);
    }
}
