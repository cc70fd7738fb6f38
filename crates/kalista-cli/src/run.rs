//! # Run Subcommand
//!
//! Loads every contract under a directory, executes them against their
//! endpoints, and reports one line per contract.
//!
//! Returns exit code: 0 when all passed, 1 when any failed, 2 on
//! operational error (through `Err`).

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use kalista_contract::load_dir;
use kalista_runner::{RunReport, RunnerConfig, TestRunner};

use crate::options::{resolve_config, RunnerOptions};
use crate::report::{write_json, write_outcome, write_summary, OutputFormat};
use crate::{EXIT_FAILURES, EXIT_SUCCESS};

/// Arguments for the `kalista run` subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Directory (or single file) containing contracts.
    #[arg(value_name = "DIR")]
    pub dir: PathBuf,

    #[command(flatten)]
    pub options: RunnerOptions,

    /// Report format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Execute the run subcommand on a fresh runtime.
pub fn run_run(args: &RunArgs, config_path: Option<&Path>, verbose: u8) -> Result<u8> {
    let config = resolve_config(config_path, &args.options)?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    runtime.block_on(execute_run(&args.dir, &config, args.format, verbose > 0, &mut out))
}

/// Load, execute, and report. Text output streams as contracts complete.
pub async fn execute_run<W: Write>(
    dir: &Path,
    config: &RunnerConfig,
    format: OutputFormat,
    verbose: bool,
    out: &mut W,
) -> Result<u8> {
    let source = load_dir(dir, &config.extensions)
        .with_context(|| format!("failed to load contracts from {}", dir.display()))?;
    if source.is_empty() {
        tracing::warn!(dir = %dir.display(), filter = %config.extensions, "no contract files found");
    }
    let runner = TestRunner::new(config).context("failed to initialize test runner")?;

    let report = match format {
        OutputFormat::Text => {
            let mut write_error: Option<io::Error> = None;
            let report = runner
                .run_with(Arc::new(source), |outcome| {
                    if write_error.is_none() {
                        if let Err(e) = write_outcome(out, outcome, verbose) {
                            write_error = Some(e);
                        }
                    }
                })
                .await;
            if let Some(e) = write_error {
                return Err(e).context("failed to write report");
            }
            write_summary(out, &report).context("failed to write report")?;
            report
        }
        OutputFormat::Json => {
            let mut report = runner.run(Arc::new(source)).await;
            report.sort_by_identifier();
            write_json(out, &report).context("failed to write report")?;
            report
        }
    };

    Ok(exit_code(&report))
}

pub(crate) fn exit_code(report: &RunReport) -> u8 {
    if report.all_passed() {
        EXIT_SUCCESS
    } else {
        EXIT_FAILURES
    }
}
