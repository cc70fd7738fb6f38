//! # Check Subcommand
//!
//! Parses every contract and compiles its schemas without sending any
//! request. Useful as a pre-merge lint for contract repositories.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use kalista_contract::load_dir;
use kalista_runner::{check_source, RunnerConfig};

use crate::options::{resolve_config, RunnerOptions, SourceOptions};
use crate::report::{write_json, write_text, OutputFormat};
use crate::run::exit_code;

/// Arguments for the `kalista check` subcommand.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Directory (or single file) containing contracts.
    #[arg(value_name = "DIR")]
    pub dir: PathBuf,

    #[command(flatten)]
    pub source: SourceOptions,

    /// Report format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Execute the check subcommand.
pub fn run_check(args: &CheckArgs, config_path: Option<&Path>, verbose: u8) -> Result<u8> {
    let options = RunnerOptions {
        source: args.source.clone(),
        ..RunnerOptions::default()
    };
    let config = resolve_config(config_path, &options)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    execute_check(&args.dir, &config, args.format, verbose > 0, &mut out)
}

/// Load `dir`, parse every contract offline, and write the report to
/// `out`. Returns the process exit code.
pub fn execute_check<W: Write>(
    dir: &Path,
    config: &RunnerConfig,
    format: OutputFormat,
    verbose: bool,
    out: &mut W,
) -> Result<u8> {
    let source = load_dir(dir, &config.extensions)
        .with_context(|| format!("failed to load contracts from {}", dir.display()))?;
    let report = check_source(&source);
    let written = match format {
        OutputFormat::Text => write_text(out, &report, verbose),
        OutputFormat::Json => write_json(out, &report),
    };
    written.context("failed to write report")?;
    Ok(exit_code(&report))
}
