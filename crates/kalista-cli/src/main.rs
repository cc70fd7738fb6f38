//! # kalista CLI entry point
//!
//! Parses command-line arguments, initializes logging, and dispatches to
//! subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use kalista_cli::check::{run_check, CheckArgs};
use kalista_cli::run::{run_run, RunArgs};
use kalista_cli::validate_body::{run_validate_body, ValidateBodyArgs};
use kalista_cli::EXIT_OPERATIONAL_ERROR;

/// Kalista: contract testing for HTTP/JSON services.
///
/// Each contract is a YAML file naming an endpoint, a method, an expected
/// status, and JSON Schemas for the request and response bodies.
#[derive(Parser, Debug)]
#[command(name = "kalista", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a YAML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Execute every contract under a directory against its live endpoint.
    Run(RunArgs),

    /// Parse and compile every contract under a directory without network I/O.
    Check(CheckArgs),

    /// Validate a JSON body file against a contract's request or response schema.
    ValidateBody(ValidateBodyArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    // Reports go to stdout; logs stay on stderr.
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    tracing::debug!("kalista v{} starting", env!("CARGO_PKG_VERSION"));

    let config = cli.config.as_deref();
    let result = match cli.command {
        Commands::Run(args) => run_run(&args, config, cli.verbose),
        Commands::Check(args) => run_check(&args, config, cli.verbose),
        Commands::ValidateBody(args) => run_validate_body(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(EXIT_OPERATIONAL_ERROR)
        }
    }
}
