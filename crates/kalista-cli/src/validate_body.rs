//! # Validate-Body Subcommand
//!
//! Checks a JSON document captured elsewhere against one contract's
//! request or response schema, without any network I/O.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use kalista_contract::{parse_contract, SchemaRole};
use kalista_runner::validate_body;

use crate::{EXIT_FAILURES, EXIT_SUCCESS};

/// Schema role selectable from the command line.
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RoleArg {
    #[default]
    Request,
    Response,
}

impl From<RoleArg> for SchemaRole {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Request => SchemaRole::Request,
            RoleArg::Response => SchemaRole::Response,
        }
    }
}

/// Arguments for the `kalista validate-body` subcommand.
#[derive(Args, Debug)]
pub struct ValidateBodyArgs {
    /// Contract file.
    #[arg(value_name = "CONTRACT")]
    pub contract: PathBuf,

    /// JSON file holding the body to check.
    #[arg(value_name = "BODY")]
    pub body: PathBuf,

    /// Which of the contract's schemas to validate against.
    #[arg(long, value_enum, default_value_t = RoleArg::Request)]
    pub role: RoleArg,
}

pub fn run_validate_body(args: &ValidateBodyArgs) -> Result<u8> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    execute_validate_body(args, &mut out)
}

/// Returns 0 when the body conforms and 1 when it does not. A contract
/// that cannot be parsed, a body that is not JSON, or a role without a
/// schema is an operational error.
pub fn execute_validate_body<W: Write>(args: &ValidateBodyArgs, out: &mut W) -> Result<u8> {
    let identifier = args.contract.display().to_string();
    let bytes = fs::read(&args.contract).with_context(|| format!("failed to read contract {identifier}"))?;
    let definition = parse_contract(&identifier, &bytes).context("failed to parse contract")?;

    let text = fs::read_to_string(&args.body)
        .with_context(|| format!("failed to read body {}", args.body.display()))?;
    let value: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("body {} is not valid JSON", args.body.display()))?;

    let role = SchemaRole::from(args.role);
    match validate_body(&definition, role, &value) {
        Ok(()) => {
            writeln!(out, "{}: body conforms to the {role} schema", definition.display_name())?;
            Ok(EXIT_SUCCESS)
        }
        Err(e) if e.violations().is_some() => {
            writeln!(out, "{}: {e}", definition.display_name())?;
            Ok(EXIT_FAILURES)
        }
        Err(e) => Err(e).context("cannot validate body"),
    }
}
