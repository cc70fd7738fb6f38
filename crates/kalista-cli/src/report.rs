//! # Reporter
//!
//! Renders outcomes for humans (one line per contract plus a summary) or
//! for machines (a JSON array).

use std::io::{self, Write};

use clap::ValueEnum;
use kalista_runner::{ErrorKind, Outcome, RunReport, Verdict};
use serde::Serialize;

/// Output format for `run` and `check`.
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// One line per contract and a summary.
    #[default]
    Text,
    /// A JSON array with one object per contract.
    Json,
}

/// The report line for one outcome, without a trailing newline. A
/// contract without a `contractId` is named by its path.
pub fn outcome_line(outcome: &Outcome) -> String {
    let mark = if outcome.is_success() { '✓' } else { '✗' };
    format!(
        "\t{mark}\t ContractId: {}, ContractPath: {}",
        outcome.display_name(),
        outcome.identifier
    )
}

/// Write one outcome; with `verbose`, failure details follow indented.
pub fn write_outcome<W: Write>(out: &mut W, outcome: &Outcome, verbose: bool) -> io::Result<()> {
    writeln!(out, "{}", outcome_line(outcome))?;
    if verbose {
        if let Some(detail) = outcome.detail() {
            for line in detail.lines() {
                writeln!(out, "\t\t{line}")?;
            }
        }
    }
    Ok(())
}

/// The `Contracts: passed/total passed` line.
pub fn write_summary<W: Write>(out: &mut W, report: &RunReport) -> io::Result<()> {
    writeln!(out, "Contracts: {}/{} passed", report.passed(), report.total())
}

/// Every outcome followed by the summary.
pub fn write_text<W: Write>(out: &mut W, report: &RunReport, verbose: bool) -> io::Result<()> {
    for outcome in report.outcomes() {
        write_outcome(out, outcome, verbose)?;
    }
    write_summary(out, report)
}

/// One entry of the JSON report.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportEntry<'a> {
    pub path: &'a str,
    pub contract_id: Option<&'a str>,
    pub status: &'static str,
    pub kind: Option<ErrorKind>,
    pub detail: Option<String>,
}

impl<'a> From<&'a Outcome> for ReportEntry<'a> {
    fn from(outcome: &'a Outcome) -> Self {
        let status = match outcome.verdict {
            Verdict::Success => "success",
            Verdict::Failure(_) => "failure",
            Verdict::Error(_) => "error",
        };
        Self {
            path: &outcome.identifier,
            contract_id: outcome.contract_id.as_deref(),
            status,
            kind: outcome.error_kind(),
            detail: outcome.detail(),
        }
    }
}

/// Every outcome as a pretty-printed JSON array of [`ReportEntry`].
pub fn write_json<W: Write>(out: &mut W, report: &RunReport) -> io::Result<()> {
    let entries: Vec<ReportEntry<'_>> = report.outcomes().iter().map(ReportEntry::from).collect();
    serde_json::to_writer_pretty(&mut *out, &entries)?;
    writeln!(out)
}
