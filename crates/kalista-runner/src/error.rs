//! Error taxonomy for contract execution.
//!
//! Every failure of one contract's pipeline is a [`ContractError`] and ends
//! up in that contract's outcome. [`RunnerError`] is reserved for failures
//! that prevent a run from starting at all.

use std::error::Error as StdError;
use std::fmt;
use std::time::Duration;

use kalista_contract::{ContractParseError, DefinitionError, SchemaRole};
use kalista_schema::{SchemaError, ValidationViolations};
use serde::Serialize;
use thiserror::Error;

use crate::config::ConfigError;

/// Why one contract failed.
#[derive(Error, Debug)]
pub enum ContractError {
    /// The contract document could not be parsed.
    #[error(transparent)]
    Parse(ContractParseError),

    /// A request or response schema failed to compile.
    #[error(transparent)]
    SchemaCompile(ContractParseError),

    /// The request could not be sent or the response could not be read.
    #[error("{method} {url} failed: {source}")]
    Transport {
        method: String,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The exchange did not complete within the configured timeout.
    #[error("{method} {url} timed out after {}s", .timeout.as_secs_f64())]
    Timeout {
        method: String,
        url: String,
        timeout: Duration,
    },

    /// The server answered with a status other than the declared one.
    #[error("expected status {expected}, got {actual}")]
    StatusMismatch { expected: u16, actual: u16 },

    /// The response body is not JSON (or is empty while a schema is declared).
    #[error("response body is not valid JSON: {reason}")]
    ResponseDecode { reason: String },

    /// The declared payload is not JSON.
    #[error("request payload is not valid JSON: {source}")]
    PayloadDecode {
        #[source]
        source: serde_json::Error,
    },

    /// The declared payload violates the request schema.
    #[error("request payload does not conform to the request schema:\n{violations}")]
    RequestFixtureInvalid { violations: ValidationViolations },

    /// The response body violates the response schema.
    #[error("response does not conform to the response schema:\n{violations}")]
    ResponseSchemaViolation { violations: ValidationViolations },

    /// A declared schema has no compiled validator, or a body was checked
    /// against a role with no schema.
    #[error(transparent)]
    Definition(DefinitionError),
}

impl ContractError {
    /// Classification used by reports and exit-code decisions.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Parse(_) => ErrorKind::Parse,
            Self::SchemaCompile(_) => ErrorKind::SchemaCompile,
            Self::Transport { .. } => ErrorKind::Transport,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::StatusMismatch { .. } => ErrorKind::StatusMismatch,
            Self::ResponseDecode { .. } => ErrorKind::ResponseDecode,
            Self::PayloadDecode { .. } | Self::RequestFixtureInvalid { .. } => {
                ErrorKind::RequestFixtureInvalid
            }
            Self::ResponseSchemaViolation { .. } => ErrorKind::ResponseSchemaViolation,
            Self::Definition(DefinitionError::MissingSchema { .. }) => ErrorKind::MissingSchema,
            Self::Definition(_) => ErrorKind::MissingValidator,
        }
    }

    /// Schema violations carried by this error, if any.
    pub fn violations(&self) -> Option<&ValidationViolations> {
        match self {
            Self::RequestFixtureInvalid { violations }
            | Self::ResponseSchemaViolation { violations } => Some(violations),
            _ => None,
        }
    }

    /// The message followed by every underlying cause, separated by `: `.
    pub fn detail(&self) -> String {
        let mut detail = self.to_string();
        let mut cause = StdError::source(self);
        while let Some(err) = cause {
            let text = err.to_string();
            if !detail.contains(&text) {
                detail.push_str(": ");
                detail.push_str(&text);
            }
            cause = StdError::source(err);
        }
        detail
    }

    /// Map a failed check of a body against `role`'s schema of `contract`.
    pub(crate) fn from_schema(contract: &str, role: SchemaRole, err: SchemaError) -> Self {
        match err {
            SchemaError::Validation { violations, .. } => match role {
                SchemaRole::Request => Self::RequestFixtureInvalid { violations },
                SchemaRole::Response => Self::ResponseSchemaViolation { violations },
            },
            // Compilation only happens at parse time; a compile error here
            // would mean the definition was assembled by hand.
            err @ SchemaError::Compile { .. } => Self::SchemaCompile(ContractParseError::SchemaCompile {
                contract: contract.to_string(),
                role,
                source: err,
            }),
        }
    }

    /// Map a definition error raised while checking a body against `role`.
    pub(crate) fn from_definition(contract: &str, role: SchemaRole, err: DefinitionError) -> Self {
        match err {
            DefinitionError::Schema(source) => Self::from_schema(contract, role, source),
            other => Self::Definition(other),
        }
    }
}

impl From<ContractParseError> for ContractError {
    fn from(err: ContractParseError) -> Self {
        match err {
            err @ ContractParseError::Malformed { .. } => Self::Parse(err),
            err @ ContractParseError::SchemaCompile { .. } => Self::SchemaCompile(err),
        }
    }
}

/// Coarse classification of a [`ContractError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    #[serde(rename = "ParseError")]
    Parse,
    #[serde(rename = "SchemaCompileError")]
    SchemaCompile,
    #[serde(rename = "TransportError")]
    Transport,
    #[serde(rename = "TimeoutError")]
    Timeout,
    #[serde(rename = "StatusMismatch")]
    StatusMismatch,
    #[serde(rename = "ResponseDecodeError")]
    ResponseDecode,
    #[serde(rename = "RequestFixtureInvalid")]
    RequestFixtureInvalid,
    #[serde(rename = "ResponseSchemaViolation")]
    ResponseSchemaViolation,
    #[serde(rename = "MissingValidator")]
    MissingValidator,
    #[serde(rename = "MissingSchema")]
    MissingSchema,
}

impl ErrorKind {
    /// Stable name used in reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Parse => "ParseError",
            Self::SchemaCompile => "SchemaCompileError",
            Self::Transport => "TransportError",
            Self::Timeout => "TimeoutError",
            Self::StatusMismatch => "StatusMismatch",
            Self::ResponseDecode => "ResponseDecodeError",
            Self::RequestFixtureInvalid => "RequestFixtureInvalid",
            Self::ResponseSchemaViolation => "ResponseSchemaViolation",
            Self::MissingValidator => "MissingValidator",
            Self::MissingSchema => "MissingSchema",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure that prevents a run from starting.
#[derive(Error, Debug)]
pub enum RunnerError {
    /// The shared HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    /// The runner configuration failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
