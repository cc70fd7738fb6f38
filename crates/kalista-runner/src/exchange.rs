//! # Exchange Executor
//!
//! Performs one contract's HTTP exchange and checks it.
//!
//! ## Order of checks
//!
//! 1. Both validators are resolved against the declared schema text.
//! 2. A payload with a request schema is decoded and validated before
//!    anything is sent. An invalid fixture never reaches the server.
//! 3. The request is sent with `Content-Type: application/json`. The body
//!    is the payload only when a request schema is declared.
//! 4. A declared status is compared before the body is looked at.
//! 5. The body is decoded as JSON and validated against the response schema.
//!
//! The configured timeout covers the whole round trip including reading
//! the body.

use std::time::{Duration, Instant};

use kalista_contract::{ContractDefinition, SchemaRole};
use kalista_schema::CompiledSchema;
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use serde_json::Value;

use crate::error::{ContractError, RunnerError};

/// What a successful exchange observed.
#[derive(Debug, Clone)]
pub struct ExchangeReport {
    /// Status returned by the server.
    pub status: u16,
    /// Decoded response body. `Null` for an empty body.
    pub body: Value,
    /// Whether a request body was sent.
    pub sent_body: bool,
    /// Time from sending the request until the body was read.
    pub elapsed: Duration,
}

/// Executes contract exchanges over a shared HTTP client.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct Exchange {
    http: reqwest::Client,
    timeout: Duration,
}

impl Exchange {
    /// Build an executor with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Client`] if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, RunnerError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("kalista/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(RunnerError::Client)?;
        Ok(Self::with_client(http, timeout))
    }

    /// Build an executor over an existing client.
    pub fn with_client(http: reqwest::Client, timeout: Duration) -> Self {
        Self { http, timeout }
    }

    /// Per-exchange timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run the exchange described by `definition` and check every declared
    /// expectation.
    ///
    /// # Errors
    ///
    /// Returns the first failed check as a [`ContractError`].
    pub async fn execute(&self, definition: &ContractDefinition) -> Result<ExchangeReport, ContractError> {
        let request_validator = definition
            .resolve_validator(SchemaRole::Request)
            .map_err(ContractError::Definition)?;
        let response_validator = definition
            .resolve_validator(SchemaRole::Response)
            .map_err(ContractError::Definition)?;

        let body = match (request_validator, definition.payload()) {
            (Some(validator), Some(payload)) => {
                check_fixture(definition.identifier(), validator, payload)?;
                Some(payload.to_string())
            }
            (None, Some(_)) => {
                tracing::warn!(
                    contract = definition.identifier(),
                    "payload declared without a request schema, sending no body"
                );
                None
            }
            (_, None) => None,
        };

        let method = Method::from_bytes(definition.method().as_bytes()).map_err(|e| {
            ContractError::Parse(kalista_contract::ContractParseError::Malformed {
                contract: definition.identifier().to_string(),
                reason: format!("invalid HTTP method '{}': {e}", definition.method()),
            })
        })?;

        let sent_body = body.is_some();
        let mut request = self
            .http
            .request(method, definition.url().as_str())
            .header(CONTENT_TYPE, "application/json")
            .timeout(self.timeout);
        if let Some(body) = body {
            request = request.body(body);
        }

        tracing::debug!(
            contract = definition.identifier(),
            method = definition.method(),
            url = %definition.url(),
            "sending request"
        );
        let started = Instant::now();
        let response = request.send().await.map_err(|e| self.transport_error(definition, e))?;

        let status = response.status().as_u16();
        if let Some(expected) = definition.expected_status() {
            if expected != status {
                return Err(ContractError::StatusMismatch {
                    expected,
                    actual: status,
                });
            }
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(definition, e))?;
        let elapsed = started.elapsed();
        tracing::debug!(
            contract = definition.identifier(),
            status,
            elapsed_ms = elapsed.as_millis() as u64,
            "received response"
        );

        let body = decode_body(&bytes, response_validator.is_some())?;
        if let Some(validator) = response_validator {
            validator
                .validate(&body)
                .map_err(|e| ContractError::from_schema(definition.identifier(), SchemaRole::Response, e))?;
        }

        Ok(ExchangeReport {
            status,
            body,
            sent_body,
            elapsed,
        })
    }

    fn transport_error(&self, definition: &ContractDefinition, source: reqwest::Error) -> ContractError {
        let method = definition.method().to_string();
        let url = definition.url().to_string();
        if source.is_timeout() {
            ContractError::Timeout {
                method,
                url,
                timeout: self.timeout,
            }
        } else {
            ContractError::Transport { method, url, source }
        }
    }
}

/// Validate a caller-supplied body against `role`'s schema of `definition`.
///
/// # Errors
///
/// Returns [`ContractError::Definition`] if `role` has no schema, and
/// [`ContractError::RequestFixtureInvalid`] or
/// [`ContractError::ResponseSchemaViolation`] if `value` does not conform.
pub fn validate_body(definition: &ContractDefinition, role: SchemaRole, value: &Value) -> Result<(), ContractError> {
    definition
        .validate_body(role, value)
        .map_err(|e| ContractError::from_definition(definition.identifier(), role, e))
}

fn check_fixture(contract: &str, validator: &CompiledSchema, payload: &str) -> Result<(), ContractError> {
    let value: Value =
        serde_json::from_str(payload).map_err(|source| ContractError::PayloadDecode { source })?;
    validator
        .validate(&value)
        .map_err(|e| ContractError::from_schema(contract, SchemaRole::Request, e))
}

fn decode_body(bytes: &[u8], schema_declared: bool) -> Result<Value, ContractError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        if schema_declared {
            return Err(ContractError::ResponseDecode {
                reason: "empty body".to_string(),
            });
        }
        return Ok(Value::Null);
    }
    serde_json::from_slice(bytes).map_err(|e| ContractError::ResponseDecode {
        reason: e.to_string(),
    })
}
