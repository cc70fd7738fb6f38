//! # Contract Definitions
//!
//! [`RawContract`] mirrors the YAML document field for field.
//! [`ContractDefinition`] is the executable form: a raw contract with a
//! validated URL and method and one compiled validator per declared schema.
//!
//! ## Consistency Invariant
//!
//! A validator exists for a role iff the contract carries non-empty schema
//! text for that role. [`ContractDefinition::resolve_validator`] reports a
//! declared-but-absent validator as [`DefinitionError::MissingValidator`]
//! so callers never mistake it for "no schema".

use kalista_schema::CompiledSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::error::{ContractParseError, DefinitionError};
use crate::role::SchemaRole;

/// The contract document as written.
///
/// Unknown keys are ignored so contract files can carry authoring notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawContract {
    /// Human-readable identifier. May be absent or empty.
    #[serde(default)]
    pub contract_id: Option<String>,
    /// Target endpoint.
    pub url: String,
    /// HTTP method.
    pub method: String,
    /// Expected HTTP status. Absent or `0` means unchecked.
    #[serde(default)]
    pub status: Option<u16>,
    /// Literal request body (JSON text).
    #[serde(default)]
    pub payload: Option<String>,
    /// JSON Schema text for the request body.
    #[serde(default)]
    pub request: Option<String>,
    /// JSON Schema text for the response body.
    #[serde(default)]
    pub response: Option<String>,
}

impl RawContract {
    /// Declared `contractId`, if non-empty.
    pub fn contract_id(&self) -> Option<&str> {
        non_empty(self.contract_id.as_deref())
    }

    /// Expected status, if one was declared.
    pub fn expected_status(&self) -> Option<u16> {
        self.status.filter(|s| *s != 0)
    }

    /// Literal payload, if non-empty.
    pub fn payload(&self) -> Option<&str> {
        non_empty(self.payload.as_deref())
    }

    /// Schema text for `role`, if non-empty.
    pub fn schema_text(&self, role: SchemaRole) -> Option<&str> {
        let text = match role {
            SchemaRole::Request => self.request.as_deref(),
            SchemaRole::Response => self.response.as_deref(),
        };
        non_empty(text)
    }
}

fn non_empty(text: Option<&str>) -> Option<&str> {
    text.filter(|t| !t.trim().is_empty())
}

/// An executable contract.
///
/// Built fresh per run and owned by the task executing it.
#[derive(Debug)]
pub struct ContractDefinition {
    identifier: String,
    raw: RawContract,
    url: Url,
    method: String,
    request_validator: Option<CompiledSchema>,
    response_validator: Option<CompiledSchema>,
}

impl ContractDefinition {
    /// Assemble a definition from a raw contract and its compiled validators.
    ///
    /// Validates the URL (absolute, `http` or `https`) and the method (an
    /// HTTP token, normalized to uppercase). The validators are trusted as
    /// given; [`ContractDefinition::resolve_validator`] detects a declared
    /// schema whose validator is missing.
    ///
    /// # Errors
    ///
    /// Returns [`ContractParseError::Malformed`] for an unusable URL or method.
    pub fn from_parts(
        identifier: &str,
        raw: RawContract,
        request_validator: Option<CompiledSchema>,
        response_validator: Option<CompiledSchema>,
    ) -> Result<Self, ContractParseError> {
        let malformed = |reason: String| ContractParseError::Malformed {
            contract: identifier.to_string(),
            reason,
        };

        let url = Url::parse(raw.url.trim())
            .map_err(|e| malformed(format!("invalid url '{}': {e}", raw.url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(malformed(format!(
                "unsupported url scheme '{}' (expected http or https)",
                url.scheme()
            )));
        }

        let method = raw.method.trim().to_ascii_uppercase();
        if method.is_empty() || !method.bytes().all(is_token_byte) {
            return Err(malformed(format!("invalid HTTP method '{}'", raw.method)));
        }

        Ok(Self {
            identifier: identifier.to_string(),
            raw,
            url,
            method,
            request_validator,
            response_validator,
        })
    }

    /// Identifier the contract was loaded under (usually its file path).
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Declared `contractId`, if non-empty.
    pub fn contract_id(&self) -> Option<&str> {
        self.raw.contract_id()
    }

    /// Label for reports: the declared `contractId`, else the identifier.
    pub fn display_name(&self) -> &str {
        self.contract_id().unwrap_or(&self.identifier)
    }

    /// The document as written.
    pub fn raw(&self) -> &RawContract {
        &self.raw
    }

    /// Target endpoint.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Uppercase HTTP method.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Expected status, if one was declared.
    pub fn expected_status(&self) -> Option<u16> {
        self.raw.expected_status()
    }

    /// Literal payload, if non-empty.
    pub fn payload(&self) -> Option<&str> {
        self.raw.payload()
    }

    /// Whether the contract carries schema text for `role`.
    pub fn declares_schema(&self, role: SchemaRole) -> bool {
        self.raw.schema_text(role).is_some()
    }

    /// Compiled validator for `role`, if any.
    pub fn validator(&self, role: SchemaRole) -> Option<&CompiledSchema> {
        match role {
            SchemaRole::Request => self.request_validator.as_ref(),
            SchemaRole::Response => self.response_validator.as_ref(),
        }
    }

    /// Validator for `role`, checked against the declared schema text.
    ///
    /// `Ok(None)` means the contract declares no schema for `role`.
    ///
    /// # Errors
    ///
    /// Returns [`DefinitionError::MissingValidator`] if schema text is
    /// declared but no validator was compiled.
    pub fn resolve_validator(
        &self,
        role: SchemaRole,
    ) -> Result<Option<&CompiledSchema>, DefinitionError> {
        match (self.declares_schema(role), self.validator(role)) {
            (true, None) => Err(DefinitionError::MissingValidator {
                contract: self.identifier.clone(),
                role,
            }),
            (_, validator) => Ok(validator),
        }
    }

    /// Validate a caller-supplied body against the schema for `role`.
    ///
    /// # Errors
    ///
    /// Returns [`DefinitionError::MissingSchema`] if the contract declares
    /// no schema for `role`, [`DefinitionError::MissingValidator`] on an
    /// internal-consistency fault, and [`DefinitionError::Schema`] with the
    /// violations if `value` does not conform.
    pub fn validate_body(&self, role: SchemaRole, value: &Value) -> Result<(), DefinitionError> {
        let validator = self
            .resolve_validator(role)?
            .ok_or_else(|| DefinitionError::MissingSchema {
                contract: self.identifier.clone(),
                role,
            })?;
        validator.validate(value)?;
        Ok(())
    }
}

/// RFC 9110 `tchar`.
fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}
