//! # Contract Parser
//!
//! Deserializes one YAML contract document and compiles its embedded
//! schemas. Schema resources are named after the contract identifier and
//! role (see [`SchemaRole::resource_for`]), so parsing many contracts in
//! parallel never produces colliding resource names.

use kalista_schema::{CompiledSchema, SchemaCompiler};

use crate::definition::{ContractDefinition, RawContract};
use crate::error::ContractParseError;
use crate::role::SchemaRole;

/// Parses raw contract bytes into executable definitions.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContractParser {
    compiler: SchemaCompiler,
}

impl ContractParser {
    /// Create a parser.
    pub fn new() -> Self {
        Self::default()
    }

    /// Deserialize `bytes` without compiling any schema.
    ///
    /// # Errors
    ///
    /// Returns [`ContractParseError::Malformed`] if the YAML is invalid or
    /// does not match the contract shape.
    pub fn parse_raw(&self, identifier: &str, bytes: &[u8]) -> Result<RawContract, ContractParseError> {
        serde_yaml::from_slice(bytes).map_err(|e| ContractParseError::Malformed {
            contract: identifier.to_string(),
            reason: format!("invalid contract document: {e}"),
        })
    }

    /// Parse `bytes` and compile every declared schema.
    ///
    /// # Errors
    ///
    /// Returns [`ContractParseError::Malformed`] for a bad document, URL,
    /// or method, and [`ContractParseError::SchemaCompile`] if either schema
    /// fails to compile. No partially compiled definition is returned.
    pub fn parse(&self, identifier: &str, bytes: &[u8]) -> Result<ContractDefinition, ContractParseError> {
        let raw = self.parse_raw(identifier, bytes)?;
        let request = self.compile_role(identifier, &raw, SchemaRole::Request)?;
        let response = self.compile_role(identifier, &raw, SchemaRole::Response)?;

        tracing::trace!(
            contract = identifier,
            request_schema = request.is_some(),
            response_schema = response.is_some(),
            "parsed contract"
        );

        ContractDefinition::from_parts(identifier, raw, request, response)
    }

    fn compile_role(
        &self,
        identifier: &str,
        raw: &RawContract,
        role: SchemaRole,
    ) -> Result<Option<CompiledSchema>, ContractParseError> {
        let Some(text) = raw.schema_text(role) else {
            return Ok(None);
        };
        self.compiler
            .compile(text, &role.resource_for(identifier))
            .map(Some)
            .map_err(|source| ContractParseError::SchemaCompile {
                contract: identifier.to_string(),
                role,
                source,
            })
    }
}

/// Parse one contract with a default [`ContractParser`].
///
/// # Errors
///
/// See [`ContractParser::parse`].
pub fn parse_contract(identifier: &str, bytes: &[u8]) -> Result<ContractDefinition, ContractParseError> {
    ContractParser::new().parse(identifier, bytes)
}
