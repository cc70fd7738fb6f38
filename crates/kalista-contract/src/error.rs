//! Contract loading, parsing, and definition errors.

use kalista_schema::SchemaError;
use thiserror::Error;

use crate::role::SchemaRole;

/// Error while turning raw contract bytes into a [`ContractDefinition`].
///
/// [`ContractDefinition`]: crate::ContractDefinition
#[derive(Error, Debug)]
pub enum ContractParseError {
    /// The document is not valid YAML, misses a required field, has a
    /// field of the wrong type, or carries an unusable URL or method.
    #[error("contract '{contract}' is malformed: {reason}")]
    Malformed {
        /// Contract identifier.
        contract: String,
        /// What is wrong with the document.
        reason: String,
    },

    /// The request or response schema text failed to compile.
    #[error("contract '{contract}': {role} schema failed to compile: {source}")]
    SchemaCompile {
        /// Contract identifier.
        contract: String,
        /// Which schema failed.
        role: SchemaRole,
        /// Underlying compilation error.
        source: SchemaError,
    },
}

/// Error raised when using a compiled definition.
#[derive(Error, Debug)]
pub enum DefinitionError {
    /// The contract declares schema text for `role` but carries no
    /// compiled validator. Internal-consistency fault.
    #[error("contract '{contract}' declares a {role} schema but has no compiled validator")]
    MissingValidator {
        /// Contract identifier.
        contract: String,
        /// Role whose validator is missing.
        role: SchemaRole,
    },

    /// A body was supplied for a role the contract declares no schema for.
    #[error("contract '{contract}' declares no {role} schema to validate against")]
    MissingSchema {
        /// Contract identifier.
        contract: String,
        /// Role without a schema.
        role: SchemaRole,
    },

    /// The value does not conform to the schema.
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Error while building a [`ContractSource`].
///
/// [`ContractSource`]: crate::ContractSource
#[derive(Error, Debug)]
pub enum SourceError {
    /// The root path could not be read.
    #[error("cannot read contract root '{path}': {reason}")]
    Root {
        /// Root path.
        path: String,
        /// Underlying reason.
        reason: String,
    },

    /// Two entries share the same identifier.
    #[error("duplicate contract identifier '{0}'")]
    DuplicateIdentifier(String),

    /// An extension filter expression could not be parsed.
    #[error("invalid extension filter '{0}': expected '*', 'ext,ext' or '!ext,ext'")]
    InvalidFilter(String),
}
