//! Schema compilation and validation errors.

use thiserror::Error;

use crate::validate::ValidationViolations;

/// Error raised while compiling a schema or validating against it.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// The schema text is not valid JSON, or it violates the JSON Schema
    /// meta-schema, or it references a document that cannot be resolved.
    #[error("schema '{resource}' failed to compile: {reason}")]
    Compile {
        /// Resource URI the schema was registered under.
        resource: String,
        /// Reason the schema could not be compiled.
        reason: String,
    },

    /// The instance did not conform to the schema.
    #[error("document does not conform to schema '{resource}':\n{violations}")]
    Validation {
        /// Resource URI of the schema that was validated against.
        resource: String,
        /// Structured list of individual violations.
        violations: ValidationViolations,
    },
}

impl SchemaError {
    /// Returns the violations when this is a validation failure.
    pub fn violations(&self) -> Option<&ValidationViolations> {
        match self {
            Self::Validation { violations, .. } => Some(violations),
            Self::Compile { .. } => None,
        }
    }
}
