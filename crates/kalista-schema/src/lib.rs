//! # kalista-schema — Schema Compilation & Validation
//!
//! Turns the JSON Schema text embedded in a contract file into a compiled
//! validator, and checks decoded JSON values against it.
//!
//! ## Compilation (`compile`)
//!
//! [`SchemaCompiler::compile`] parses the schema text, registers the
//! document under a [`SchemaResource`] URI that is unique to the owning
//! contract and role, and builds a reusable [`CompiledSchema`]. Internal
//! `$ref`s resolve within the document; external references never touch
//! the network.
//!
//! ## Validation (`validate`)
//!
//! [`CompiledSchema::validate`] returns structured [`Violation`]s carrying
//! the instance path, the schema path, and a message for each failure.
//!
//! ## Crate Policy
//!
//! - No I/O. Compilation and validation are synchronous CPU work.
//! - Empty schema text is "no schema", never an always-pass validator.

pub mod compile;
pub mod error;
pub mod validate;

pub use compile::{SchemaCompiler, SchemaResource, RESOURCE_URI_PREFIX};
pub use error::SchemaError;
pub use validate::{CompiledSchema, ValidationViolations, Violation};
