//! # kalista-contract — Contract Model & Parser
//!
//! A contract is a YAML document describing one HTTP interaction:
//!
//! ```yaml
//! contractId: create-order
//! url: https://api.example.com/orders
//! method: POST
//! status: 201
//! payload: '{"amount": 10}'
//! request: |
//!   {"type": "object", "required": ["amount"],
//!    "properties": {"amount": {"type": "number"}}}
//! response: |
//!   {"type": "object", "required": ["id"]}
//! ```
//!
//! ## Pipeline
//!
//! - [`ContractSource`] holds raw bytes keyed by identifier (usually the
//!   file path). [`load_dir`] builds one from a directory tree, filtered by
//!   an [`ExtensionFilter`].
//! - [`parse_contract`] deserializes one document into a [`RawContract`]
//!   and compiles its `request`/`response` schema text into a
//!   [`ContractDefinition`].
//!
//! ## Crate Policy
//!
//! - A definition is either fully compiled or not returned at all.
//! - A validator is never built from empty schema text, and asking for a
//!   declared validator that is absent is an error, not a pass.

pub mod definition;
pub mod error;
pub mod parse;
pub mod role;
pub mod source;

pub use definition::{ContractDefinition, RawContract};
pub use error::{ContractParseError, DefinitionError, SourceError};
pub use parse::{parse_contract, ContractParser};
pub use role::SchemaRole;
pub use source::{load_dir, ContractSource, ExtensionFilter};
