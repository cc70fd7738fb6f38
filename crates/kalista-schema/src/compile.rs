//! # Schema Compilation
//!
//! Compiles JSON Schema text into a [`CompiledSchema`].
//!
//! ## Resource Naming
//!
//! Every schema is registered under a resource URI of the form
//!   `kalista://contracts/<segment>/<segment>...`
//!
//! where each segment is form-urlencoded. The contract parser derives the
//! segments from the contract identifier and the schema role, so two
//! contracts compiled concurrently never share a resource name. When the
//! document declares no `$id` of its own, the resource URI becomes its
//! base URI and internal `$ref`s resolve against it.
//!
//! ## Reference Resolution
//!
//! Internal `$ref`s (`#/definitions/...`, `#/$defs/...`, recursive refs)
//! are resolved by the jsonschema crate natively. Anything else goes
//! through [`LocalRetriever`], which only knows the document being
//! compiled and fails for every other URI. Contract schemas must be
//! self-contained.

use std::collections::HashMap;
use std::fmt;

use jsonschema::{Retrieve, Uri, ValidationOptions};
use serde_json::Value;
use url::form_urlencoded;

use crate::error::SchemaError;
use crate::validate::CompiledSchema;

/// URI prefix for every schema resource registered by Kalista.
pub const RESOURCE_URI_PREFIX: &str = "kalista://contracts/";

/// Identifier a schema document is registered under while compiling.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SchemaResource(String);

impl SchemaResource {
    /// Build a resource URI from path segments.
    ///
    /// Segments are form-urlencoded, so arbitrary identifiers (file paths
    /// with slashes or spaces) map to distinct, well-formed URIs.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let encoded: Vec<String> = segments
            .into_iter()
            .map(|s| form_urlencoded::byte_serialize(s.as_ref().as_bytes()).collect())
            .collect();
        Self(format!("{RESOURCE_URI_PREFIX}{}", encoded.join("/")))
    }

    /// Returns the resource URI.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SchemaResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Retriever that resolves only the documents it was handed.
///
/// Keeps the jsonschema crate from making network requests for `$ref`s
/// that point outside the contract.
struct LocalRetriever {
    /// Map from URI string (without fragment) to schema document.
    documents: HashMap<String, Value>,
}

impl Retrieve for LocalRetriever {
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        let uri_str = uri.as_str();
        let without_fragment = uri_str.split('#').next().unwrap_or(uri_str);

        self.documents
            .get(without_fragment)
            .cloned()
            .ok_or_else(|| {
                format!(
                    "external reference '{uri_str}' is not available; \
                     contract schemas must be self-contained"
                )
                .into()
            })
    }
}

/// Compiles schema text into reusable validators.
///
/// Stateless: compiling the same text under the same resource twice
/// yields validators that agree on every instance.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaCompiler;

impl SchemaCompiler {
    /// Create a compiler.
    pub fn new() -> Self {
        Self
    }

    /// Compile `text` registered under `resource`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Compile`] if `text` is not valid JSON, is not
    /// a valid JSON Schema, or references a document outside itself.
    pub fn compile(
        &self,
        text: &str,
        resource: &SchemaResource,
    ) -> Result<CompiledSchema, SchemaError> {
        let mut document: Value =
            serde_json::from_str(text).map_err(|e| SchemaError::Compile {
                resource: resource.to_string(),
                reason: format!("invalid JSON: {e}"),
            })?;

        register_base_uri(&mut document, resource);

        let options = build_options(resource, &document);
        let validator = options
            .build(&document)
            .map_err(|e| SchemaError::Compile {
                resource: resource.to_string(),
                reason: e.to_string(),
            })?;

        Ok(CompiledSchema::new(resource.clone(), validator))
    }

    /// Compile `text` unless it is empty.
    ///
    /// Empty (or whitespace-only) text means the contract declares no
    /// schema for this role; the result is `Ok(None)` and no validator is
    /// constructed.
    ///
    /// # Errors
    ///
    /// Same as [`SchemaCompiler::compile`].
    pub fn compile_optional(
        &self,
        text: &str,
        resource: &SchemaResource,
    ) -> Result<Option<CompiledSchema>, SchemaError> {
        if text.trim().is_empty() {
            return Ok(None);
        }
        self.compile(text, resource).map(Some)
    }
}

/// Use the resource URI as the document's base URI unless the document
/// already names itself via `$id` (or draft-04 `id`).
fn register_base_uri(document: &mut Value, resource: &SchemaResource) {
    if let Value::Object(map) = document {
        if !map.contains_key("$id") && !map.contains_key("id") {
            map.insert("$id".to_string(), Value::String(resource.to_string()));
        }
    }
}

/// Build `ValidationOptions` whose retriever knows only this document.
fn build_options(resource: &SchemaResource, document: &Value) -> ValidationOptions {
    let mut documents = HashMap::new();
    documents.insert(resource.to_string(), document.clone());
    if let Some(id) = document.get("$id").and_then(|v| v.as_str()) {
        documents.insert(id.to_string(), document.clone());
    }

    let mut opts = jsonschema::options();
    opts.with_retriever(LocalRetriever { documents });
    opts
}
