//! # Schema Validation
//!
//! Checks decoded JSON values against a compiled schema.
//!
//! Validation is pure: no I/O, no mutation of the schema or the value.
//! Failures carry one [`Violation`] per error reported by the validator,
//! each with the JSON Pointer into the instance, the JSON Pointer into the
//! schema, and a human-readable message.

use std::fmt;

use jsonschema::Validator;
use serde_json::Value;

use crate::compile::SchemaResource;
use crate::error::SchemaError;

/// A single validation violation with structured context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// JSON Pointer path to the violating field in the instance.
    pub instance_path: String,
    /// JSON Pointer path within the schema that triggered the error.
    pub schema_path: String,
    /// Human-readable description of the violation.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_path.is_empty() {
            write!(f, "  (root): {} [schema: {}]", self.message, self.schema_path)
        } else {
            write!(
                f,
                "  {}: {} [schema: {}]",
                self.instance_path, self.message, self.schema_path
            )
        }
    }
}

/// Collection of validation violations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationViolations {
    violations: Vec<Violation>,
}

impl ValidationViolations {
    /// Returns the number of violations.
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Returns true if there are no violations.
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Returns a slice of all violations.
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Consumes self and returns the inner Vec.
    pub fn into_inner(self) -> Vec<Violation> {
        self.violations
    }
}

impl From<Vec<Violation>> for ValidationViolations {
    fn from(violations: Vec<Violation>) -> Self {
        Self { violations }
    }
}

impl fmt::Display for ValidationViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

/// A compiled schema, ready to check arbitrary JSON values.
///
/// `Send + Sync`: a compiled schema can move into the task that owns its
/// contract and be used there without locking.
pub struct CompiledSchema {
    resource: SchemaResource,
    validator: Validator,
}

impl CompiledSchema {
    pub(crate) fn new(resource: SchemaResource, validator: Validator) -> Self {
        Self {
            resource,
            validator,
        }
    }

    /// Resource URI the schema was registered under.
    pub fn resource(&self) -> &SchemaResource {
        &self.resource
    }

    /// Returns true if `instance` conforms to the schema.
    pub fn is_valid(&self, instance: &Value) -> bool {
        self.validator.is_valid(instance)
    }

    /// Validate `instance` against the schema.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Validation`] with every violation found.
    pub fn validate(&self, instance: &Value) -> Result<(), SchemaError> {
        let violations: Vec<Violation> = self
            .validator
            .iter_errors(instance)
            .map(|e| Violation {
                instance_path: e.instance_path.to_string(),
                schema_path: e.schema_path.to_string(),
                message: e.to_string(),
            })
            .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(SchemaError::Validation {
                resource: self.resource.to_string(),
                violations: violations.into(),
            })
        }
    }
}

impl fmt::Debug for CompiledSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledSchema")
            .field("resource", &self.resource)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::SchemaCompiler;
    use serde_json::json;

    fn compile(text: &str) -> CompiledSchema {
        SchemaCompiler::new()
            .compile(text, &SchemaResource::from_segments(["test.yaml", "request.json"]))
            .unwrap()
    }

    #[test]
    fn validate_reports_missing_required_field() {
        let schema = compile(r#"{"type":"object","required":["id"]}"#);
        let err = schema.validate(&json!({"name": "x"})).unwrap_err();
        let violations = err.violations().unwrap();
        assert_eq!(violations.len(), 1);
        let v = &violations.violations()[0];
        assert!(v.message.contains("id"), "got: {}", v.message);
        assert!(v.schema_path.contains("required"), "got: {}", v.schema_path);
        assert!(v.instance_path.is_empty());
    }

    #[test]
    fn validate_reports_nested_instance_path() {
        let schema = compile(
            r#"{
                "type": "object",
                "properties": {
                    "items": {
                        "type": "array",
                        "items": {"type": "object", "properties": {"qty": {"type": "integer"}}}
                    }
                }
            }"#,
        );
        let err = schema
            .validate(&json!({"items": [{"qty": 1}, {"qty": "two"}]}))
            .unwrap_err();
        let v = &err.violations().unwrap().violations()[0];
        assert_eq!(v.instance_path, "/items/1/qty");
    }

    #[test]
    fn validate_collects_every_violation() {
        let schema = compile(
            r#"{
                "type": "object",
                "properties": {
                    "status": {"enum": ["active", "closed"]},
                    "code": {"type": "string", "pattern": "^[A-Z]{3}$"},
                    "age": {"type": "integer", "minimum": 0, "maximum": 150}
                }
            }"#,
        );
        let err = schema
            .validate(&json!({"status": "pending", "code": "abc", "age": 200}))
            .unwrap_err();
        assert_eq!(err.violations().unwrap().len(), 3);
    }

    #[test]
    fn validate_accepts_scalars_and_null() {
        let schema = compile(r#"{"type": ["null", "boolean", "number", "string"]}"#);
        for value in [json!(null), json!(true), json!(1.5), json!("s")] {
            schema.validate(&value).unwrap();
        }
        assert!(schema.validate(&json!({})).is_err());
        assert!(schema.validate(&json!([])).is_err());
    }

    #[test]
    fn validate_does_not_mutate_value() {
        let schema = compile(r#"{"type":"object","required":["id"]}"#);
        let value = json!({"id": 1, "extra": [1, 2, 3]});
        let before = value.clone();
        schema.validate(&value).unwrap();
        assert_eq!(value, before);
    }

    #[test]
    fn validation_is_stable_under_reencoding() {
        let schema = compile(
            r#"{"type":"object","required":["amount"],"properties":{"amount":{"type":"number"}}}"#,
        );
        let original: Value = serde_json::from_str(r#"{ "amount" : 10.5, "memo": "x" }"#).unwrap();
        schema.validate(&original).unwrap();
        let reencoded = serde_json::to_string(&original).unwrap();
        let decoded: Value = serde_json::from_str(&reencoded).unwrap();
        schema.validate(&decoded).unwrap();
    }

    #[test]
    fn violation_display_root() {
        let v = Violation {
            instance_path: String::new(),
            schema_path: "/required".to_string(),
            message: r#""id" is a required property"#.to_string(),
        };
        let display = v.to_string();
        assert!(display.contains("(root)"));
        assert!(display.contains("/required"));
    }

    #[test]
    fn violation_display_nested() {
        let v = Violation {
            instance_path: "/user/email".to_string(),
            schema_path: "/properties/user/properties/email/type".to_string(),
            message: r#"42 is not of type "string""#.to_string(),
        };
        assert!(v.to_string().contains("/user/email"));
    }

    #[test]
    fn compiled_schema_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CompiledSchema>();
    }
}
