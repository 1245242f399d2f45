//! # Schema Module
//!
//! Capability contract for the schema library and a built-in JSON Schema
//! implementation.
//!
//! The core never depends on a concrete schema language. Everything it
//! needs is expressed by [`SchemaContract`]: validate a value (returning
//! the coerced/defaulted output on success) and introspect the schema into
//! a JSON-Schema-shaped fragment for document emission.
//!
//! [`JsonSchema`] is the bundled implementation: it compiles the schema
//! once with the `jsonschema` crate, coerces string inputs toward the
//! declared primitive types, and injects declared `default`s for absent
//! object properties before validating.

use jsonschema::Validator;
use serde_json::{Map, Value};
use std::fmt;

use crate::error::SchemaError;

/// Capability contract consumed from the schema library.
///
/// `validate` is synchronous; a schema implementation that must wait on an
/// external evaluation does so by cooperatively blocking its coroutine or
/// thread, which preserves the pipeline's strict segment ordering.
pub trait SchemaContract: Send + Sync {
    /// Validate `value`, returning the coerced/defaulted output on success.
    fn validate(&self, value: &Value) -> Result<Value, SchemaError>;

    /// JSON-Schema-shaped structural fragment (`type`, `properties`,
    /// `required`, ...) sufficient for document emission.
    fn introspect(&self) -> Value;
}

/// Schema accepting any value unchanged. Used for auto-filled `default`
/// response entries.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnySchema;

impl SchemaContract for AnySchema {
    fn validate(&self, value: &Value) -> Result<Value, SchemaError> {
        Ok(value.clone())
    }

    fn introspect(&self) -> Value {
        Value::Object(Map::new())
    }
}

/// JSON Schema backed implementation of [`SchemaContract`].
///
/// The compiled validator is built once at construction; per-call work is
/// coercion plus validation.
pub struct JsonSchema {
    raw: Value,
    compiled: Validator,
}

impl fmt::Debug for JsonSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonSchema").field("raw", &self.raw).finish()
    }
}

impl JsonSchema {
    /// Compile a JSON Schema. Fails when the schema itself is invalid.
    pub fn new(schema: Value) -> Result<Self, SchemaError> {
        let compiled = jsonschema::validator_for(&schema)
            .map_err(|e| SchemaError::single(format!("invalid schema: {e}")))?;
        Ok(Self {
            raw: schema,
            compiled,
        })
    }
}

impl SchemaContract for JsonSchema {
    fn validate(&self, value: &Value) -> Result<Value, SchemaError> {
        let coerced = coerce_value(&self.raw, value);
        let issues: Vec<String> = self
            .compiled
            .iter_errors(&coerced)
            .map(|e| e.to_string())
            .collect();
        if !issues.is_empty() {
            return Err(SchemaError::new(issues));
        }
        Ok(coerced)
    }

    fn introspect(&self) -> Value {
        self.raw.clone()
    }
}

/// Coerce a value toward the declared schema shape.
///
/// String inputs are parsed into the declared primitive type (path, query,
/// header, and cookie values always arrive as strings), comma-separated
/// strings become arrays, and absent object properties pick up a declared
/// `default`. Values that do not parse are passed through unchanged so the
/// compiled validator reports them.
pub(crate) fn coerce_value(schema: &Value, value: &Value) -> Value {
    let ty = schema.get("type").and_then(|v| v.as_str());

    match ty {
        Some("integer") => coerce_primitive(value, |s| s.parse::<i64>().map(Value::from).ok()),
        Some("number") => coerce_primitive(value, |s| s.parse::<f64>().map(Value::from).ok()),
        Some("boolean") => coerce_primitive(value, |s| s.parse::<bool>().map(Value::from).ok()),
        Some("array") => {
            let items = schema.get("items").cloned().unwrap_or(Value::Null);
            match value {
                Value::String(s) => Value::Array(
                    s.split(',')
                        .filter(|part| !part.is_empty())
                        .map(|part| coerce_value(&items, &Value::String(part.trim().to_string())))
                        .collect(),
                ),
                Value::Array(values) => {
                    Value::Array(values.iter().map(|v| coerce_value(&items, v)).collect())
                }
                other => other.clone(),
            }
        }
        Some("object") | None => coerce_object(schema, value),
        _ => value.clone(),
    }
}

fn coerce_primitive(value: &Value, parse: impl Fn(&str) -> Option<Value>) -> Value {
    match value {
        Value::String(s) => parse(s).unwrap_or_else(|| value.clone()),
        other => other.clone(),
    }
}

fn coerce_object(schema: &Value, value: &Value) -> Value {
    let Some(properties) = schema.get("properties").and_then(|p| p.as_object()) else {
        return value.clone();
    };
    let Some(fields) = value.as_object() else {
        return value.clone();
    };

    let mut out = fields.clone();
    for (name, prop_schema) in properties {
        match fields.get(name) {
            Some(present) => {
                out.insert(name.clone(), coerce_value(prop_schema, present));
            }
            None => {
                if let Some(default) = prop_schema.get("default") {
                    out.insert(name.clone(), default.clone());
                }
            }
        }
    }
    Value::Object(out)
}
