//! Schema validation for cleaned endpoint text.
//!
//! [`parse_and_validate`] parses cleaned text as a generic JSON structure and
//! checks it field-by-field against a [`Schema`]. The first missing or
//! wrong-typed field encountered (in schema declaration order) is reported as
//! the failure reason; the message is what gets fed back to the model in the
//! repair prompt, so it stays specific.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::schema::{Field, FieldType, Schema};

/// A parse or validation failure for one attempt.
///
/// Recoverable: the recovery loop converts this into the next repair prompt
/// while retry budget remains.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// The cleaned text did not parse as JSON at all.
    #[error("response is not valid JSON: {0}")]
    NotJson(String),

    /// The parsed value was not a JSON object.
    #[error("response must be a JSON object, got {0}")]
    NotAnObject(&'static str),

    /// A required field was absent.
    #[error("missing required field '{0}'")]
    MissingField(String),

    /// A required field was present but null.
    #[error("required field '{0}' is null")]
    NullField(String),

    /// A required string field was empty or whitespace-only.
    #[error("required field '{0}' is empty")]
    EmptyField(String),

    /// A field held a value incompatible with its declared type.
    #[error("field '{field}' should be {expected}, got {actual}")]
    WrongType {
        /// Dotted path to the offending field (`address.city`, `tags[2]`).
        field: String,
        /// The declared type label.
        expected: String,
        /// The JSON type actually found.
        actual: &'static str,
    },
}

/// Parse cleaned text as JSON, then validate it against the schema.
///
/// Returns the validated key-value mapping on success.
pub fn parse_and_validate(
    cleaned: &str,
    schema: &Schema,
) -> Result<Map<String, Value>, ValidationError> {
    let value: Value =
        serde_json::from_str(cleaned).map_err(|e| ValidationError::NotJson(e.to_string()))?;
    validate(&value, schema)
}

/// Validate an already-parsed JSON value against the schema.
///
/// Every required field must be present, non-null, non-empty (strings), and
/// type-compatible. Optional fields are checked only when present and
/// non-null. Nested objects recurse with a dotted field path.
pub fn validate(value: &Value, schema: &Schema) -> Result<Map<String, Value>, ValidationError> {
    let object = value
        .as_object()
        .ok_or(ValidationError::NotAnObject(json_type(value)))?;
    check_object(object, schema, "")?;
    Ok(object.clone())
}

fn check_object(
    object: &Map<String, Value>,
    schema: &Schema,
    prefix: &str,
) -> Result<(), ValidationError> {
    for field in schema.fields() {
        let path = join_path(prefix, &field.name);
        match object.get(&field.name) {
            None => {
                if field.required {
                    return Err(ValidationError::MissingField(path));
                }
            }
            Some(Value::Null) => {
                if field.required {
                    return Err(ValidationError::NullField(path));
                }
            }
            Some(v) => check_value(v, field, &path)?,
        }
    }
    Ok(())
}

fn check_value(value: &Value, field: &Field, path: &str) -> Result<(), ValidationError> {
    check_type(value, &field.kind, path)?;

    // Emptiness is a field-level concern: a required string must carry text.
    if field.required {
        if let (FieldType::String, Some(s)) = (&field.kind, value.as_str()) {
            if s.trim().is_empty() {
                return Err(ValidationError::EmptyField(path.to_string()));
            }
        }
    }
    Ok(())
}

fn check_type(value: &Value, kind: &FieldType, path: &str) -> Result<(), ValidationError> {
    let mismatch = || ValidationError::WrongType {
        field: path.to_string(),
        expected: kind.label(),
        actual: json_type(value),
    };

    match kind {
        FieldType::String => {
            if !value.is_string() {
                return Err(mismatch());
            }
        }
        FieldType::Integer => {
            let ok = value.is_i64()
                || value.is_u64()
                || value.as_f64().is_some_and(|f| f.fract() == 0.0);
            if !ok {
                return Err(mismatch());
            }
        }
        FieldType::Float => {
            if !value.is_number() {
                return Err(mismatch());
            }
        }
        FieldType::Boolean => {
            if !value.is_boolean() {
                return Err(mismatch());
            }
        }
        FieldType::List(inner) => {
            let items = value.as_array().ok_or_else(mismatch)?;
            for (i, item) in items.iter().enumerate() {
                check_type(item, inner, &format!("{}[{}]", path, i))?;
            }
        }
        FieldType::Object(nested) => {
            let object = value.as_object().ok_or_else(mismatch)?;
            check_object(object, nested, path)?;
        }
    }
    Ok(())
}

/// JSON type name for error messages.
fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}
