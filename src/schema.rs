//! Target schema: the structural contract a model response must satisfy.
//!
//! A [`Schema`] is an ordered set of named fields, each carrying a
//! [`FieldType`], a human description (embedded into prompts), and a
//! `required` flag. Types are a tagged variant interpreted uniformly by the
//! validator, so the recovery logic is not bound to any concrete
//! type-declaration mechanism.
//!
//! # Example
//!
//! ```
//! use llm_recover::schema::{FieldType, Schema};
//!
//! let schema = Schema::new()
//!     .field("title", FieldType::String, "book title")
//!     .field("pages", FieldType::Integer, "number of pages")
//!     .optional("tags", FieldType::List(Box::new(FieldType::String)), "topic tags");
//!
//! assert!(schema.ensure_valid().is_ok());
//! ```

use crate::error::{RecoverError, Result};

/// The declared type of a schema field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    /// A JSON string.
    String,
    /// A JSON integer (floats with a zero fractional part are accepted).
    Integer,
    /// Any JSON number.
    Float,
    /// A JSON boolean.
    Boolean,
    /// A JSON array whose elements satisfy the inner type.
    List(Box<FieldType>),
    /// A nested JSON object validated against its own schema.
    Object(Schema),
}

impl FieldType {
    /// Human-readable type label used in prompts and error messages.
    pub fn label(&self) -> String {
        match self {
            FieldType::String => "string".to_string(),
            FieldType::Integer => "integer".to_string(),
            FieldType::Float => "float".to_string(),
            FieldType::Boolean => "boolean".to_string(),
            FieldType::List(inner) => format!("list of {}", inner.label()),
            FieldType::Object(_) => "object".to_string(),
        }
    }
}

/// A single named field in a [`Schema`].
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// JSON key name.
    pub name: String,
    /// Declared type.
    pub kind: FieldType,
    /// Human description, embedded into the outbound prompt.
    pub description: String,
    /// Whether the field must be present and non-empty in the response.
    pub required: bool,
}

/// Ordered collection of fields describing the expected response shape.
///
/// Immutable for the duration of one recovery call; build it up front with
/// [`field`](Schema::field) and [`optional`](Schema::optional).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    /// Create an empty schema. Add fields before use — an empty schema
    /// fails [`ensure_valid`](Schema::ensure_valid).
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a required field.
    pub fn field(
        mut self,
        name: impl Into<String>,
        kind: FieldType,
        description: impl Into<String>,
    ) -> Self {
        self.fields.push(Field {
            name: name.into(),
            kind,
            description: description.into(),
            required: true,
        });
        self
    }

    /// Add an optional field. When present and non-null it must still
    /// type-check; when absent or null it is ignored.
    pub fn optional(
        mut self,
        name: impl Into<String>,
        kind: FieldType,
        description: impl Into<String>,
    ) -> Self {
        self.fields.push(Field {
            name: name.into(),
            kind,
            description: description.into(),
            required: false,
        });
        self
    }

    /// The declared fields, in declaration order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Fail fast on a malformed schema, before any endpoint call.
    ///
    /// Rejects: no fields, no required field at the top level, duplicate
    /// field names, and empty nested object schemas.
    pub fn ensure_valid(&self) -> Result<()> {
        if self.fields.is_empty() {
            return Err(RecoverError::InvalidSchema(
                "schema declares no fields".into(),
            ));
        }
        if !self.fields.iter().any(|f| f.required) {
            return Err(RecoverError::InvalidSchema(
                "schema must declare at least one required field".into(),
            ));
        }
        self.check_shape("")
    }

    /// Structural checks applied at every nesting level.
    fn check_shape(&self, path: &str) -> Result<()> {
        for (i, field) in self.fields.iter().enumerate() {
            if field.name.is_empty() {
                return Err(RecoverError::InvalidSchema(format!(
                    "field at position {} under '{}' has an empty name",
                    i,
                    if path.is_empty() { "(root)" } else { path }
                )));
            }
            if self.fields[..i].iter().any(|f| f.name == field.name) {
                return Err(RecoverError::InvalidSchema(format!(
                    "duplicate field name '{}'",
                    join_path(path, &field.name)
                )));
            }
            check_type_shape(&field.kind, &join_path(path, &field.name))?;
        }
        Ok(())
    }

    /// Field-by-field description block embedded into outbound prompts.
    ///
    /// One line per field: name, type label, required/optional marker, and
    /// the human description. Nested object fields are indented beneath
    /// their parent.
    pub fn describe_fields(&self) -> String {
        let mut out = String::new();
        self.describe_into(&mut out, 0);
        out
    }

    fn describe_into(&self, out: &mut String, depth: usize) {
        for field in &self.fields {
            let indent = "  ".repeat(depth);
            let requirement = if field.required { "required" } else { "optional" };
            out.push_str(&format!(
                "{}- \"{}\" ({}, {}): {}\n",
                indent,
                field.name,
                field.kind.label(),
                requirement,
                field.description
            ));
            if let Some(nested) = nested_schema(&field.kind) {
                nested.describe_into(out, depth + 1);
            }
        }
    }
}

/// Dig through `List` wrappers to a nested object schema, if any.
fn nested_schema(kind: &FieldType) -> Option<&Schema> {
    match kind {
        FieldType::Object(schema) => Some(schema),
        FieldType::List(inner) => nested_schema(inner),
        _ => None,
    }
}

fn check_type_shape(kind: &FieldType, path: &str) -> Result<()> {
    match kind {
        FieldType::Object(schema) => {
            if schema.fields.is_empty() {
                return Err(RecoverError::InvalidSchema(format!(
                    "nested object '{}' declares no fields",
                    path
                )));
            }
            schema.check_shape(path)
        }
        FieldType::List(inner) => check_type_shape(inner, path),
        _ => Ok(()),
    }
}

fn join_path(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", path, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_schema() {
        let schema = Schema::new()
            .field("title", FieldType::String, "title")
            .optional("isbn", FieldType::String, "ISBN");
        assert!(schema.ensure_valid().is_ok());
    }

    #[test]
    fn test_empty_schema_rejected() {
        let schema = Schema::new();
        let err = schema.ensure_valid().unwrap_err();
        assert!(err.to_string().contains("no fields"));
    }

    #[test]
    fn test_all_optional_rejected() {
        let schema = Schema::new().optional("note", FieldType::String, "note");
        let err = schema.ensure_valid().unwrap_err();
        assert!(err.to_string().contains("at least one required field"));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let schema = Schema::new()
            .field("name", FieldType::String, "a")
            .field("name", FieldType::Integer, "b");
        let err = schema.ensure_valid().unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_empty_nested_object_rejected() {
        let schema = Schema::new().field("address", FieldType::Object(Schema::new()), "address");
        let err = schema.ensure_valid().unwrap_err();
        assert!(err.to_string().contains("address"));
    }

    #[test]
    fn test_nested_duplicate_reported_with_path() {
        let inner = Schema::new()
            .field("city", FieldType::String, "city")
            .field("city", FieldType::String, "again");
        let schema = Schema::new().field("address", FieldType::Object(inner), "address");
        let err = schema.ensure_valid().unwrap_err();
        assert!(err.to_string().contains("address.city"));
    }

    #[test]
    fn test_type_labels() {
        assert_eq!(FieldType::String.label(), "string");
        assert_eq!(
            FieldType::List(Box::new(FieldType::Integer)).label(),
            "list of integer"
        );
        assert_eq!(
            FieldType::List(Box::new(FieldType::List(Box::new(FieldType::Float)))).label(),
            "list of list of float"
        );
    }

    #[test]
    fn test_describe_fields() {
        let schema = Schema::new()
            .field("title", FieldType::String, "movie title")
            .optional("rating", FieldType::Float, "score 0-10");
        let desc = schema.describe_fields();
        assert!(desc.contains("\"title\" (string, required): movie title"));
        assert!(desc.contains("\"rating\" (float, optional): score 0-10"));
    }

    #[test]
    fn test_describe_fields_nested_indented() {
        let address = Schema::new().field("city", FieldType::String, "city name");
        let schema = Schema::new().field("address", FieldType::Object(address), "mailing address");
        let desc = schema.describe_fields();
        assert!(desc.contains("- \"address\" (object, required): mailing address"));
        assert!(desc.contains("  - \"city\" (string, required): city name"));
    }

    #[test]
    fn test_list_of_object_described() {
        let task = Schema::new().field("id", FieldType::Integer, "task id");
        let schema = Schema::new().field(
            "tasks",
            FieldType::List(Box::new(FieldType::Object(task))),
            "task list",
        );
        assert!(schema.ensure_valid().is_ok());
        let desc = schema.describe_fields();
        assert!(desc.contains("\"tasks\" (list of object, required)"));
        assert!(desc.contains("  - \"id\" (integer, required)"));
    }
}
