//! Core types shared by parsing, resolution and validation.

use serde_json::Value;

/// Fields whose name carries this prefix are routed to an object's extension map.
pub const EXTENSION_PREFIX: &str = "x-";

/// Returns true for extension field names.
pub fn is_extension(name: &str) -> bool {
    name.starts_with(EXTENSION_PREFIX)
}

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// JSON-Schema dialect a schema node was written in.
///
/// Schemas in an OpenAPI document follow the OpenAPI 3.0 schema object rules.
/// Schemas pulled from an external JSON-Schema document follow the draft named
/// by that document's `$schema`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dialect {
    #[default]
    OpenApi30,
    Draft4,
    Draft6,
    Draft7,
    Draft201909,
    Draft202012,
}

impl Dialect {
    /// Detect the dialect of a document from its root `$schema` keyword.
    pub fn detect(document: &Value) -> Self {
        document
            .get("$schema")
            .and_then(Value::as_str)
            .and_then(Self::from_uri)
            .unwrap_or_default()
    }

    /// Map a `$schema` URI to a dialect. Unknown URIs yield `None`.
    pub fn from_uri(uri: &str) -> Option<Self> {
        let uri = uri.trim_end_matches('#');
        let dialect = if uri.ends_with("/draft-04/schema") {
            Dialect::Draft4
        } else if uri.ends_with("/draft-06/schema") {
            Dialect::Draft6
        } else if uri.ends_with("/draft-07/schema") {
            Dialect::Draft7
        } else if uri.ends_with("/draft/2019-09/schema") {
            Dialect::Draft201909
        } else if uri.ends_with("/draft/2020-12/schema") {
            Dialect::Draft202012
        } else {
            return None;
        };
        Some(dialect)
    }

    /// Draft 4 and OpenAPI 3.0 spell exclusive bounds as booleans.
    pub fn boolean_exclusive_bounds(&self) -> bool {
        matches!(self, Dialect::OpenApi30 | Dialect::Draft4)
    }

    /// True for schemas that came from a standalone JSON-Schema document.
    pub fn is_json_schema(&self) -> bool {
        !matches!(self, Dialect::OpenApi30)
    }
}
