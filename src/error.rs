//! Error types for document loading, reference resolution and validation.

use thiserror::Error;

/// Errors that abort a load. No partial document is ever returned alongside one.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The bytes are not valid JSON or YAML.
    #[error("invalid syntax in {location}: {message}")]
    Syntax { location: String, message: String },

    #[error(transparent)]
    Structural(#[from] StructuralError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::Resolution(ResolutionError::Fetch { .. }) => 3, // IO
            _ => 2,
        }
    }

    /// True for failures found while decoding a node into the typed model.
    pub fn is_structural(&self) -> bool {
        match self {
            LoadError::Structural(_) => true,
            LoadError::Resolution(ResolutionError::Target { .. }) => true,
            _ => false,
        }
    }
}

/// A node's shape violates the strict typed model.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{}{kind}", display_path(path))]
pub struct StructuralError {
    /// JSON Pointer to the offending node, prefixed with the document
    /// location when the node came from a referenced fragment.
    pub path: String,
    pub kind: StructuralErrorKind,
}

impl StructuralError {
    pub fn new(path: impl Into<String>, kind: StructuralErrorKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StructuralErrorKind {
    #[error("unknown fields: [{}]", fields.join(", "))]
    UnknownFields { fields: Vec<String> },

    #[error("expected {expected}, got {actual}")]
    InvalidType {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("\"$ref\" cannot be combined with sibling fields: [{}]", siblings.join(", "))]
    RefWithSiblings { siblings: Vec<String> },

    #[error("missing required field \"{field}\"")]
    MissingField { field: &'static str },

    #[error("{message}")]
    Invalid { message: String },
}

/// Reference expressions that cannot be turned into a live node.
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("malformed reference \"{reference}\": {message}")]
    MalformedRef { reference: String, message: String },

    #[error("external references are not allowed: \"{reference}\" resolves to {location}")]
    ExternalRefsDisallowed { reference: String, location: String },

    #[error("reference \"{reference}\" not found: no value at \"{pointer}\" in {location}")]
    NotFound {
        reference: String,
        location: String,
        pointer: String,
    },

    #[error("reference \"{reference}\" is not addressable: \"{pointer}\" in {location} {message}")]
    NotAddressable {
        reference: String,
        location: String,
        pointer: String,
        message: String,
    },

    #[error("failed to fetch {location}: {source}")]
    Fetch {
        location: String,
        #[source]
        source: FetchError,
    },

    #[error("failed to parse {location}: {message}")]
    TargetSyntax { location: String, message: String },

    #[error("invalid target of reference \"{reference}\": {source}")]
    Target {
        reference: String,
        #[source]
        source: StructuralError,
    },

    #[error("reference \"{reference}\" targets a {expected} already materialized as a different kind")]
    TypeMismatch {
        reference: String,
        expected: &'static str,
    },

    #[error("reference \"{reference}\" is part of a cycle of references with no concrete value")]
    AliasCycle { reference: String },

    #[error("{location} is already loaded in this session with different content")]
    LocationConflict { location: String },
}

/// Failure reported by a [`Fetch`](crate::Fetch) implementation.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "remote")]
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("unsupported location scheme \"{scheme}\"")]
    UnsupportedScheme { scheme: String },

    #[error("{0}")]
    Other(String),
}

/// A structurally valid document violates an OpenAPI or schema rule.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{}{kind}", display_path(path))]
pub struct ValidationError {
    /// JSON Pointer to the offending node.
    pub path: String,
    pub kind: ValidationErrorKind,
}

impl ValidationError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        1
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationErrorKind {
    #[error("missing required field \"{field}\"")]
    MissingField { field: &'static str },

    #[error("the responses object MUST contain at least one response code")]
    EmptyResponses,

    #[error("a short description of the response is required")]
    MissingDescription,

    #[error("unknown fields (expected \"x-\" prefixes): [{}]", keys.join(", "))]
    IllegalExtensions { keys: Vec<String> },

    #[error("found unresolved ref: \"{reference}\"")]
    UnresolvedRef { reference: String },

    #[error("ref \"{reference}\" points at a node that is no longer alive")]
    DanglingRef { reference: String },

    #[error("{first} and {second} are mutually exclusive")]
    MutuallyExclusive {
        first: &'static str,
        second: &'static str,
    },

    #[error("exactly one of {first} or {second} is required")]
    OneRequired {
        first: &'static str,
        second: &'static str,
    },

    #[error("unsupported {field} \"{value}\"")]
    UnsupportedValue { field: &'static str, value: String },

    #[error("duplicate {what} \"{name}\"")]
    Duplicate { what: &'static str, name: String },

    #[error("{what} \"{name}\" is not declared")]
    Undeclared { what: &'static str, name: String },

    #[error("{message}")]
    Invalid { message: String },

    #[error("invalid {field}: {message}")]
    Schema { field: &'static str, message: String },

    #[error("validation cancelled")]
    Cancelled,
}

/// Errors raised while re-serializing a document.
#[derive(Debug, Error)]
pub enum MarshalError {
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn display_path(path: &str) -> String {
    if path.is_empty() {
        String::new()
    } else {
        format!("{}: ", path)
    }
}
