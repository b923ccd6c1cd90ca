//! OpenAPI Loader
//!
//! Strict loading, reference resolution and validation of OpenAPI 3.0
//! documents.
//!
//! A load reads a root document (JSON or YAML), decodes it into a typed
//! model that rejects unknown fields, and turns every `$ref` into a live,
//! shared node. Two references to the same location share one node, and
//! references that close a cycle point back at the node under construction.
//! Validation is a separate pass over the loaded graph.
//!
//! # Example
//!
//! ```
//! use openapi_loader::{load, LoaderConfig, ValidationContext};
//!
//! let source = r##"
//! openapi: 3.0.3
//! info: { title: Pets, version: "1.0" }
//! paths:
//!   /pets:
//!     get:
//!       responses:
//!         200:
//!           description: ok
//!           content:
//!             application/json:
//!               schema: { $ref: "#/components/schemas/Pets" }
//! components:
//!   schemas:
//!     Pets: { type: array, items: { $ref: "#/components/schemas/Pet" } }
//!     Pet: { type: object, properties: { name: { type: string } } }
//! "##;
//!
//! let document = load(source.as_bytes(), "", &LoaderConfig::default()).unwrap();
//! document.validate(&ValidationContext::new()).unwrap();
//! ```
//!
//! # Errors
//!
//! | Stage | Error | CLI exit code |
//! |-------|-------|---------------|
//! | bytes are not JSON/YAML | [`LoadError::Syntax`] | 2 |
//! | node violates the typed model | [`LoadError::Structural`] | 2 |
//! | reference cannot be materialized | [`LoadError::Resolution`] | 2 (3 for fetch failures) |
//! | graph violates a rule | [`ValidationError`] | 1 |
//!
//! External references are refused unless
//! [`LoaderConfig::allow_external_refs`] is set.

mod builder;
mod cache;
mod error;
mod fetch;
mod loader;
mod materializer;
pub mod model;
mod pointer;
mod syntax;
mod types;
mod validator;

pub use builder::{
    DocumentBuilder, OperationBuilder, ParameterBuilder, ResponseBuilder, SchemaBuilder,
    DEFAULT_OPENAPI_VERSION,
};
pub use error::{
    FetchError, LoadError, MarshalError, ResolutionError, StructuralError, StructuralErrorKind,
    ValidationError, ValidationErrorKind,
};
pub use fetch::{DefaultFetcher, Fetch, FileFetcher};
pub use loader::{load, Loader, LoaderConfig, Session, DEFAULT_BASE};
pub use model::{
    Components, Content, Document, Header, MediaType, Operation, Parameter, PathItem, Paths, Ref,
    RefOr, RequestBody, Response, Responses, Schema,
};
pub use pointer::{is_url, JsonPointer};
pub use syntax::parse_document;
pub use types::{is_extension, Dialect, EXTENSION_PREFIX};
pub use validator::{Cancellation, ValidationContext, ValidationOptions};

#[cfg(feature = "remote")]
pub use fetch::HttpFetcher;
