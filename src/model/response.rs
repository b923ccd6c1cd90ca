use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::error::{ResolutionError, StructuralError};
use crate::materializer::{Materialize, Materializer};
use crate::model::paths::parse_keyed;
use crate::model::reference::Referable;
use crate::model::strict::{Cursor, Fields, Parse};
use crate::model::{Content, Extensions, Header, Link, RefOr};

/// Key of the catch-all response.
pub const DEFAULT_RESPONSE: &str = "default";

/// Status codes (or `default`) mapped to responses, in document order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Responses {
    #[serde(flatten)]
    pub items: IndexMap<String, RefOr<Response>>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl Responses {
    /// A collection holding a single `default` response with an empty description.
    pub fn new() -> Self {
        let mut responses = Self::empty();
        responses.insert(DEFAULT_RESPONSE, Response::with_description(""));
        responses
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, response: impl Into<RefOr<Response>>) {
        self.items.insert(key.into(), response.into());
    }

    pub fn get(&self, key: &str) -> Option<&RefOr<Response>> {
        self.items.get(key)
    }

    pub fn default_response(&self) -> Option<&RefOr<Response>> {
        self.get(DEFAULT_RESPONSE)
    }

    /// The response declared for exactly `status`.
    pub fn status(&self, status: u16) -> Option<&RefOr<Response>> {
        self.get(&status.to_string())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Parse for Responses {
    const KIND: &'static str = "responses";

    fn parse(value: Value, cursor: &Cursor) -> Result<Self, StructuralError> {
        let (items, extensions) = parse_keyed(value, cursor)?;
        Ok(Self { items, extensions })
    }
}

impl Materialize for Responses {
    fn materialize(&self, m: &mut Materializer<'_>) -> Result<(), ResolutionError> {
        self.items.materialize(m)
    }
}

/// A single response. `description` is required by validation, not by parsing.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Response {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub headers: IndexMap<String, RefOr<Header>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub links: IndexMap<String, RefOr<Link>>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl Response {
    pub fn with_description(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..Self::default()
        }
    }
}

impl Parse for Response {
    const KIND: &'static str = "response";

    fn parse(value: Value, cursor: &Cursor) -> Result<Self, StructuralError> {
        let mut f = Fields::new(value, cursor)?;
        Ok(Self {
            description: f.take("description")?,
            headers: f.take_or_default("headers")?,
            content: f.take("content")?,
            links: f.take_or_default("links")?,
            extensions: f.finish()?,
        })
    }
}

impl Referable for Response {}

impl Materialize for Response {
    fn materialize(&self, m: &mut Materializer<'_>) -> Result<(), ResolutionError> {
        self.headers.materialize(m)?;
        self.content.materialize(m)?;
        self.links.materialize(m)
    }
}
