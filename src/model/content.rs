use std::ops::{Deref, DerefMut};

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::error::{ResolutionError, StructuralError};
use crate::materializer::{Materialize, Materializer};
use crate::model::strict::{Cursor, Fields, Parse};
use crate::model::{Example, Extensions, Header, RefOr, Schema};

pub const JSON_MEDIA_TYPE: &str = "application/json";

/// Media type names mapped to their descriptions.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Content(pub IndexMap<String, MediaType>);

impl Content {
    pub fn new() -> Self {
        Self::default()
    }

    /// Content with a single `application/json` entry described by `schema`.
    pub fn json_schema(schema: impl Into<RefOr<Schema>>) -> Self {
        let mut content = Self::new();
        content.insert(
            JSON_MEDIA_TYPE.to_string(),
            MediaType {
                schema: Some(schema.into()),
                ..MediaType::default()
            },
        );
        content
    }
}

impl Deref for Content {
    type Target = IndexMap<String, MediaType>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Content {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl Parse for Content {
    const KIND: &'static str = "content";

    fn parse(value: Value, cursor: &Cursor) -> Result<Self, StructuralError> {
        IndexMap::parse(value, cursor).map(Content)
    }
}

impl Materialize for Content {
    fn materialize(&self, m: &mut Materializer<'_>) -> Result<(), ResolutionError> {
        self.0.materialize(m)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MediaType {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<RefOr<Schema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub examples: IndexMap<String, RefOr<Example>>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub encoding: IndexMap<String, Encoding>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl Parse for MediaType {
    const KIND: &'static str = "media type";

    fn parse(value: Value, cursor: &Cursor) -> Result<Self, StructuralError> {
        let mut f = Fields::new(value, cursor)?;
        Ok(Self {
            schema: f.take("schema")?,
            example: f.take_raw("example"),
            examples: f.take_or_default("examples")?,
            encoding: f.take_or_default("encoding")?,
            extensions: f.finish()?,
        })
    }
}

impl Materialize for MediaType {
    fn materialize(&self, m: &mut Materializer<'_>) -> Result<(), ResolutionError> {
        self.schema.materialize(m)?;
        self.examples.materialize(m)?;
        self.encoding.materialize(m)
    }
}

/// Serialization of a single multipart or form property.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Encoding {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub headers: IndexMap<String, RefOr<Header>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explode: Option<bool>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub allow_reserved: bool,
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl Parse for Encoding {
    const KIND: &'static str = "encoding";

    fn parse(value: Value, cursor: &Cursor) -> Result<Self, StructuralError> {
        let mut f = Fields::new(value, cursor)?;
        Ok(Self {
            content_type: f.take("contentType")?,
            headers: f.take_or_default("headers")?,
            style: f.take("style")?,
            explode: f.take("explode")?,
            allow_reserved: f.take_or_default("allowReserved")?,
            extensions: f.finish()?,
        })
    }
}

impl Materialize for Encoding {
    fn materialize(&self, m: &mut Materializer<'_>) -> Result<(), ResolutionError> {
        self.headers.materialize(m)
    }
}
