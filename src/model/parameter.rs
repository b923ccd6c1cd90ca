use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::error::{ResolutionError, StructuralError};
use crate::materializer::{Materialize, Materializer};
use crate::model::reference::Referable;
use crate::model::strict::{Cursor, Fields, Parse};
use crate::model::{Content, Example, Extensions, RefOr, Schema};

/// A single operation parameter, identified by `name` and location `in`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(rename = "in", skip_serializing_if = "String::is_empty")]
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub allow_empty_value: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explode: Option<bool>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub allow_reserved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<RefOr<Schema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub examples: IndexMap<String, RefOr<Example>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl Parameter {
    pub const LOCATIONS: [&'static str; 4] = ["query", "header", "path", "cookie"];
}

impl Parse for Parameter {
    const KIND: &'static str = "parameter";

    fn parse(value: Value, cursor: &Cursor) -> Result<Self, StructuralError> {
        let mut f = Fields::new(value, cursor)?;
        Ok(Self {
            name: f.take_or_default("name")?,
            location: f.take_or_default("in")?,
            description: f.take("description")?,
            required: f.take_or_default("required")?,
            deprecated: f.take_or_default("deprecated")?,
            allow_empty_value: f.take_or_default("allowEmptyValue")?,
            style: f.take("style")?,
            explode: f.take("explode")?,
            allow_reserved: f.take_or_default("allowReserved")?,
            schema: f.take("schema")?,
            example: f.take_raw("example"),
            examples: f.take_or_default("examples")?,
            content: f.take("content")?,
            extensions: f.finish()?,
        })
    }
}

impl Referable for Parameter {}

impl Materialize for Parameter {
    fn materialize(&self, m: &mut Materializer<'_>) -> Result<(), ResolutionError> {
        self.schema.materialize(m)?;
        self.examples.materialize(m)?;
        self.content.materialize(m)
    }
}

/// A response or encoding header. Shaped like a [`Parameter`] without
/// `name` and `in`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Header {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub allow_empty_value: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explode: Option<bool>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub allow_reserved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<RefOr<Schema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub examples: IndexMap<String, RefOr<Example>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl Parse for Header {
    const KIND: &'static str = "header";

    fn parse(value: Value, cursor: &Cursor) -> Result<Self, StructuralError> {
        let mut f = Fields::new(value, cursor)?;
        Ok(Self {
            description: f.take("description")?,
            required: f.take_or_default("required")?,
            deprecated: f.take_or_default("deprecated")?,
            allow_empty_value: f.take_or_default("allowEmptyValue")?,
            style: f.take("style")?,
            explode: f.take("explode")?,
            allow_reserved: f.take_or_default("allowReserved")?,
            schema: f.take("schema")?,
            example: f.take_raw("example"),
            examples: f.take_or_default("examples")?,
            content: f.take("content")?,
            extensions: f.finish()?,
        })
    }
}

impl Referable for Header {}

impl Materialize for Header {
    fn materialize(&self, m: &mut Materializer<'_>) -> Result<(), ResolutionError> {
        self.schema.materialize(m)?;
        self.examples.materialize(m)?;
        self.content.materialize(m)
    }
}
